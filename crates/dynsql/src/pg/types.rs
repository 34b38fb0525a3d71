//! Conversions between [`Value`]/[`Record`] and PostgreSQL wire types.

use crate::error::{SqlError, SqlResult};
use crate::record::Record;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::OID => u32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => i.to_string().to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Text(s) => s.as_str().to_sql(ty, out),
            Value::Timestamp(ts) => match *ty {
                Type::TIMESTAMP => ts.naive_utc().to_sql(ty, out),
                _ => ts.to_sql(ty, out),
            },
            Value::List(items) => match ty.kind() {
                Kind::Array(_) => items.to_sql(ty, out),
                _ => Err(format!("cannot bind a list to non-array type {ty}").into()),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Width and kind are dispatched on the target type inside `to_sql`.
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn list<T>(items: Vec<Option<T>>, f: impl Fn(T) -> Value) -> Value {
    Value::List(
        items
            .into_iter()
            .map(|item| item.map_or(Value::Null, &f))
            .collect(),
    )
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<Option<T>, String> {
    row.try_get::<_, Option<T>>(idx).map_err(|e| e.to_string())
}

fn utc(ts: NaiveDateTime) -> DateTime<Utc> {
    ts.and_utc()
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> Result<Value, String> {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, idx)?.map(Value::from),
        Type::INT4 => get::<i32>(row, idx)?.map(Value::from),
        Type::INT8 => get::<i64>(row, idx)?.map(Value::from),
        Type::OID => get::<u32>(row, idx)?.map(Value::from),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(Value::from),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(Value::from),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx)?.map(Value::Text)
        }
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.map(Value::Timestamp),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?.map(|ts| Value::Timestamp(utc(ts))),
        Type::BOOL_ARRAY => get::<Vec<Option<bool>>>(row, idx)?.map(|v| list(v, Value::Bool)),
        Type::INT2_ARRAY => get::<Vec<Option<i16>>>(row, idx)?.map(|v| list(v, Value::from)),
        Type::INT4_ARRAY => get::<Vec<Option<i32>>>(row, idx)?.map(|v| list(v, Value::from)),
        Type::INT8_ARRAY => get::<Vec<Option<i64>>>(row, idx)?.map(|v| list(v, Value::from)),
        Type::FLOAT4_ARRAY => get::<Vec<Option<f32>>>(row, idx)?.map(|v| list(v, Value::from)),
        Type::FLOAT8_ARRAY => get::<Vec<Option<f64>>>(row, idx)?.map(|v| list(v, Value::from)),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::BPCHAR_ARRAY | Type::NAME_ARRAY => {
            get::<Vec<Option<String>>>(row, idx)?.map(|v| list(v, Value::Text))
        }
        Type::TIMESTAMPTZ_ARRAY => {
            get::<Vec<Option<DateTime<Utc>>>>(row, idx)?.map(|v| list(v, Value::Timestamp))
        }
        Type::TIMESTAMP_ARRAY => get::<Vec<Option<NaiveDateTime>>>(row, idx)?
            .map(|v| list(v, |ts| Value::Timestamp(utc(ts)))),
        _ => return Err(format!("unsupported column type {ty}")),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Decode every column of `row` into a [`Record`], keeping column order.
pub(crate) fn record_from_row(row: &Row) -> SqlResult<Record> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_())
            .map_err(|message| SqlError::decode(column.name(), message))?;
        record.push(column.name(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn encode(value: &Value, ty: &Type) -> Option<BytesMut> {
        let mut buf = BytesMut::new();
        match value.to_sql(ty, &mut buf).unwrap() {
            IsNull::Yes => None,
            IsNull::No => Some(buf),
        }
    }

    #[test]
    fn ints_follow_target_width() {
        assert_eq!(encode(&Value::Int(7), &Type::INT2).unwrap().len(), 2);
        assert_eq!(encode(&Value::Int(7), &Type::INT4).unwrap().len(), 4);
        assert_eq!(encode(&Value::Int(7), &Type::INT8).unwrap().len(), 8);
        assert_eq!(encode(&Value::Int(7), &Type::FLOAT8).unwrap().len(), 8);
    }

    #[test]
    fn int_out_of_range_for_target_is_an_error() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(1 << 40).to_sql(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn null_is_null() {
        assert!(encode(&Value::Null, &Type::TEXT).is_none());
    }

    #[test]
    fn text_and_timestamp() {
        assert_eq!(&encode(&Value::from("abc"), &Type::TEXT).unwrap()[..], b"abc");
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            encode(&Value::Timestamp(ts), &Type::TIMESTAMPTZ).unwrap().len(),
            8
        );
        assert_eq!(
            encode(&Value::Timestamp(ts), &Type::TIMESTAMP).unwrap().len(),
            8
        );
    }

    #[test]
    fn lists_encode_as_arrays() {
        let list = Value::from(vec![1, 2, 3]);
        let buf = encode(&list, &Type::INT4_ARRAY).unwrap();
        // header (dims, has_null, elem oid, len, lbound) + 3 * (len + i32)
        assert_eq!(buf.len(), 20 + 3 * 8);
    }

    #[test]
    fn list_for_scalar_parameter_is_an_error() {
        let mut buf = BytesMut::new();
        let err = Value::from(vec![1, 2])
            .to_sql_checked(&Type::INT4, &mut buf)
            .err().unwrap();
        assert!(err.to_string().contains("non-array type int4"));
        assert!(
            Value::from(vec!["a"])
                .to_sql_checked(&Type::TEXT, &mut buf)
                .is_err()
        );
    }
}
