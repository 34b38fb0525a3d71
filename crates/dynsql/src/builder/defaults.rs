use crate::params::{Direction, JoinKind, Operator, Pagination};
use serde::Deserialize;

/// Values substituted for omitted optional sub-fields at build time.
///
/// Validation never fills these in, so a validated description with omitted
/// operators, join kinds, directions or pagination bounds still builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildDefaults {
    pub operator: Operator,
    pub join_kind: JoinKind,
    pub direction: Direction,
    pub limit: i64,
    pub offset: i64,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            operator: Operator::Eq,
            join_kind: JoinKind::Inner,
            direction: Direction::Asc,
            limit: 10,
            offset: 0,
        }
    }
}

impl BuildDefaults {
    pub fn resolve_operator(&self, operator: Option<Operator>) -> Operator {
        operator.unwrap_or(self.operator)
    }

    pub fn resolve_join_kind(&self, kind: Option<JoinKind>) -> JoinKind {
        kind.unwrap_or(self.join_kind)
    }

    pub fn resolve_direction(&self, direction: Option<Direction>) -> Direction {
        direction.unwrap_or(self.direction)
    }

    /// `(limit, offset)`, or `None` when the limit is [`Pagination::UNLIMITED`].
    pub fn resolve_pagination(&self, pagination: &Pagination) -> Option<(i64, i64)> {
        let limit = pagination.limit.unwrap_or(self.limit);
        if limit == Pagination::UNLIMITED {
            return None;
        }
        Some((limit, pagination.offset.unwrap_or(self.offset)))
    }
}
