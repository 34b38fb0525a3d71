//! `?` → `$n` placeholder rewriting.

/// Rewrite `?` placeholders into PostgreSQL's numbered `$n` form.
///
/// List operands are bound as arrays, so `IN ?` becomes `= ANY($n)` and
/// `NOT IN ?` becomes `<> ALL($n)`. Question marks inside single-quoted
/// strings and double-quoted identifiers are left alone.
pub fn to_positional(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0usize;
    let mut in_string = false;
    let mut in_ident = false;

    for c in sql.chars() {
        match c {
            '\'' if !in_ident => in_string = !in_string,
            '"' if !in_string => in_ident = !in_ident,
            '?' if !in_string && !in_ident => {
                n += 1;
                if strip_trailing_keyword(&mut out, "NOT IN") {
                    out.push_str(&format!("<> ALL(${n})"));
                } else if strip_trailing_keyword(&mut out, "IN") {
                    out.push_str(&format!("= ANY(${n})"));
                } else {
                    out.push_str(&format!("${n}"));
                }
                continue;
            }
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Remove `keyword` (and any whitespace after it) from the end of `out` when it
/// stands there as a whole word. Leaves the whitespace before it in place.
fn strip_trailing_keyword(out: &mut String, keyword: &str) -> bool {
    let head = out.trim_end();
    let Some(start) = head.len().checked_sub(keyword.len()) else {
        return false;
    };
    if !head.is_char_boundary(start) || !head[start..].eq_ignore_ascii_case(keyword) {
        return false;
    }
    let at_word_start = head[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
    if !at_word_start {
        return false;
    }
    out.truncate(start);
    true
}
