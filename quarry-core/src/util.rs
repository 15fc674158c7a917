use std::cmp::min;
use syn::Path;

pub fn matches_path(path: &Path, expect: &[&str]) -> bool {
    let len = min(path.segments.len(), expect.len());
    path.segments
        .iter()
        .rev()
        .take(len)
        .map(|v| &v.ident)
        .eq(expect.iter().rev().take(len))
}

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Same as `separated_by` but the callback can fail, the first error stops the iteration.
pub fn try_separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) -> crate::Result<()>
where
    F: FnMut(&mut String, T) -> crate::Result<()>,
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v)?;
    }
    Ok(())
}

/// Longest prefix of `value` not exceeding `max` bytes that ends on a char boundary.
pub fn truncate_str(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! possibly_parenthesized {
    ($buff:ident, $cond:expr, $v:expr) => {
        if $cond {
            $buff.push('(');
            $v;
            $buff.push(')');
        } else {
            $v;
        }
    };
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncate_str(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}
