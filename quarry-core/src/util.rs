use std::borrow::Cow;

/// Writes every value through `f`, inserting `separator` only between values that actually wrote something.
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

/// Turns an arbitrary field path into something usable as a named parameter.
pub fn parameter_base(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    )
}

/// Splits `relation.field` into its two halves.
pub fn split_path(value: &str) -> Option<(&str, &str)> {
    value.split_once('.')
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
            &$query[..$query
                .char_indices()
                .nth(497)
                .map(|(i, _)| i)
                .unwrap_or($query.len())]
                .trim_end(),
            if $query.chars().count() > 497 {
                "..."
            } else {
                ""
            },
        )
    };
}

#[macro_export]
macro_rules! write_integer {
    ($out:expr, $value:expr) => {{
        let mut buffer = $crate::itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_skips_empty_writes() {
        let mut out = String::new();
        separated_by(
            &mut out,
            ["a", "", "b"],
            |out, v| out.push_str(v),
            ", ",
        );
        assert_eq!(out, "a, b");
    }

    #[test]
    fn parameter_base_replaces_dots() {
        assert_eq!(parameter_base("customer.name"), "customer_name");
        assert!(matches!(parameter_base("status"), Cow::Borrowed("status")));
    }
}
