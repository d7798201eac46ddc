//! Helpers over raw `serde_yaml` property values.

use serde_yaml::{Mapping, Value};

/// True for an explicit null, or a one-element list holding only null
/// (what a singular alias wrapping a null produces).
pub fn is_null_sentinel(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Sequence(items) => items.len() == 1 && items[0].is_null(),
        _ => false,
    }
}

/// True if `value` is the string `text`.
pub fn is_text(value: &Value, text: &str) -> bool {
    value.as_str() == Some(text)
}

/// Returns the only `(key, value)` pair of a single-key mapping.
pub fn single_entry(mapping: &Mapping) -> Option<(&Value, &Value)> {
    if mapping.len() == 1 {
        mapping.iter().next()
    } else {
        None
    }
}

/// Levels print as integers when they are whole, e.g. `3` rather than `3.0`.
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.is_finite() {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

/// Compact one-line rendering used in messages and reports:
/// `{damage: {normal: low}, range: touch}`.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

pub fn render_mapping(mapping: &Mapping) -> String {
    let mut out = String::new();
    write_mapping(&mut out, mapping);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => out.push_str(text),
        Value::Sequence(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Mapping(mapping) => write_mapping(out, mapping),
        Value::Tagged(tagged) => {
            out.push_str(&tagged.tag.to_string());
            out.push(' ');
            write_value(out, &tagged.value);
        }
    }
}

fn write_mapping(out: &mut String, mapping: &Mapping) {
    out.push('{');
    for (index, (key, value)) in mapping.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        write_value(out, key);
        out.push_str(": ");
        write_value(out, value);
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(raw: &str) -> Value {
        serde_yaml::from_str(raw).unwrap()
    }

    #[test]
    fn null_sentinels_cover_bare_and_wrapped_nulls() {
        assert!(is_null_sentinel(&Value::Null));
        assert!(is_null_sentinel(&yaml("[null]")));
        assert!(!is_null_sentinel(&yaml("[null, null]")));
        assert!(!is_null_sentinel(&yaml("touch")));
    }

    #[test]
    fn render_is_single_line_flow_style() {
        let value = yaml("damage:\n  normal: low\nbuffs: [haste, {bonus: strength}]\nspell resistance: true\n");
        assert_eq!(
            render(&value),
            "{damage: {normal: low}, buffs: [haste, {bonus: strength}], spell resistance: true}"
        );
    }

    #[test]
    fn whole_numbers_drop_the_fraction() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn single_entry_requires_exactly_one_key() {
        let one = yaml("{normal: low}");
        let two = yaml("{normal: low, over time: high}");
        assert!(single_entry(one.as_mapping().unwrap()).is_some());
        assert!(single_entry(two.as_mapping().unwrap()).is_none());
    }
}
