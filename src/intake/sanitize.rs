//! Markup stripping for free-text fields.
//!
//! # Responsibilities
//! - Remove script and style blocks, angle brackets, `javascript:` and inline event handlers
//! - Walk records recursively, leaving numbers, booleans and enum fields untouched
//!
//! # Design Decisions
//! - Every step deletes text, so repeating the pass until nothing changes always ends
//! - Running to a fixpoint makes `sanitize_str(sanitize_str(x)) == sanitize_str(x)`

use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

use super::schema::Schema;
use crate::storage::Record;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex")
});
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("static regex"));
static JS_PROTOCOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("static regex"));
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("static regex"));

fn strip<'a>(re: &Regex, input: Cow<'a, str>) -> Cow<'a, str> {
    let replaced = match re.replace_all(&input, "") {
        Cow::Borrowed(_) => None,
        Cow::Owned(s) => Some(s),
    };
    replaced.map_or(input, Cow::Owned)
}

fn pass(input: &str) -> String {
    let s = strip(&SCRIPT_BLOCK, Cow::Borrowed(input));
    let s = strip(&STYLE_BLOCK, s);
    let s: Cow<'_, str> = if s.contains(['<', '>']) {
        Cow::Owned(s.replace(['<', '>'], ""))
    } else {
        s
    };
    let s = strip(&JS_PROTOCOL, s);
    let s = strip(&EVENT_HANDLER, s);
    s.trim().to_string()
}

/// Sanitize one string.
pub fn sanitize_str(input: &str) -> String {
    let mut current = pass(input);
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Sanitize every string inside `value`.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = sanitize_str(s),
        Value::Array(items) => items.iter_mut().for_each(sanitize_value),
        Value::Object(map) => map.values_mut().for_each(sanitize_value),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Sanitize the non-enum fields of a validated record.
pub fn sanitize_record(record: &mut Record, schema: &Schema) {
    for (name, value) in record.iter_mut() {
        let is_enum = schema.field(name).is_some_and(|spec| spec.ty.is_enum());
        if !is_enum {
            sanitize_value(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::schema::{FieldSpec, FieldType};
    use serde_json::json;

    #[test]
    fn test_strips_markup() {
        assert_eq!(
            sanitize_str("Hello <script>alert('x')</script>world"),
            "Hello world"
        );
        assert_eq!(sanitize_str("<b>Bold</b> move"), "bBold/b move");
        assert_eq!(sanitize_str("<STYLE>p{}</style>ok"), "ok");
        assert_eq!(sanitize_str("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_str("<img src=x onerror=alert(1)>"), "img src=x alert(1)");
        assert_eq!(sanitize_str("  plain text  "), "plain text");
    }

    #[test]
    fn test_ordinary_text_survives() {
        let text = "Table for 4 near the window, please. Donation=none; 2 > 1 is fine";
        assert_eq!(sanitize_str(text), "Table for 4 near the window, please. Donation=none; 2  1 is fine");
        assert_eq!(sanitize_str("Café & Bakery"), "Café & Bakery");
    }

    #[test]
    fn test_nested_payloads_are_fully_removed() {
        // Removing the inner token reassembles an outer one.
        assert_eq!(sanitize_str("javajavascript:script:alert(1)"), "alert(1)");
        assert_eq!(sanitize_str("<scr<script>x</script>ipt>y"), "scripty");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<<script>script>alert(1)<</script>/script>",
            "  onclick = go()  ",
            "ononclick==x",
            "<style>a</style><style>b",
            "javascript:javascript:",
            "normal message with no markup",
            "",
        ];
        for input in inputs {
            let once = sanitize_str(input);
            assert_eq!(sanitize_str(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_record_skips_enums_and_non_strings() {
        let schema = Schema::new(vec![
            FieldSpec::required("message", FieldType::text(0, 100)),
            FieldSpec::required("space", FieldType::Enum(&["<Lounge>"])),
            FieldSpec::required("guests", FieldType::range(1, 10)),
            FieldSpec::required("needs", FieldType::TextList { min_items: 0, max_items: 5, item_max: 50 }),
        ]);
        let mut record = match json!({
            "message": "<i>hi</i>",
            "space": "<Lounge>",
            "guests": 4,
            "needs": ["<b>DJ</b>", "Decor"],
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        sanitize_record(&mut record, &schema);

        assert_eq!(record["message"], "ihi/i");
        assert_eq!(record["space"], "<Lounge>");
        assert_eq!(record["guests"], 4);
        assert_eq!(record["needs"], json!(["bDJ/b", "Decor"]));
    }
}
