use crate::value::Value;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Emit a value as compact JSON.
pub fn encode_compact(value: &Value) -> String {
    let mut out = String::new();
    encode_value(&mut out, value, false, 0);
    out
}

/// Emit a value as pretty JSON: four-space indentation, a newline after
/// `{`, `[` and `,`, and a space between key and value.
pub fn encode_pretty(value: &Value) -> String {
    let mut out = String::new();
    encode_value(&mut out, value, true, 0);
    out
}

fn encode_value(out: &mut String, value: &Value, pretty: bool, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(int) => {
            let _ = write!(out, "{}", int);
        }
        Value::Double(double) => encode_double(out, *double),
        Value::String(text) => encode_string(out, text),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if pretty {
                    out.push('\n');
                    push_indent(out, depth + 1);
                }
                encode_value(out, item, pretty, depth + 1);
            }
            if pretty {
                out.push('\n');
                push_indent(out, depth);
            }
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (key, member)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if pretty {
                    out.push('\n');
                    push_indent(out, depth + 1);
                }
                encode_string(out, key);
                out.push(':');
                if pretty {
                    out.push(' ');
                }
                encode_value(out, member, pretty, depth + 1);
            }
            if pretty {
                out.push('\n');
                push_indent(out, depth);
            }
            out.push('}');
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Shortest decimal that round-trips, with a forced `.0` on integral
/// values so the double-ness survives a re-parse. JSON has no spelling
/// for non-finite doubles; they degrade to `null`.
fn encode_double(out: &mut String, double: f64) {
    if !double.is_finite() {
        out.push_str("null");
        return;
    }
    let text = format!("{}", double);
    out.push_str(&text);
    if !text.contains('.') && !text.contains('e') && !text.contains('E') {
        out.push_str(".0");
    }
}

fn encode_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if (ch as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
}

/// Dump the value tree with type annotations (CLI `--output-type debug`).
pub fn encode_debug(value: &Value) -> String {
    let mut out = String::new();
    debug_value(&mut out, value, 0);
    out.push('\n');
    out
}

fn debug_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "bool({})", b);
        }
        Value::Int(int) => {
            let _ = write!(out, "int({})", int);
        }
        Value::Double(double) => {
            let _ = write!(out, "double({})", double);
        }
        Value::String(text) => {
            let mut encoded = String::new();
            encode_string(&mut encoded, text);
            let _ = write!(out, "string({})", encoded);
        }
        Value::Array(items) => {
            let _ = write!(out, "array({}):", items.len());
            for item in items.iter() {
                out.push('\n');
                push_indent(out, depth + 1);
                debug_value(out, item, depth + 1);
            }
        }
        Value::Object(map) => {
            let _ = write!(out, "object({}):", map.len());
            for (key, member) in map.iter() {
                out.push('\n');
                push_indent(out, depth + 1);
                let mut encoded = String::new();
                encode_string(&mut encoded, key);
                let _ = write!(out, "{} => ", encoded);
                debug_value(out, member, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn compact_round_trips() {
        let source = br#"{"a":[1,2.5,"x"],"b":{"c":null,"d":false}}"#;
        let value = parse(source).unwrap();
        let encoded = encode_compact(&value);
        let reparsed = parse(encoded.as_bytes()).unwrap();
        assert_eq!(value, reparsed);
    }

    #[test]
    fn integral_doubles_keep_their_tag() {
        let value = parse(b"[1.0, -0.0, 1e2]").unwrap();
        let encoded = encode_compact(&value);
        assert_eq!(encoded, "[1.0,-0.0,100.0]");
        let reparsed = parse(encoded.as_bytes()).unwrap();
        assert!(matches!(
            reparsed.as_array().unwrap()[0],
            Value::Double(_)
        ));
    }

    #[test]
    fn strings_reescape() {
        let value = parse(br#""a\"b\nc""#).unwrap();
        assert_eq!(encode_compact(&value), r#""a\"b\nc""#);
    }

    #[test]
    fn pretty_layout() {
        let value = parse(br#"{"a":1,"b":[true],"c":{}}"#).unwrap();
        let expected = "{\n    \"a\": 1,\n    \"b\": [\n        true\n    ],\n    \"c\": {}\n}";
        assert_eq!(encode_pretty(&value), expected);
    }

    #[test]
    fn debug_dump_is_annotated() {
        let value = parse(br#"{"n":3}"#).unwrap();
        assert_eq!(encode_debug(&value), "object(1):\n    \"n\" => int(3)\n");
    }
}
