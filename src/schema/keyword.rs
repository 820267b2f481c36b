use crate::map::Map;
use crate::schema::error::{SchemaError, SchemaErrorKind};
use crate::schema::node::SchemaNumber;
use crate::schema::pattern::{compile_pattern, CompiledPattern};
use crate::value::Value;
use std::rc::Rc;

/// Typed keyword fetchers over a parsed schema object.
///
/// Every getter returns `Ok(None)` for an absent keyword, the parsed
/// payload for a well-typed one, and a schema error naming the keyword
/// and the expected type otherwise. This is the single place where the
/// JSON shape of keyword values is checked; the compiler only deals in
/// typed payloads.

pub(crate) fn get_bool(map: &Map, keyword: &str) -> Result<Option<bool>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(SchemaError::keyword_type(keyword, "a boolean")),
    }
}

pub(crate) fn get_str(map: &Map, keyword: &str) -> Result<Option<Rc<str>>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(Rc::clone(text))),
        Some(_) => Err(SchemaError::keyword_type(keyword, "a string")),
    }
}

/// Unsigned integer slot. An integral double satisfies it; a fractional
/// or negative number does not. With `not_zero` the value must be >= 1.
pub(crate) fn get_uint(
    map: &Map,
    keyword: &str,
    not_zero: bool,
) -> Result<Option<u64>, SchemaError> {
    let value = match map.get(keyword) {
        None => return Ok(None),
        Some(value) => value,
    };
    let int = match value {
        Value::Int(int) => *int,
        Value::Double(double) => {
            if double.fract() != 0.0 {
                return Err(SchemaError::value_data_type(format!(
                    "keyword '{}' must be an integer, not a fraction",
                    keyword
                )));
            }
            *double as i64
        }
        _ => return Err(SchemaError::keyword_type(keyword, "an unsigned integer")),
    };
    if int < 0 {
        return Err(SchemaError::value_data_type(format!(
            "keyword '{}' must not be negative",
            keyword
        )));
    }
    if not_zero && int == 0 {
        return Err(SchemaError::value_data_type(format!(
            "keyword '{}' must not be zero",
            keyword
        )));
    }
    Ok(Some(int as u64))
}

pub(crate) fn get_number(map: &Map, keyword: &str) -> Result<Option<SchemaNumber>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::Int(int)) => Ok(Some(SchemaNumber::Int(*int))),
        Some(Value::Double(double)) => Ok(Some(SchemaNumber::Double(*double))),
        Some(_) => Err(SchemaError::keyword_type(keyword, "a number")),
    }
}

/// Like [`get_number`] but the value must be strictly positive
/// (`multipleOf`).
pub(crate) fn get_positive_number(
    map: &Map,
    keyword: &str,
) -> Result<Option<SchemaNumber>, SchemaError> {
    let number = match get_number(map, keyword)? {
        None => return Ok(None),
        Some(number) => number,
    };
    let positive = match number {
        SchemaNumber::Int(int) => int > 0,
        SchemaNumber::Double(double) => double > 0.0,
    };
    if !positive {
        return Err(SchemaError::value_data_type(format!(
            "keyword '{}' must be greater than zero",
            keyword
        )));
    }
    Ok(Some(number))
}

/// Array-of-strings slot. With `non_empty`, an empty array is a
/// dependency-class error (`required`, `dependencies` entries).
pub(crate) fn get_string_array(
    map: &Map,
    keyword: &str,
    non_empty: bool,
) -> Result<Option<Vec<Rc<str>>>, SchemaError> {
    let items = match map.get(keyword) {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(SchemaError::keyword_type(keyword, "an array of strings")),
    };
    if non_empty && items.is_empty() {
        return Err(SchemaError::new(
            SchemaErrorKind::ValueDataDeps,
            format!("keyword '{}' must not be an empty array", keyword),
        ));
    }
    let mut strings = Vec::with_capacity(items.len());
    for item in items.iter() {
        match item {
            Value::String(text) => strings.push(Rc::clone(text)),
            _ => return Err(SchemaError::keyword_type(keyword, "an array of strings")),
        }
    }
    Ok(Some(strings))
}

pub(crate) fn get_regex(map: &Map, keyword: &str) -> Result<Option<CompiledPattern>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::String(source)) => compile_pattern(source).map(Some),
        Some(_) => Err(SchemaError::keyword_type(keyword, "a regular expression")),
    }
}

/// Non-empty `enum` with value-equality-unique entries.
pub(crate) fn get_enum(map: &Map, keyword: &str) -> Result<Option<Vec<Value>>, SchemaError> {
    let items = match map.get(keyword) {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(SchemaError::keyword_type(keyword, "an array")),
    };
    if items.is_empty() {
        return Err(SchemaError::value_data_type(format!(
            "keyword '{}' must not be an empty array",
            keyword
        )));
    }
    for (i, item) in items.iter().enumerate() {
        if items.iter().skip(i + 1).any(|other| other == item) {
            return Err(SchemaError::value_data_type(format!(
                "keyword '{}' entries must be unique",
                keyword
            )));
        }
    }
    Ok(Some(items.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn schema_map(source: &str) -> Map {
        match parse(source.as_bytes()).unwrap() {
            Value::Object(map) => (*map).clone(),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn absent_keywords_are_none() {
        let map = schema_map(r#"{"present": true}"#);
        assert_eq!(get_bool(&map, "absent").unwrap(), None);
        assert_eq!(get_uint(&map, "absent", false).unwrap(), None);
        assert_eq!(get_bool(&map, "present").unwrap(), Some(true));
    }

    #[test]
    fn uint_accepts_integral_doubles() {
        let map = schema_map(r#"{"a": 3, "b": 3.0, "c": 3.5, "d": -1, "e": 0}"#);
        assert_eq!(get_uint(&map, "a", false).unwrap(), Some(3));
        assert_eq!(get_uint(&map, "b", false).unwrap(), Some(3));
        assert_eq!(
            get_uint(&map, "c", false).unwrap_err().kind(),
            SchemaErrorKind::ValueDataType
        );
        assert_eq!(
            get_uint(&map, "d", false).unwrap_err().kind(),
            SchemaErrorKind::ValueDataType
        );
        assert_eq!(get_uint(&map, "e", false).unwrap(), Some(0));
        assert_eq!(
            get_uint(&map, "e", true).unwrap_err().kind(),
            SchemaErrorKind::ValueDataType
        );
    }

    #[test]
    fn number_keeps_the_int_double_split() {
        let map = schema_map(r#"{"i": 2, "d": 2.5, "s": "2"}"#);
        assert_eq!(get_number(&map, "i").unwrap(), Some(SchemaNumber::Int(2)));
        assert_eq!(
            get_number(&map, "d").unwrap(),
            Some(SchemaNumber::Double(2.5))
        );
        assert_eq!(
            get_number(&map, "s").unwrap_err().kind(),
            SchemaErrorKind::KeywordType
        );
    }

    #[test]
    fn positive_number_rejects_zero() {
        let map = schema_map(r#"{"z": 0, "n": -2.5}"#);
        assert!(get_positive_number(&map, "z").is_err());
        assert!(get_positive_number(&map, "n").is_err());
    }

    #[test]
    fn string_arrays() {
        let map = schema_map(r#"{"ok": ["a", "b"], "empty": [], "mixed": ["a", 1]}"#);
        let items = get_string_array(&map, "ok", true).unwrap().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            get_string_array(&map, "empty", true).unwrap_err().kind(),
            SchemaErrorKind::ValueDataDeps
        );
        assert_eq!(
            get_string_array(&map, "mixed", false).unwrap_err().kind(),
            SchemaErrorKind::KeywordType
        );
    }

    #[test]
    fn enum_must_be_unique_and_non_empty() {
        let map = schema_map(r#"{"dup": [1, 2, 1.0], "ok": [1, "1"], "empty": []}"#);
        assert_eq!(
            get_enum(&map, "dup").unwrap_err().kind(),
            SchemaErrorKind::ValueDataType
        );
        assert_eq!(get_enum(&map, "ok").unwrap().unwrap().len(), 2);
        assert_eq!(
            get_enum(&map, "empty").unwrap_err().kind(),
            SchemaErrorKind::ValueDataType
        );
    }
}
