use crate::value::Value;
use percent_encoding::percent_decode_str;
use std::error;
use std::fmt;
use std::rc::Rc;

/// JSON Pointer failure classes (RFC 6901).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerErrorKind {
    /// The referenced location does not exist in the document.
    NotFound,
    /// The pointer string does not follow the RFC 6901 grammar.
    InvalidFormat,
    /// Invalid percent-escape in a pointer taken from a URI fragment.
    InvalidEscape,
    /// An array step token is not a non-negative decimal integer.
    InvalidArrayIndex,
    /// The walk reached a value kind that cannot be descended into.
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerError {
    kind: PointerErrorKind,
    message: String,
}

impl PointerError {
    fn new(kind: PointerErrorKind, message: String) -> PointerError {
        PointerError { kind, message }
    }

    pub fn kind(&self) -> PointerErrorKind {
        self.kind
    }
}

impl fmt::Display for PointerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for PointerError {}

/// A parsed JSON Pointer: the raw string plus its decoded tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    raw: Rc<str>,
    tokens: Vec<Rc<str>>,
}

impl Pointer {
    /// Tokenise a pointer string. `~0` and `~1` decode to `~` and `/` in
    /// a single left-to-right pass; a dangling `~` or an unknown escape
    /// code is a format error, as are the empty string and a missing
    /// leading slash.
    pub fn new(pointer: &str) -> Result<Pointer, PointerError> {
        if pointer.is_empty() {
            return Err(PointerError::new(
                PointerErrorKind::InvalidFormat,
                "JSON pointer cannot be an empty string".to_string(),
            ));
        }
        if !pointer.starts_with('/') {
            return Err(PointerError::new(
                PointerErrorKind::InvalidFormat,
                format!("JSON pointer must start with slash, pointer: {}", pointer),
            ));
        }
        let mut tokens = Vec::new();
        for segment in pointer[1..].split('/') {
            tokens.push(decode_token(segment)?);
        }
        Ok(Pointer {
            raw: Rc::from(pointer),
            tokens,
        })
    }

    /// Build a pointer from a percent-encoded URI fragment, as used by
    /// `$ref` targets.
    pub fn from_fragment(fragment: &str) -> Result<Pointer, PointerError> {
        let decoded = percent_decode_str(fragment).decode_utf8().map_err(|_| {
            PointerError::new(
                PointerErrorKind::InvalidEscape,
                format!("JSON pointer fragment has invalid escapes: {}", fragment),
            )
        })?;
        Pointer::new(&decoded)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[Rc<str>] {
        &self.tokens
    }

    /// Walk the pointer from the document root.
    pub fn resolve<'a>(&self, document: &'a Value) -> Result<&'a Value, PointerError> {
        let mut current = document;
        for token in &self.tokens {
            current = match current {
                Value::Object(map) => map.get(token).ok_or_else(|| {
                    PointerError::new(
                        PointerErrorKind::NotFound,
                        format!("JSON pointer value not found in object: {}", token),
                    )
                })?,
                Value::Array(items) => {
                    let index = parse_array_index(token)?;
                    items.get(index).ok_or_else(|| {
                        PointerError::new(
                            PointerErrorKind::NotFound,
                            format!("JSON pointer value not found in array: {}", token),
                        )
                    })?
                }
                _ => {
                    return Err(PointerError::new(
                        PointerErrorKind::NotFound,
                        "JSON pointer hit a scalar before the last token".to_string(),
                    ))
                }
            };
        }
        Ok(current)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn decode_token(segment: &str) -> Result<Rc<str>, PointerError> {
    if !segment.contains('~') {
        return Ok(Rc::from(segment));
    }
    let mut decoded = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            decoded.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => decoded.push('~'),
            Some('1') => decoded.push('/'),
            Some(other) => {
                return Err(PointerError::new(
                    PointerErrorKind::InvalidFormat,
                    format!(
                        "JSON pointer escape character ~ followed by '{}' character",
                        other
                    ),
                ))
            }
            None => {
                return Err(PointerError::new(
                    PointerErrorKind::InvalidFormat,
                    "JSON pointer escape character ~ cannot be at the end of pointer".to_string(),
                ))
            }
        }
    }
    Ok(Rc::from(decoded.as_str()))
}

fn parse_array_index(token: &str) -> Result<usize, PointerError> {
    if token.starts_with('-') {
        return Err(PointerError::new(
            PointerErrorKind::InvalidArrayIndex,
            "JSON pointer array index cannot be negative".to_string(),
        ));
    }
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(PointerError::new(
            PointerErrorKind::InvalidArrayIndex,
            format!("JSON pointer array index is not a number: {}", token),
        ));
    }
    token.parse::<usize>().map_err(|_| {
        PointerError::new(
            PointerErrorKind::InvalidArrayIndex,
            format!("JSON pointer array index is out of range: {}", token),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn decodes_escapes_in_one_pass() {
        let pointer = Pointer::new("/esc~0~1-~1-~0/end").unwrap();
        let tokens: Vec<&str> = pointer.tokens().iter().map(|t| &**t).collect();
        assert_eq!(tokens, vec!["esc~/-/-~", "end"]);
    }

    #[test]
    fn format_errors() {
        assert_eq!(
            Pointer::new("").unwrap_err().kind(),
            PointerErrorKind::InvalidFormat
        );
        assert_eq!(
            Pointer::new("a/b").unwrap_err().kind(),
            PointerErrorKind::InvalidFormat
        );
        assert_eq!(
            Pointer::new("/invalid~4/end").unwrap_err().kind(),
            PointerErrorKind::InvalidFormat
        );
        assert_eq!(
            Pointer::new("/trailing~").unwrap_err().kind(),
            PointerErrorKind::InvalidFormat
        );
    }

    #[test]
    fn resolves_like_manual_descent() {
        let doc = parse(br#"{"a":{"b":{"c":42}},"arr":[10,[20,30]]}"#).unwrap();
        let manual = doc.get("a").unwrap().get("b").unwrap().get("c").unwrap();
        let via_pointer = Pointer::new("/a/b/c").unwrap().resolve(&doc).unwrap();
        assert_eq!(via_pointer, manual);
        assert_eq!(
            Pointer::new("/arr/1/0").unwrap().resolve(&doc).unwrap(),
            &Value::Int(20)
        );
    }

    #[test]
    fn resolve_failures() {
        let doc = parse(br#"{"a":[1,2],"s":"x"}"#).unwrap();
        let kind = |p: &str| Pointer::new(p).unwrap().resolve(&doc).unwrap_err().kind();
        assert_eq!(kind("/missing"), PointerErrorKind::NotFound);
        assert_eq!(kind("/a/2"), PointerErrorKind::NotFound);
        assert_eq!(kind("/a/x"), PointerErrorKind::InvalidArrayIndex);
        assert_eq!(kind("/a/-1"), PointerErrorKind::InvalidArrayIndex);
        assert_eq!(kind("/a/-"), PointerErrorKind::InvalidArrayIndex);
        assert_eq!(kind("/s/deeper"), PointerErrorKind::NotFound);
    }

    #[test]
    fn fragment_pointers_percent_decode() {
        let pointer = Pointer::from_fragment("/a%20b/c").unwrap();
        let tokens: Vec<&str> = pointer.tokens().iter().map(|t| &**t).collect();
        assert_eq!(tokens, vec!["a b", "c"]);
    }

    #[test]
    fn empty_tokens_address_empty_keys() {
        let doc = parse(br#"{"":{"x":1}}"#).unwrap();
        assert_eq!(
            Pointer::new("//x").unwrap().resolve(&doc).unwrap(),
            &Value::Int(1)
        );
    }
}
