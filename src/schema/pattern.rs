use crate::schema::error::{SchemaError, SchemaErrorKind};
use regex::{Captures, Regex};
use std::rc::Rc;

lazy_static::lazy_static! {
    static ref CONTROL_GROUPS_RE: Regex = Regex::new(r"\\c[A-Za-z]").expect("is a valid regex");
}

/// A schema regex: the ECMA-262 source string plus the translated,
/// compiled engine program.
#[derive(Debug)]
pub(crate) struct CompiledPattern {
    pub(crate) source: Rc<str>,
    pub(crate) regex: Regex,
}

impl CompiledPattern {
    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

pub(crate) fn compile_pattern(source: &str) -> Result<CompiledPattern, SchemaError> {
    let regex = convert_regex(source).map_err(|err| {
        SchemaError::new(
            SchemaErrorKind::Pattern,
            format!("invalid regular expression '{}': {}", source, err),
        )
    })?;
    Ok(CompiledPattern {
        source: Rc::from(source),
        regex,
    })
}

// ECMA 262 character classes differ from the engine's defaults.
fn convert_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let converted = CONTROL_GROUPS_RE.replace_all(pattern, replace_control_group);
    Regex::new(
        &converted
            .replace(r"\d", "[0-9]")
            .replace(r"\D", "[^0-9]")
            .replace(r"\w", "[A-Za-z0-9_]")
            .replace(r"\W", "[^A-Za-z0-9_]")
            .replace(
                r"\s",
                "[ \t\n\r\u{000b}\u{000c}\u{2003}\u{feff}\u{2029}\u{00a0}]",
            )
            .replace(
                r"\S",
                "[^ \t\n\r\u{000b}\u{000c}\u{2003}\u{feff}\u{2029}\u{00a0}]",
            ),
    )
}

// `\cA` .. `\cZ` name control characters 1..26, case-insensitively.
fn replace_control_group(captures: &Captures<'_>) -> String {
    let letter = captures[0].as_bytes()[2].to_ascii_uppercase();
    format!("\\x{:02x}", letter - b'A' + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_classes_translate() {
        let pattern = compile_pattern(r"^\d{3}-\d{4}$").unwrap();
        assert!(pattern.is_match("555-1212"));
        assert!(!pattern.is_match("55x-1212"));
    }

    #[test]
    fn control_groups_translate() {
        let pattern = compile_pattern(r"\cA").unwrap();
        assert!(pattern.is_match("\u{1}"));
        assert!(!pattern.is_match("A"));
    }

    #[test]
    fn broken_patterns_are_schema_errors() {
        let err = compile_pattern("(unclosed").unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::Pattern);
    }

    #[test]
    fn source_is_kept_for_messages() {
        let pattern = compile_pattern("^a+$").unwrap();
        assert_eq!(&*pattern.source, "^a+$");
    }
}
