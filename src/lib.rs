//! # jsonkit
//!
//! A JSON toolkit built around a streaming parser, a tree-shaped value
//! model and a JSON Schema (draft-04) validator. Schemas compile into a
//! typed node tree once and validate any number of instances, either
//! over a materialised value tree or while the instance is still being
//! parsed.
//!
//! ## Example
//!
//! ```rust
//! use jsonkit::{parse, Schema};
//!
//! let schema_doc = parse(br#"{"type": "string", "maxLength": 5}"#).unwrap();
//! let schema = Schema::compile(&schema_doc).unwrap();
//! let instance = parse(br#""foo""#).unwrap();
//! assert!(schema.is_valid(&instance));
//! ```
#![warn(
    clippy::doc_markdown,
    clippy::redundant_closure,
    clippy::explicit_iter_loop,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::print_stdout,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

mod builder;
mod encoder;
mod error;
mod map;
mod parser;
mod pointer;
mod primitive_type;
mod scanner;
mod schema;
mod value;

pub use builder::{Builder, BuilderError};
pub use encoder::{encode_compact, encode_debug, encode_pretty};
pub use error::{ErrorKind, Location, ParseError};
pub use map::Map;
pub use parser::{parse, parse_and_validate, parse_with_options, validate_stream, ParserOptions};
pub use pointer::{Pointer, PointerError, PointerErrorKind};
pub use primitive_type::PrimitiveType;
pub use schema::{
    DocumentRegistry, Schema, SchemaError, SchemaErrorKind, TypeKind, ValidationError,
    ValidationErrorKind, ValidationStream, Verdict,
};
pub use value::Value;

/// A shortcut for validating `instance` against `schema_document`.
///
/// This function panics if the schema does not compile.
#[must_use]
pub fn is_valid(schema_document: &Value, instance: &Value) -> bool {
    let compiled = Schema::compile(schema_document).expect("invalid schema");
    compiled.is_valid(instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid() {
        let schema = parse(br#"{"minLength": 5}"#).unwrap();
        let valid = parse(br#""foobar""#).unwrap();
        let invalid = parse(br#""foo""#).unwrap();
        assert!(is_valid(&schema, &valid));
        assert!(!is_valid(&schema, &invalid));
    }
}
