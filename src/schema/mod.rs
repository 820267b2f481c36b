//! JSON Schema (draft-04) compilation and validation.

mod checks;
mod compile;
mod error;
mod keyword;
mod node;
mod pattern;
mod stream;

pub use error::{
    SchemaError, SchemaErrorKind, TypeKind, ValidationError, ValidationErrorKind, Verdict,
};
pub use stream::ValidationStream;

use crate::value::Value;
use node::{NodeId, SchemaNode};
use url::Url;

/// Documents available for cross-document `$ref` resolution, keyed by
/// absolute URI. There is no network fetch; anything not registered here
/// (or reachable inside the compiled document) is unresolvable.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    docs: Vec<(Url, Value)>,
}

impl DocumentRegistry {
    pub fn new() -> DocumentRegistry {
        DocumentRegistry::default()
    }

    /// Register a parsed schema document under an absolute URI.
    pub fn register(&mut self, uri: &str, document: Value) -> Result<(), SchemaError> {
        let mut url = Url::parse(uri).map_err(|_| {
            SchemaError::new(
                SchemaErrorKind::KeywordPrep,
                format!("registry URI must be absolute: {}", uri),
            )
        })?;
        url.set_fragment(None);
        self.docs.push((url, document));
        Ok(())
    }

    pub(crate) fn get(&self, url: &Url) -> Option<&Value> {
        self.docs
            .iter()
            .find(|(registered, _)| registered == url)
            .map(|(_, document)| document)
    }
}

/// A compiled schema: an arena of typed keyword nodes with every `$ref`
/// resolved to a node index. Immutable after compilation; any number of
/// validation streams may read it.
#[derive(Debug)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    root: NodeId,
}

impl Schema {
    /// Compile a parsed schema document.
    pub fn compile(document: &Value) -> Result<Schema, SchemaError> {
        Schema::compile_with_registry(document, &DocumentRegistry::default())
    }

    /// Compile with additional documents available to `$ref`.
    pub fn compile_with_registry(
        document: &Value,
        registry: &DocumentRegistry,
    ) -> Result<Schema, SchemaError> {
        let (nodes, root) = compile::compile_schema(document, registry)?;
        Ok(Schema { nodes, root })
    }

    /// Validate a materialised value by replaying it into a validation
    /// stream, depth-first, in document order.
    pub fn validate(&self, instance: &Value) -> Verdict {
        let mut stream = ValidationStream::new(self);
        emit_events(&mut stream, instance);
        stream.finish()
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_valid()
    }

    pub(crate) fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id]
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }
}

/// Emit the same event sequence the parser would emit for `value`.
fn emit_events(stream: &mut ValidationStream<'_>, value: &Value) {
    match value {
        Value::Array(items) => {
            stream.array_start();
            for item in items.iter() {
                emit_events(stream, item);
                stream.array_append(item);
            }
            stream.array_end();
        }
        Value::Object(map) => {
            stream.object_start();
            for (key, member) in map.iter() {
                stream.object_key(key);
                emit_events(stream, member);
                stream.object_update(key, member);
            }
            stream.object_end();
        }
        scalar => stream.value(scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn value(source: &str) -> Value {
        parse(source.as_bytes()).unwrap()
    }

    #[test]
    fn compile_rejects_non_object_roots() {
        for source in ["true", "false", "[]", "\"s\"", "3"] {
            let err = Schema::compile(&value(source)).unwrap_err();
            assert_eq!(err.kind(), SchemaErrorKind::RootDataType);
        }
    }

    #[test]
    fn registry_resolves_cross_document_references() {
        let mut registry = DocumentRegistry::new();
        registry
            .register(
                "http://example.com/name.json",
                value(r#"{"type": "string", "minLength": 2}"#),
            )
            .unwrap();
        let schema = Schema::compile_with_registry(
            &value(r#"{"properties": {"name": {"$ref": "http://example.com/name.json"}}}"#),
            &registry,
        )
        .unwrap();
        assert!(schema.is_valid(&value(r#"{"name": "ab"}"#)));
        assert!(!schema.is_valid(&value(r#"{"name": "a"}"#)));
        assert!(!schema.is_valid(&value(r#"{"name": 4}"#)));
    }

    #[test]
    fn unresolvable_reference_is_a_compile_error() {
        let err = Schema::compile(&value(r#"{"$ref": "http://nowhere.invalid/x.json"}"#))
            .unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::ReferenceUnresolved);
    }

    #[test]
    fn offline_validation_walks_trees() {
        let schema = Schema::compile(&value(
            r#"{"type": "object", "properties": {"tags": {"type": "array", "items": {"type": "string"}}}}"#,
        ))
        .unwrap();
        assert!(schema.is_valid(&value(r#"{"tags": ["a", "b"]}"#)));
        assert!(!schema.is_valid(&value(r#"{"tags": ["a", 3]}"#)));
    }
}
