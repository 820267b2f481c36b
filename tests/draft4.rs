use jsonkit::{
    parse, parse_and_validate, validate_stream, Builder, ParserOptions, Schema, SchemaErrorKind,
    Value, Verdict,
};
use test_case::test_case;

fn value(source: &str) -> Value {
    parse(source.as_bytes()).unwrap()
}

fn compile(source: &str) -> Schema {
    Schema::compile(&value(source)).unwrap()
}

/// Offline and streaming delivery must agree; both are exercised for
/// every case and the offline verdict is returned.
fn check(schema_source: &str, instance_source: &str) -> Verdict {
    let schema = compile(schema_source);
    let instance = value(instance_source);
    let offline = schema.validate(&instance);
    let streamed = validate_stream(
        instance_source.as_bytes(),
        &schema,
        &ParserOptions::default(),
    )
    .unwrap();
    assert_eq!(
        offline.is_valid(),
        streamed.is_valid(),
        "offline and streaming verdicts disagree for schema {} instance {}",
        schema_source,
        instance_source
    );
    offline
}

fn assert_valid(schema: &str, instance: &str) {
    let verdict = check(schema, instance);
    assert!(
        verdict.is_valid(),
        "expected valid, got {:?} for schema {} instance {}",
        verdict,
        schema,
        instance
    );
}

fn assert_invalid(schema: &str, instance: &str) {
    let verdict = check(schema, instance);
    assert!(
        !verdict.is_valid(),
        "expected invalid for schema {} instance {}",
        schema,
        instance
    );
}

#[test]
fn boolean_type() {
    assert_valid(r#"{"type": "boolean"}"#, "true");
    assert_invalid(r#"{"type": "boolean"}"#, "12");
}

#[test]
fn string_with_pattern() {
    let schema = r#"{"type": "string", "pattern": "^(\\([0-9]{3}\\))?[0-9]{3}-[0-9]{4}$"}"#;
    assert_valid(schema, r#""555-1212""#);
    assert_valid(schema, r#""(888)555-1212""#);
    assert_invalid(schema, r#""(800)FLOWERS""#);
}

#[test]
fn object_required() {
    let schema = r#"{
        "type": "object",
        "properties": {"name": {"type": "string"}, "email": {"type": "string"}},
        "required": ["name", "email"]
    }"#;
    assert_valid(schema, r#"{"name": "W", "email": "w@x"}"#);
    assert_invalid(schema, r#"{"name": "W"}"#);
    assert_invalid(schema, r#"{"name": "W", "email": null}"#);
}

#[test]
fn array_tuple_with_additional_items_false() {
    let schema = r#"{
        "type": "array",
        "items": [{"type": "number"}, {"type": "string"}, {"type": "boolean"}],
        "additionalItems": false
    }"#;
    assert_valid(schema, r#"[3, "s", true]"#);
    assert_invalid(schema, r#"[3, "s", true, "x"]"#);
    assert_valid(schema, "[]");
}

#[test]
fn unique_items() {
    let schema = r#"{"type": "array", "uniqueItems": true}"#;
    assert_valid(schema, "[1, 2, 3]");
    assert_invalid(schema, "[1, 2, 3, 3]");
    // value equality crosses the int/double divide
    assert_invalid(schema, "[1, 1.0]");
    assert_valid(schema, r#"[{"a": 1, "b": 2}, {"a": 1, "b": 3}]"#);
    assert_invalid(schema, r#"[{"a": 1, "b": 2}, {"b": 2, "a": 1}]"#);
}

#[test]
fn one_of_multiples() {
    let schema = r#"{"oneOf": [
        {"type": "number", "multipleOf": 5},
        {"type": "number", "multipleOf": 3}
    ]}"#;
    assert_valid(schema, "10");
    assert_valid(schema, "9");
    assert_invalid(schema, "15");
    assert_invalid(schema, "2");
}

#[test]
fn ref_and_definitions() {
    let schema = r##"{
        "properties": {
            "first": {"$ref": "#/definitions/name"},
            "last": {"$ref": "#/definitions/name"}
        },
        "definitions": {"name": {"type": "string"}}
    }"##;
    assert_valid(schema, r#"{"first": "J", "last": "J"}"#);
    assert_invalid(schema, r#"{"first": "J", "last": 3}"#);
}

#[test_case(r#"{"type": "integer"}"#, "3", true; "int is integer")]
#[test_case(r#"{"type": "integer"}"#, "3.2", false; "fraction is not integer")]
#[test_case(r#"{"type": "number"}"#, "3", true; "int is number")]
#[test_case(r#"{"type": "number"}"#, "3.2", true; "double is number")]
#[test_case(r#"{"type": "null"}"#, "null", true; "null")]
#[test_case(r#"{"type": "string"}"#, "null", false; "null is not string")]
#[test_case(r#"{"minimum": 5}"#, "5", true; "minimum inclusive")]
#[test_case(r#"{"minimum": 5, "exclusiveMinimum": true}"#, "5", false; "minimum exclusive")]
#[test_case(r#"{"maximum": 2.5}"#, "2", true; "maximum mixed")]
#[test_case(r#"{"maximum": 2.5}"#, "2.6", false; "maximum double")]
#[test_case(r#"{"multipleOf": 2.5}"#, "7.5", true; "double multiple")]
#[test_case(r#"{"multipleOf": 2}"#, "7", false; "int non multiple")]
#[test_case(r#"{"minLength": 2}"#, "\"ab\"", true; "min length ok")]
#[test_case(r#"{"minLength": 2}"#, "\"a\"", false; "min length short")]
#[test_case(r#"{"maxLength": 2}"#, "\"abc\"", false; "max length long")]
#[test_case(r#"{"minItems": 1}"#, "[]", false; "min items")]
#[test_case(r#"{"maxItems": 2}"#, "[1, 2, 3]", false; "max items")]
#[test_case(r#"{"minProperties": 1}"#, "{}", false; "min properties")]
#[test_case(r#"{"maxProperties": 1}"#, r#"{"a": 1, "b": 2}"#, false; "max properties")]
#[test_case(r#"{"enum": [1, "two", [3], {"f": 4}]}"#, "1", true; "enum int")]
#[test_case(r#"{"enum": [1, "two", [3], {"f": 4}]}"#, "[3]", true; "enum array")]
#[test_case(r#"{"enum": [1, "two", [3], {"f": 4}]}"#, r#"{"f": 4}"#, true; "enum object")]
#[test_case(r#"{"enum": [1, "two", [3], {"f": 4}]}"#, "2", false; "enum miss")]
#[test_case(r#"{"enum": [1]}"#, "1.0", true; "enum numeric equality")]
fn keyword_scenarios(schema: &str, instance: &str, expected: bool) {
    if expected {
        assert_valid(schema, instance);
    } else {
        assert_invalid(schema, instance);
    }
}

#[test_case(r#"{"properties": {"a": {"type": "integer"}}}"#, r#"{"a": "x"}"#, false; "properties apply")]
#[test_case(r#"{"properties": {"a": {"type": "integer"}}}"#, r#"{"b": "x"}"#, true; "unlisted key is free")]
#[test_case(r#"{"properties": {"a": {}}, "additionalProperties": false}"#, r#"{"a": 1}"#, true; "listed key allowed")]
#[test_case(r#"{"properties": {"a": {}}, "additionalProperties": false}"#, r#"{"a": 1, "b": 2}"#, false; "extra key rejected")]
#[test_case(r#"{"patternProperties": {"^n_": {"type": "integer"}}}"#, r#"{"n_a": 1}"#, true; "pattern match ok")]
#[test_case(r#"{"patternProperties": {"^n_": {"type": "integer"}}}"#, r#"{"n_a": "x"}"#, false; "pattern match constrained")]
#[test_case(r#"{"patternProperties": {"^n_": {}}, "additionalProperties": false}"#, r#"{"n_a": 1}"#, true; "pattern counts as match")]
#[test_case(r#"{"properties": {"a": {}}, "patternProperties": {"^a$": {"type": "integer"}}}"#, r#"{"a": "x"}"#, false; "both property sets apply")]
#[test_case(r#"{"additionalProperties": {"type": "string"}}"#, r#"{"x": "s"}"#, true; "additional schema ok")]
#[test_case(r#"{"additionalProperties": {"type": "string"}}"#, r#"{"x": 1}"#, false; "additional schema rejects")]
#[test_case(r#"{"dependencies": {"credit": ["billing"]}}"#, r#"{"credit": 1, "billing": 2}"#, true; "property dependency ok")]
#[test_case(r#"{"dependencies": {"credit": ["billing"]}}"#, r#"{"credit": 1}"#, false; "property dependency missing")]
#[test_case(r#"{"dependencies": {"credit": ["billing"]}}"#, r#"{"cash": 1}"#, true; "dependency not triggered")]
#[test_case(r#"{"dependencies": {"credit": {"required": ["billing"]}}}"#, r#"{"credit": 1}"#, false; "schema dependency rejects")]
#[test_case(r#"{"dependencies": {"credit": {"required": ["billing"]}}}"#, r#"{"credit": 1, "billing": 2}"#, true; "schema dependency ok")]
fn object_scenarios(schema: &str, instance: &str, expected: bool) {
    if expected {
        assert_valid(schema, instance);
    } else {
        assert_invalid(schema, instance);
    }
}

#[test_case(r#"{"items": {"type": "integer"}}"#, "[1, 2, 3]", true; "list items ok")]
#[test_case(r#"{"items": {"type": "integer"}}"#, r#"[1, "x"]"#, false; "list items reject")]
#[test_case(r#"{"items": [{"type": "integer"}], "additionalItems": {"type": "string"}}"#, r#"[1, "x", "y"]"#, true; "additional schema ok")]
#[test_case(r#"{"items": [{"type": "integer"}], "additionalItems": {"type": "string"}}"#, "[1, 2]", false; "additional schema rejects")]
#[test_case(r#"{"items": [{"type": "integer"}]}"#, r#"[1, "anything"]"#, true; "tuple tail free by default")]
fn array_scenarios(schema: &str, instance: &str, expected: bool) {
    if expected {
        assert_valid(schema, instance);
    } else {
        assert_invalid(schema, instance);
    }
}

#[test]
fn all_of_behaves_like_conjunction() {
    let left = r#"{"type": "integer"}"#;
    let right = r#"{"minimum": 2}"#;
    let both = r#"{"allOf": [{"type": "integer"}, {"minimum": 2}]}"#;
    for instance in ["1", "2", "3.5", "\"x\"", "7"] {
        let expected = check(left, instance).is_valid() && check(right, instance).is_valid();
        assert_eq!(check(both, instance).is_valid(), expected, "for {}", instance);
    }
}

#[test]
fn not_inverts_acceptance() {
    let inner = r#"{"type": "string"}"#;
    let negated = r#"{"not": {"type": "string"}}"#;
    for instance in ["\"s\"", "1", "null", "[]"] {
        assert_eq!(
            check(negated, instance).is_valid(),
            !check(inner, instance).is_valid(),
            "for {}",
            instance
        );
    }
}

#[test]
fn union_type_behaves_like_disjunction() {
    let union = r#"{"type": ["integer", "string"]}"#;
    for (instance, expected) in [("1", true), ("\"s\"", true), ("1.5", false), ("null", false)] {
        assert_eq!(check(union, instance).is_valid(), expected, "for {}", instance);
    }
}

#[test]
fn any_of_accepts_either() {
    let schema = r#"{"anyOf": [{"type": "integer"}, {"minimum": 2}]}"#;
    assert_valid(schema, "1");
    assert_valid(schema, "2.5");
    assert_invalid(schema, "1.5");
}

#[test]
fn nested_combinators() {
    let schema = r#"{
        "type": "object",
        "properties": {
            "value": {"oneOf": [
                {"type": "string", "minLength": 3},
                {"type": "array", "items": {"type": "string"}}
            ]}
        }
    }"#;
    assert_valid(schema, r#"{"value": "abc"}"#);
    assert_valid(schema, r#"{"value": ["a", "b"]}"#);
    assert_invalid(schema, r#"{"value": "ab"}"#);
    assert_invalid(schema, r#"{"value": ["a", 1]}"#);
}

#[test]
fn validation_is_repeatable() {
    let schema = compile(r#"{"type": "object", "required": ["a"]}"#);
    let instance = value(r#"{"b": 1}"#);
    let first = schema.validate(&instance);
    let second = schema.validate(&instance);
    assert_eq!(first.is_valid(), second.is_valid());
    assert_eq!(
        first.error().map(|e| e.to_string()),
        second.error().map(|e| e.to_string())
    );
}

#[test]
fn first_error_is_reported() {
    let schema = compile(
        r#"{"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}"#,
    );
    let verdict = schema.validate(&value(r#"{"name": 3}"#));
    assert_eq!(
        verdict.error().unwrap().to_string(),
        "'3' is not of type 'string'"
    );
    let verdict = schema.validate(&value(r#"{"other": 3}"#));
    assert_eq!(
        verdict.error().unwrap().to_string(),
        "'name' is a required property"
    );
}

#[test]
fn parse_and_validate_returns_both() {
    let schema = compile(r#"{"type": "array", "items": {"type": "integer"}}"#);
    let (parsed, verdict) =
        parse_and_validate(b"[1, 2, 3]", &schema, &ParserOptions::default()).unwrap();
    assert!(verdict.is_valid());
    assert_eq!(parsed, value("[1, 2, 3]"));

    let (parsed, verdict) =
        parse_and_validate(br#"[1, "x"]"#, &schema, &ParserOptions::default()).unwrap();
    assert!(!verdict.is_valid());
    assert_eq!(parsed, value(r#"[1, "x"]"#));
}

#[test]
fn schema_built_with_builder_compiles() {
    let mut builder = Builder::new();
    builder.object_start().unwrap();
    builder.object_add("type", "object").unwrap();
    builder.object_add_object("properties").unwrap();
    builder.object_add_object("count").unwrap();
    builder.object_add("type", "integer").unwrap();
    builder.object_add("minimum", 0i64).unwrap();
    builder.object_end().unwrap();
    builder.object_end().unwrap();
    builder.object_end().unwrap();
    let schema = Schema::compile(&builder.finish().unwrap()).unwrap();
    assert!(schema.is_valid(&value(r#"{"count": 3}"#)));
    assert!(!schema.is_valid(&value(r#"{"count": -1}"#)));
}

#[test_case(r#"{"type": "unknown"}"#, SchemaErrorKind::ValueDataType; "unknown type name")]
#[test_case(r#"{"type": []}"#, SchemaErrorKind::ValueDataType; "empty type array")]
#[test_case(r#"{"type": 3}"#, SchemaErrorKind::KeywordType; "non string type")]
#[test_case(r#"{"required": []}"#, SchemaErrorKind::ValueDataDeps; "empty required")]
#[test_case(r#"{"required": [1]}"#, SchemaErrorKind::KeywordType; "non string required")]
#[test_case(r#"{"minLength": 2.5}"#, SchemaErrorKind::ValueDataType; "fractional length")]
#[test_case(r#"{"minLength": -1}"#, SchemaErrorKind::ValueDataType; "negative length")]
#[test_case(r#"{"multipleOf": 0}"#, SchemaErrorKind::ValueDataType; "zero multiple")]
#[test_case(r#"{"enum": []}"#, SchemaErrorKind::ValueDataType; "empty enum")]
#[test_case(r#"{"enum": [1, 1]}"#, SchemaErrorKind::ValueDataType; "duplicate enum")]
#[test_case(r#"{"allOf": []}"#, SchemaErrorKind::ValueDataType; "empty allOf")]
#[test_case(r#"{"allOf": [3]}"#, SchemaErrorKind::KeywordType; "non object allOf entry")]
#[test_case(r#"{"pattern": "("}"#, SchemaErrorKind::Pattern; "broken pattern")]
#[test_case(r#"{"exclusiveMinimum": true}"#, SchemaErrorKind::KeywordPrep; "exclusive without bound")]
#[test_case(r#"{"$ref": 3}"#, SchemaErrorKind::KeywordType; "non string ref")]
#[test_case(r##"{"$ref": "#/definitions/missing"}"##, SchemaErrorKind::ReferenceUnresolved; "missing ref target")]
#[test_case(r#"{"dependencies": {"a": []}}"#, SchemaErrorKind::ValueDataDeps; "empty dependency array")]
fn compile_failures(schema: &str, expected: SchemaErrorKind) {
    let err = Schema::compile(&value(schema)).unwrap_err();
    assert_eq!(err.kind(), expected, "for schema {}", schema);
}

#[test]
fn id_scoped_references() {
    let schema = compile(
        r##"{
            "id": "http://example.com/root.json",
            "properties": {
                "name": {"$ref": "#/definitions/name"},
                "other": {"$ref": "http://example.com/root.json#/definitions/name"}
            },
            "definitions": {"name": {"type": "string"}}
        }"##,
    );
    assert!(schema.is_valid(&value(r#"{"name": "a", "other": "b"}"#)));
    assert!(!schema.is_valid(&value(r#"{"name": 1}"#)));
    assert!(!schema.is_valid(&value(r#"{"other": 1}"#)));
}

#[test]
fn recursive_reference_through_properties() {
    let schema = compile(
        r##"{
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "child": {"$ref": "#"}
            },
            "required": ["name"]
        }"##,
    );
    assert!(schema.is_valid(&value(r#"{"name": "a", "child": {"name": "b"}}"#)));
    assert!(!schema.is_valid(&value(r#"{"name": "a", "child": {}}"#)));
}

#[test]
fn depth_limit_applies_to_validated_parses() {
    let schema = compile(r#"{"type": "array"}"#);
    let options = ParserOptions { max_depth: 2 };
    assert!(validate_stream(b"[[1]]", &schema, &options).is_ok());
    assert!(validate_stream(b"[[[1]]]", &schema, &options).is_err());
}
