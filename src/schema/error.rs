use crate::primitive_type::PrimitiveType;
use std::error;
use std::fmt;

/// Schema compilation failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// The schema root is not an object.
    RootDataType,
    /// A keyword value has the right JSON type but an invalid value.
    ValueDataType,
    /// A dependency-class keyword is empty where it must not be.
    ValueDataDeps,
    /// A keyword value has the wrong JSON type.
    KeywordType,
    /// Keywords are combined in an unusable way.
    KeywordPrep,
    /// A `$ref` target could not be resolved.
    ReferenceUnresolved,
    /// A `pattern` or `patternProperties` regex failed to compile.
    Pattern,
}

/// A typed schema compilation error with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    kind: SchemaErrorKind,
    message: String,
}

impl SchemaError {
    pub(crate) fn new(kind: SchemaErrorKind, message: String) -> SchemaError {
        SchemaError { kind, message }
    }

    pub(crate) fn keyword_type(keyword: &str, expected: &str) -> SchemaError {
        SchemaError::new(
            SchemaErrorKind::KeywordType,
            format!("keyword '{}' must be {}", keyword, expected),
        )
    }

    pub(crate) fn value_data_type(message: String) -> SchemaError {
        SchemaError::new(SchemaErrorKind::ValueDataType, message)
    }

    pub fn kind(&self) -> SchemaErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for SchemaError {}

/// How the `type` keyword was spelled, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Single(PrimitiveType),
    Multiple(Vec<PrimitiveType>),
}

/// The reason an instance failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    /// Value is of the wrong primitive type.
    Type { instance: String, kind: TypeKind },
    /// Value is not one of the enumerated options.
    Enum { instance: String, options: String },
    /// Number is above the maximum (or equal to an exclusive one).
    Maximum {
        instance: String,
        limit: String,
        exclusive: bool,
    },
    /// Number is below the minimum (or equal to an exclusive one).
    Minimum {
        instance: String,
        limit: String,
        exclusive: bool,
    },
    /// Number is not a multiple of the divisor.
    MultipleOf { instance: String, multiple_of: String },
    /// String is longer than `maxLength` code points.
    MaxLength { instance: String, limit: u64 },
    /// String is shorter than `minLength` code points.
    MinLength { instance: String, limit: u64 },
    /// String does not match the `pattern` regex.
    Pattern { instance: String, pattern: String },
    /// Array has more items than `maxItems`.
    MaxItems { count: usize, limit: u64 },
    /// Array has fewer items than `minItems`.
    MinItems { count: usize, limit: u64 },
    /// Array has equal elements although `uniqueItems` demands otherwise.
    UniqueItems { instance: String },
    /// Array has elements beyond the `items` tuple and `additionalItems`
    /// forbids them.
    AdditionalItems { limit: usize },
    /// Object has more properties than `maxProperties`.
    MaxProperties { count: usize, limit: u64 },
    /// Object has fewer properties than `minProperties`.
    MinProperties { count: usize, limit: u64 },
    /// A property listed in `required` is missing.
    Required { property: String },
    /// A property is not allowed by `additionalProperties: false`.
    AdditionalProperties { property: String },
    /// A property demanded by a `dependencies` entry is missing.
    Dependency { property: String, dependency: String },
    /// No `anyOf` subschema accepted the value.
    AnyOf { instance: String },
    /// No `oneOf` subschema accepted the value.
    OneOfNotValid { instance: String },
    /// More than one `oneOf` subschema accepted the value.
    OneOfMultipleValid { instance: String },
    /// The `not` subschema accepted the value.
    Not { instance: String },
    /// The value extent ended before validation could conclude.
    Incomplete,
}

/// First mismatch between an instance and a schema. Non-fatal: the
/// verdict is [`Verdict::Invalid`] and this error describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    kind: ValidationErrorKind,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind) -> ValidationError {
        ValidationError { kind }
    }

    pub fn kind(&self) -> &ValidationErrorKind {
        &self.kind
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::Type { instance, kind } => match kind {
                TypeKind::Single(expected) => {
                    write!(f, "'{}' is not of type '{}'", instance, expected)
                }
                TypeKind::Multiple(types) => write!(
                    f,
                    "'{}' is not of types '{}'",
                    instance,
                    types
                        .iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<String>>()
                        .join(", ")
                ),
            },
            ValidationErrorKind::Enum { instance, options } => {
                write!(f, "'{}' is not one of '{}'", instance, options)
            }
            ValidationErrorKind::Maximum {
                instance,
                limit,
                exclusive,
            } => {
                if *exclusive {
                    write!(
                        f,
                        "{} is greater than or equal to the maximum of {}",
                        instance, limit
                    )
                } else {
                    write!(f, "{} is greater than the maximum of {}", instance, limit)
                }
            }
            ValidationErrorKind::Minimum {
                instance,
                limit,
                exclusive,
            } => {
                if *exclusive {
                    write!(
                        f,
                        "{} is less than or equal to the minimum of {}",
                        instance, limit
                    )
                } else {
                    write!(f, "{} is less than the minimum of {}", instance, limit)
                }
            }
            ValidationErrorKind::MultipleOf {
                instance,
                multiple_of,
            } => write!(f, "{} is not a multiple of {}", instance, multiple_of),
            ValidationErrorKind::MaxLength { instance, limit } => {
                write!(f, "'{}' is longer than {} characters", instance, limit)
            }
            ValidationErrorKind::MinLength { instance, limit } => {
                write!(f, "'{}' is shorter than {} characters", instance, limit)
            }
            ValidationErrorKind::Pattern { instance, pattern } => {
                write!(f, "'{}' does not match '{}'", instance, pattern)
            }
            ValidationErrorKind::MaxItems { count, limit } => {
                write!(f, "array with {} items has more than {} items", count, limit)
            }
            ValidationErrorKind::MinItems { count, limit } => {
                write!(f, "array with {} items has less than {} items", count, limit)
            }
            ValidationErrorKind::UniqueItems { instance } => {
                write!(f, "non-unique element '{}'", instance)
            }
            ValidationErrorKind::AdditionalItems { limit } => {
                write!(
                    f,
                    "additional items are not allowed beyond the first {}",
                    limit
                )
            }
            ValidationErrorKind::MaxProperties { count, limit } => {
                write!(
                    f,
                    "object with {} properties has more than {} properties",
                    count, limit
                )
            }
            ValidationErrorKind::MinProperties { count, limit } => {
                write!(
                    f,
                    "object with {} properties has less than {} properties",
                    count, limit
                )
            }
            ValidationErrorKind::Required { property } => {
                write!(f, "'{}' is a required property", property)
            }
            ValidationErrorKind::AdditionalProperties { property } => {
                write!(f, "additional property '{}' is not allowed", property)
            }
            ValidationErrorKind::Dependency {
                property,
                dependency,
            } => write!(
                f,
                "'{}' is required by the dependency of '{}'",
                property, dependency
            ),
            ValidationErrorKind::AnyOf { instance } => write!(
                f,
                "'{}' is not valid under any of the given schemas",
                instance
            ),
            ValidationErrorKind::OneOfNotValid { instance } => write!(
                f,
                "'{}' is not valid under any of the given schemas",
                instance
            ),
            ValidationErrorKind::OneOfMultipleValid { instance } => write!(
                f,
                "'{}' is valid under more than one of the given schemas",
                instance
            ),
            ValidationErrorKind::Not { instance } => {
                write!(f, "'{}' is not allowed", instance)
            }
            ValidationErrorKind::Incomplete => f.write_str("validation did not complete"),
        }
    }
}

impl error::Error for ValidationError {}

/// Outcome of validating one instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid,
    /// The instance does not conform; the error is the first mismatch.
    Invalid(ValidationError),
    /// Validation itself could not run to completion.
    Error(SchemaError),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// The validation error, when the verdict is `Invalid`.
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Verdict::Invalid(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_prose() {
        let err = ValidationError::new(ValidationErrorKind::Type {
            instance: "42".to_string(),
            kind: TypeKind::Single(PrimitiveType::String),
        });
        assert_eq!(err.to_string(), "'42' is not of type 'string'");

        let err = ValidationError::new(ValidationErrorKind::Required {
            property: "email".to_string(),
        });
        assert_eq!(err.to_string(), "'email' is a required property");

        let err = ValidationError::new(ValidationErrorKind::Type {
            instance: "null".to_string(),
            kind: TypeKind::Multiple(vec![PrimitiveType::Integer, PrimitiveType::String]),
        });
        assert_eq!(err.to_string(), "'null' is not of types 'integer, string'");
    }
}
