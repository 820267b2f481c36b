use crate::primitive_type::PrimitiveType;
use crate::schema::error::TypeKind;
use crate::schema::pattern::CompiledPattern;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;
use url::Url;

/// Index of a compiled schema node in the arena owned by the schema
/// handle. References hold node ids instead of pointers, which is what
/// lets `$ref` cycles exist without ownership cycles.
pub(crate) type NodeId = usize;

/// One compiled schema object.
#[derive(Debug)]
pub(crate) struct SchemaNode {
    pub(crate) parent: Option<NodeId>,
    /// Resolution context for `$ref` targets of this node and its
    /// descendants, already combined with any `id` keyword.
    pub(crate) base_uri: Url,
    /// Resolved `$ref` target. A node with a reference carries no other
    /// keywords (draft-04 ignores siblings of `$ref`).
    pub(crate) reference: Option<NodeId>,
    pub(crate) common: CommonKeywords,
    pub(crate) typed: TypedKeywords,
}

/// Keywords parsed into every node regardless of its type.
#[derive(Debug, Default)]
pub(crate) struct CommonKeywords {
    pub(crate) default: Option<Value>,
    pub(crate) title: Option<Rc<str>>,
    pub(crate) description: Option<Rc<str>>,
    pub(crate) enum_: Option<Vec<Value>>,
    pub(crate) all_of: Option<Vec<NodeId>>,
    pub(crate) any_of: Option<Vec<NodeId>>,
    pub(crate) one_of: Option<Vec<NodeId>>,
    pub(crate) not: Option<NodeId>,
    pub(crate) definitions: Option<Vec<(Rc<str>, NodeId)>>,
}

/// Type-specific keyword bundle, discriminated by the `type` keyword.
///
/// A node without `type` is `Mixed` and carries every bundle; each bundle
/// only constrains values of its own primitive type. A multi-type node is
/// `Union` over per-type arm nodes compiled from the same keyword map.
#[derive(Debug)]
pub(crate) enum TypedKeywords {
    Null,
    Boolean,
    Integer(NumberKeywords),
    Number(NumberKeywords),
    String(StringKeywords),
    Array(ArrayKeywords),
    Object(ObjectKeywords),
    Mixed(Box<MixedKeywords>),
    Union(Vec<NodeId>),
}

#[derive(Debug, Default)]
pub(crate) struct MixedKeywords {
    pub(crate) number: NumberKeywords,
    pub(crate) string: StringKeywords,
    pub(crate) array: ArrayKeywords,
    pub(crate) object: ObjectKeywords,
}

/// A numeric keyword payload: either of the two instance number tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SchemaNumber {
    Int(i64),
    Double(f64),
}

impl fmt::Display for SchemaNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaNumber::Int(int) => write!(f, "{}", int),
            SchemaNumber::Double(double) => write!(f, "{}", double),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct NumberKeywords {
    pub(crate) multiple_of: Option<SchemaNumber>,
    pub(crate) minimum: Option<SchemaNumber>,
    pub(crate) maximum: Option<SchemaNumber>,
    pub(crate) exclusive_minimum: bool,
    pub(crate) exclusive_maximum: bool,
}

#[derive(Debug, Default)]
pub(crate) struct StringKeywords {
    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) pattern: Option<CompiledPattern>,
}

/// `items` is either a single schema applied to every element or a tuple
/// of per-index schemas.
#[derive(Debug)]
pub(crate) enum Items {
    List(NodeId),
    Tuple(Vec<NodeId>),
}

/// Payload of `additionalItems` / `additionalProperties`.
#[derive(Debug)]
pub(crate) enum SchemaOrFlag {
    Flag(bool),
    Node(NodeId),
}

#[derive(Debug, Default)]
pub(crate) struct ArrayKeywords {
    pub(crate) items: Option<Items>,
    pub(crate) additional_items: Option<SchemaOrFlag>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,
}

#[derive(Debug)]
pub(crate) struct PatternProperty {
    pub(crate) pattern: CompiledPattern,
    pub(crate) node: NodeId,
}

/// A `dependencies` entry: a schema the whole object must satisfy, or
/// properties that must co-exist with the trigger key.
#[derive(Debug)]
pub(crate) enum Dependency {
    Node(NodeId),
    Keys(Vec<Rc<str>>),
}

#[derive(Debug, Default)]
pub(crate) struct ObjectKeywords {
    pub(crate) properties: Option<Vec<(Rc<str>, NodeId)>>,
    pub(crate) pattern_properties: Option<Vec<PatternProperty>>,
    pub(crate) additional_properties: Option<SchemaOrFlag>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) required: Option<Vec<Rc<str>>>,
    pub(crate) dependencies: Option<Vec<(Rc<str>, Dependency)>>,
}

impl SchemaNode {
    pub(crate) fn placeholder(parent: Option<NodeId>, base_uri: Url) -> SchemaNode {
        SchemaNode {
            parent,
            base_uri,
            reference: None,
            common: CommonKeywords::default(),
            typed: TypedKeywords::Mixed(Box::new(MixedKeywords::default())),
        }
    }

    /// Whether the node's type gate admits a value of the given kind.
    /// `Mixed` admits everything; `Union` defers to its arms.
    pub(crate) fn allows(&self, kind: PrimitiveType) -> bool {
        match &self.typed {
            TypedKeywords::Null => kind == PrimitiveType::Null,
            TypedKeywords::Boolean => kind == PrimitiveType::Boolean,
            TypedKeywords::Integer(_) => kind == PrimitiveType::Integer,
            TypedKeywords::Number(_) => {
                kind == PrimitiveType::Integer || kind == PrimitiveType::Number
            }
            TypedKeywords::String(_) => kind == PrimitiveType::String,
            TypedKeywords::Array(_) => kind == PrimitiveType::Array,
            TypedKeywords::Object(_) => kind == PrimitiveType::Object,
            TypedKeywords::Mixed(_) | TypedKeywords::Union(_) => true,
        }
    }

    /// The declared type, for error messages.
    pub(crate) fn declared_type(&self) -> Option<PrimitiveType> {
        match &self.typed {
            TypedKeywords::Null => Some(PrimitiveType::Null),
            TypedKeywords::Boolean => Some(PrimitiveType::Boolean),
            TypedKeywords::Integer(_) => Some(PrimitiveType::Integer),
            TypedKeywords::Number(_) => Some(PrimitiveType::Number),
            TypedKeywords::String(_) => Some(PrimitiveType::String),
            TypedKeywords::Array(_) => Some(PrimitiveType::Array),
            TypedKeywords::Object(_) => Some(PrimitiveType::Object),
            TypedKeywords::Mixed(_) | TypedKeywords::Union(_) => None,
        }
    }

    pub(crate) fn type_error_kind(&self) -> TypeKind {
        match self.declared_type() {
            Some(single) => TypeKind::Single(single),
            None => TypeKind::Multiple(Vec::new()),
        }
    }

    pub(crate) fn number_keywords(&self) -> Option<&NumberKeywords> {
        match &self.typed {
            TypedKeywords::Integer(bundle) | TypedKeywords::Number(bundle) => Some(bundle),
            TypedKeywords::Mixed(mixed) => Some(&mixed.number),
            _ => None,
        }
    }

    pub(crate) fn string_keywords(&self) -> Option<&StringKeywords> {
        match &self.typed {
            TypedKeywords::String(bundle) => Some(bundle),
            TypedKeywords::Mixed(mixed) => Some(&mixed.string),
            _ => None,
        }
    }

    pub(crate) fn array_keywords(&self) -> Option<&ArrayKeywords> {
        match &self.typed {
            TypedKeywords::Array(bundle) => Some(bundle),
            TypedKeywords::Mixed(mixed) => Some(&mixed.array),
            _ => None,
        }
    }

    pub(crate) fn object_keywords(&self) -> Option<&ObjectKeywords> {
        match &self.typed {
            TypedKeywords::Object(bundle) => Some(bundle),
            TypedKeywords::Mixed(mixed) => Some(&mixed.object),
            _ => None,
        }
    }

    pub(crate) fn union_arms(&self) -> Option<&[NodeId]> {
        match &self.typed {
            TypedKeywords::Union(arms) => Some(arms),
            _ => None,
        }
    }
}
