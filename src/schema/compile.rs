use crate::map::Map;
use crate::pointer::Pointer;
use crate::primitive_type::PrimitiveType;
use crate::schema::error::{SchemaError, SchemaErrorKind};
use crate::schema::keyword;
use crate::schema::node::{
    ArrayKeywords, CommonKeywords, Dependency, Items, MixedKeywords, NodeId, NumberKeywords,
    ObjectKeywords, PatternProperty, SchemaNode, SchemaOrFlag, StringKeywords, TypedKeywords,
};
use crate::schema::pattern::compile_pattern;
use crate::schema::DocumentRegistry;
use crate::value::Value;
use std::collections::HashMap;
use std::convert::TryFrom;
use url::Url;

pub(crate) const DEFAULT_ROOT_URL: &str = "json-schema:///";

/// Key of the main document in the location table; external registry
/// documents use their registered URL string.
const ROOT_DOC: &str = "";

lazy_static::lazy_static! {
    static ref DEFAULT_SCOPE: Url = Url::parse(DEFAULT_ROOT_URL).expect("is a valid URL");
}

struct RegistryEntry {
    node: NodeId,
    doc: String,
    pointer: String,
}

struct PendingRef {
    node: NodeId,
    target: Url,
}

/// Walks a parsed schema document into the node arena. Two passes: the
/// whole document first, so that every `id`-scoped node and every
/// document location is known, then the recorded `$ref`s. References
/// that land on locations no schema object was compiled for yet are
/// compiled on demand, which also covers targets inside `default`
/// payloads and cross-document targets from the caller's registry.
pub(crate) struct Compiler<'d> {
    nodes: Vec<SchemaNode>,
    locations: HashMap<(String, String), NodeId>,
    registry: HashMap<String, RegistryEntry>,
    pending: Vec<PendingRef>,
    root_doc: &'d Value,
    root_scope: Url,
    root_base: String,
    docs: &'d DocumentRegistry,
}

pub(crate) fn compile_schema(
    document: &Value,
    docs: &DocumentRegistry,
) -> Result<(Vec<SchemaNode>, NodeId), SchemaError> {
    let root_map = match document {
        Value::Object(map) => map,
        _ => {
            return Err(SchemaError::new(
                SchemaErrorKind::RootDataType,
                "root of the schema must be an object".to_string(),
            ))
        }
    };
    let root_scope = match keyword::get_str(root_map, "id")? {
        Some(id) => join_uri(&DEFAULT_SCOPE, &id, "id")?,
        None => DEFAULT_SCOPE.clone(),
    };
    let mut root_base = root_scope.clone();
    root_base.set_fragment(None);
    let mut compiler = Compiler {
        nodes: Vec::new(),
        locations: HashMap::new(),
        registry: HashMap::new(),
        pending: Vec::new(),
        root_doc: document,
        root_scope: root_scope.clone(),
        root_base: root_base.to_string(),
        docs,
    };
    let root = compiler.compile_node(root_map, None, &DEFAULT_SCOPE, ROOT_DOC, String::new())?;
    compiler
        .registry
        .entry(root_scope.to_string())
        .or_insert(RegistryEntry {
            node: root,
            doc: ROOT_DOC.to_string(),
            pointer: String::new(),
        });
    compiler.resolve_pending()?;
    Ok((compiler.nodes, root))
}

fn join_uri(base: &Url, reference: &str, keyword: &str) -> Result<Url, SchemaError> {
    base.join(reference).map_err(|_| {
        SchemaError::new(
            SchemaErrorKind::KeywordPrep,
            format!(
                "keyword '{}' is not a valid URI reference: {}",
                keyword, reference
            ),
        )
    })
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl<'d> Compiler<'d> {
    fn compile_node(
        &mut self,
        map: &Map,
        parent: Option<NodeId>,
        parent_scope: &Url,
        doc: &str,
        pointer: String,
    ) -> Result<NodeId, SchemaError> {
        let scope = match keyword::get_str(map, "id")? {
            Some(id) => join_uri(parent_scope, &id, "id")?,
            None => parent_scope.clone(),
        };
        let id = self.nodes.len();
        self.nodes.push(SchemaNode::placeholder(parent, scope.clone()));
        self.locations
            .entry((doc.to_string(), pointer.clone()))
            .or_insert(id);
        if map.contains_key("id") {
            self.registry
                .entry(scope.to_string())
                .or_insert(RegistryEntry {
                    node: id,
                    doc: doc.to_string(),
                    pointer: pointer.clone(),
                });
        }
        if let Some(reference) = map.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| SchemaError::keyword_type("$ref", "a string"))?;
            let target = join_uri(&scope, reference, "$ref")?;
            self.pending.push(PendingRef { node: id, target });
            // Draft-04: siblings of $ref are ignored.
            return Ok(id);
        }
        let typed = self.compile_typed(map, id, &scope, doc, &pointer)?;
        let common = self.compile_common(map, id, &scope, doc, &pointer)?;
        self.nodes[id] = SchemaNode {
            parent,
            base_uri: scope,
            reference: None,
            common,
            typed,
        };
        Ok(id)
    }

    fn compile_typed(
        &mut self,
        map: &Map,
        self_id: NodeId,
        scope: &Url,
        doc: &str,
        pointer: &str,
    ) -> Result<TypedKeywords, SchemaError> {
        match map.get("type") {
            None => Ok(TypedKeywords::Mixed(Box::new(MixedKeywords {
                number: self.number_bundle(map)?,
                string: self.string_bundle(map)?,
                array: self.array_bundle(map, self_id, scope, doc, pointer)?,
                object: self.object_bundle(map, self_id, scope, doc, pointer)?,
            }))),
            Some(Value::String(name)) => self.typed_for(name, map, self_id, scope, doc, pointer),
            Some(Value::Array(names)) => {
                if names.is_empty() {
                    return Err(SchemaError::value_data_type(
                        "keyword 'type' must not be an empty array".to_string(),
                    ));
                }
                let mut arms = Vec::with_capacity(names.len());
                let mut seen = Vec::with_capacity(names.len());
                for name in names.iter() {
                    let name = name.as_str().ok_or_else(|| {
                        SchemaError::keyword_type("type", "a string or an array of strings")
                    })?;
                    if seen.contains(&name) {
                        return Err(SchemaError::value_data_type(format!(
                            "keyword 'type' has a duplicate entry: {}",
                            name
                        )));
                    }
                    seen.push(name);
                    let arm_id = self.nodes.len();
                    self.nodes
                        .push(SchemaNode::placeholder(Some(self_id), scope.clone()));
                    let typed = self.typed_for(name, map, arm_id, scope, doc, pointer)?;
                    self.nodes[arm_id] = SchemaNode {
                        parent: Some(self_id),
                        base_uri: scope.clone(),
                        reference: None,
                        common: CommonKeywords::default(),
                        typed,
                    };
                    arms.push(arm_id);
                }
                Ok(TypedKeywords::Union(arms))
            }
            Some(_) => Err(SchemaError::keyword_type(
                "type",
                "a string or an array of strings",
            )),
        }
    }

    fn typed_for(
        &mut self,
        name: &str,
        map: &Map,
        self_id: NodeId,
        scope: &Url,
        doc: &str,
        pointer: &str,
    ) -> Result<TypedKeywords, SchemaError> {
        let primitive = PrimitiveType::try_from(name).map_err(|_| {
            SchemaError::value_data_type(format!("'{}' is not a valid type name", name))
        })?;
        Ok(match primitive {
            PrimitiveType::Null => TypedKeywords::Null,
            PrimitiveType::Boolean => TypedKeywords::Boolean,
            PrimitiveType::Integer => TypedKeywords::Integer(self.number_bundle(map)?),
            PrimitiveType::Number => TypedKeywords::Number(self.number_bundle(map)?),
            PrimitiveType::String => TypedKeywords::String(self.string_bundle(map)?),
            PrimitiveType::Array => {
                TypedKeywords::Array(self.array_bundle(map, self_id, scope, doc, pointer)?)
            }
            PrimitiveType::Object => {
                TypedKeywords::Object(self.object_bundle(map, self_id, scope, doc, pointer)?)
            }
        })
    }

    fn number_bundle(&self, map: &Map) -> Result<NumberKeywords, SchemaError> {
        let multiple_of = keyword::get_positive_number(map, "multipleOf")?;
        let minimum = keyword::get_number(map, "minimum")?;
        let maximum = keyword::get_number(map, "maximum")?;
        let exclusive_minimum = keyword::get_bool(map, "exclusiveMinimum")?;
        let exclusive_maximum = keyword::get_bool(map, "exclusiveMaximum")?;
        if exclusive_minimum.is_some() && minimum.is_none() {
            return Err(SchemaError::new(
                SchemaErrorKind::KeywordPrep,
                "keyword 'exclusiveMinimum' requires 'minimum'".to_string(),
            ));
        }
        if exclusive_maximum.is_some() && maximum.is_none() {
            return Err(SchemaError::new(
                SchemaErrorKind::KeywordPrep,
                "keyword 'exclusiveMaximum' requires 'maximum'".to_string(),
            ));
        }
        Ok(NumberKeywords {
            multiple_of,
            minimum,
            maximum,
            exclusive_minimum: exclusive_minimum.unwrap_or(false),
            exclusive_maximum: exclusive_maximum.unwrap_or(false),
        })
    }

    fn string_bundle(&self, map: &Map) -> Result<StringKeywords, SchemaError> {
        Ok(StringKeywords {
            min_length: keyword::get_uint(map, "minLength", false)?,
            max_length: keyword::get_uint(map, "maxLength", false)?,
            pattern: keyword::get_regex(map, "pattern")?,
        })
    }

    fn array_bundle(
        &mut self,
        map: &Map,
        self_id: NodeId,
        scope: &Url,
        doc: &str,
        pointer: &str,
    ) -> Result<ArrayKeywords, SchemaError> {
        let items = match map.get("items") {
            None => None,
            Some(Value::Object(object)) => Some(Items::List(self.compile_node(
                object,
                Some(self_id),
                scope,
                doc,
                format!("{}/items", pointer),
            )?)),
            Some(Value::Array(list)) => {
                let mut tuple = Vec::with_capacity(list.len());
                for (i, item) in list.iter().enumerate() {
                    match item {
                        Value::Object(object) => tuple.push(self.compile_node(
                            object,
                            Some(self_id),
                            scope,
                            doc,
                            format!("{}/items/{}", pointer, i),
                        )?),
                        _ => {
                            return Err(SchemaError::keyword_type(
                                "items",
                                "a schema object or an array of schema objects",
                            ))
                        }
                    }
                }
                Some(Items::Tuple(tuple))
            }
            Some(_) => {
                return Err(SchemaError::keyword_type(
                    "items",
                    "a schema object or an array of schema objects",
                ))
            }
        };
        Ok(ArrayKeywords {
            items,
            additional_items: self.schema_or_flag(
                map,
                "additionalItems",
                self_id,
                scope,
                doc,
                pointer,
            )?,
            min_items: keyword::get_uint(map, "minItems", false)?,
            max_items: keyword::get_uint(map, "maxItems", false)?,
            unique_items: keyword::get_bool(map, "uniqueItems")?.unwrap_or(false),
        })
    }

    fn object_bundle(
        &mut self,
        map: &Map,
        self_id: NodeId,
        scope: &Url,
        doc: &str,
        pointer: &str,
    ) -> Result<ObjectKeywords, SchemaError> {
        let properties = match map.get("properties") {
            None => None,
            Some(Value::Object(props)) => {
                let mut compiled = Vec::with_capacity(props.len());
                for (key, member) in props.iter() {
                    match member {
                        Value::Object(object) => compiled.push((
                            std::rc::Rc::clone(key),
                            self.compile_node(
                                object,
                                Some(self_id),
                                scope,
                                doc,
                                format!("{}/properties/{}", pointer, escape_pointer_token(key)),
                            )?,
                        )),
                        _ => {
                            return Err(SchemaError::keyword_type(
                                "properties",
                                "an object of schema objects",
                            ))
                        }
                    }
                }
                Some(compiled)
            }
            Some(_) => {
                return Err(SchemaError::keyword_type(
                    "properties",
                    "an object of schema objects",
                ))
            }
        };
        let pattern_properties = match map.get("patternProperties") {
            None => None,
            Some(Value::Object(props)) => {
                let mut compiled = Vec::with_capacity(props.len());
                for (key, member) in props.iter() {
                    let pattern = compile_pattern(key)?;
                    match member {
                        Value::Object(object) => compiled.push(PatternProperty {
                            pattern,
                            node: self.compile_node(
                                object,
                                Some(self_id),
                                scope,
                                doc,
                                format!(
                                    "{}/patternProperties/{}",
                                    pointer,
                                    escape_pointer_token(key)
                                ),
                            )?,
                        }),
                        _ => {
                            return Err(SchemaError::keyword_type(
                                "patternProperties",
                                "an object of schema objects",
                            ))
                        }
                    }
                }
                Some(compiled)
            }
            Some(_) => {
                return Err(SchemaError::keyword_type(
                    "patternProperties",
                    "an object of schema objects",
                ))
            }
        };
        let dependencies = match map.get("dependencies") {
            None => None,
            Some(Value::Object(deps)) => {
                let mut compiled = Vec::with_capacity(deps.len());
                for (key, member) in deps.iter() {
                    let dependency = match member {
                        Value::Object(object) => Dependency::Node(self.compile_node(
                            object,
                            Some(self_id),
                            scope,
                            doc,
                            format!("{}/dependencies/{}", pointer, escape_pointer_token(key)),
                        )?),
                        Value::Array(items) => {
                            if items.is_empty() {
                                return Err(SchemaError::new(
                                    SchemaErrorKind::ValueDataDeps,
                                    "keyword 'dependencies' must not hold an empty array"
                                        .to_string(),
                                ));
                            }
                            let mut keys = Vec::with_capacity(items.len());
                            for item in items.iter() {
                                match item {
                                    Value::String(text) => keys.push(std::rc::Rc::clone(text)),
                                    _ => {
                                        return Err(SchemaError::keyword_type(
                                            "dependencies",
                                            "a schema object or an array of strings",
                                        ))
                                    }
                                }
                            }
                            Dependency::Keys(keys)
                        }
                        _ => {
                            return Err(SchemaError::keyword_type(
                                "dependencies",
                                "a schema object or an array of strings",
                            ))
                        }
                    };
                    compiled.push((std::rc::Rc::clone(key), dependency));
                }
                Some(compiled)
            }
            Some(_) => {
                return Err(SchemaError::keyword_type(
                    "dependencies",
                    "an object of schema objects or string arrays",
                ))
            }
        };
        Ok(ObjectKeywords {
            properties,
            pattern_properties,
            additional_properties: self.schema_or_flag(
                map,
                "additionalProperties",
                self_id,
                scope,
                doc,
                pointer,
            )?,
            min_properties: keyword::get_uint(map, "minProperties", false)?,
            max_properties: keyword::get_uint(map, "maxProperties", false)?,
            required: keyword::get_string_array(map, "required", true)?,
            dependencies,
        })
    }

    /// Boolean-or-schema union slot (`additionalItems`,
    /// `additionalProperties`).
    fn schema_or_flag(
        &mut self,
        map: &Map,
        name: &str,
        self_id: NodeId,
        scope: &Url,
        doc: &str,
        pointer: &str,
    ) -> Result<Option<SchemaOrFlag>, SchemaError> {
        match map.get(name) {
            None => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(SchemaOrFlag::Flag(*flag))),
            Some(Value::Object(object)) => Ok(Some(SchemaOrFlag::Node(self.compile_node(
                object,
                Some(self_id),
                scope,
                doc,
                format!("{}/{}", pointer, name),
            )?))),
            Some(_) => Err(SchemaError::keyword_type(
                name,
                "a boolean or a schema object",
            )),
        }
    }

    fn compile_common(
        &mut self,
        map: &Map,
        self_id: NodeId,
        scope: &Url,
        doc: &str,
        pointer: &str,
    ) -> Result<CommonKeywords, SchemaError> {
        let definitions = match map.get("definitions") {
            None => None,
            Some(Value::Object(defs)) => {
                let mut compiled = Vec::with_capacity(defs.len());
                for (key, member) in defs.iter() {
                    match member {
                        Value::Object(object) => compiled.push((
                            std::rc::Rc::clone(key),
                            self.compile_node(
                                object,
                                Some(self_id),
                                scope,
                                doc,
                                format!("{}/definitions/{}", pointer, escape_pointer_token(key)),
                            )?,
                        )),
                        _ => {
                            return Err(SchemaError::keyword_type(
                                "definitions",
                                "an object of schema objects",
                            ))
                        }
                    }
                }
                Some(compiled)
            }
            Some(_) => {
                return Err(SchemaError::keyword_type(
                    "definitions",
                    "an object of schema objects",
                ))
            }
        };
        let not = match map.get("not") {
            None => None,
            Some(Value::Object(object)) => Some(self.compile_node(
                object,
                Some(self_id),
                scope,
                doc,
                format!("{}/not", pointer),
            )?),
            Some(_) => return Err(SchemaError::keyword_type("not", "a schema object")),
        };
        Ok(CommonKeywords {
            default: map.get("default").cloned(),
            title: keyword::get_str(map, "title")?,
            description: keyword::get_str(map, "description")?,
            enum_: keyword::get_enum(map, "enum")?,
            all_of: self.schema_array(map, "allOf", self_id, scope, doc, pointer)?,
            any_of: self.schema_array(map, "anyOf", self_id, scope, doc, pointer)?,
            one_of: self.schema_array(map, "oneOf", self_id, scope, doc, pointer)?,
            not,
            definitions,
        })
    }

    /// Non-empty array of schema objects (`allOf`, `anyOf`, `oneOf`).
    fn schema_array(
        &mut self,
        map: &Map,
        name: &str,
        self_id: NodeId,
        scope: &Url,
        doc: &str,
        pointer: &str,
    ) -> Result<Option<Vec<NodeId>>, SchemaError> {
        let items = match map.get(name) {
            None => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(SchemaError::keyword_type(
                    name,
                    "an array of schema objects",
                ))
            }
        };
        if items.is_empty() {
            return Err(SchemaError::value_data_type(format!(
                "keyword '{}' must not be an empty array",
                name
            )));
        }
        let mut compiled = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::Object(object) => compiled.push(self.compile_node(
                    object,
                    Some(self_id),
                    scope,
                    doc,
                    format!("{}/{}/{}", pointer, name, i),
                )?),
                _ => {
                    return Err(SchemaError::keyword_type(
                        name,
                        "an array of schema objects",
                    ))
                }
            }
        }
        Ok(Some(compiled))
    }

    fn resolve_pending(&mut self) -> Result<(), SchemaError> {
        while let Some(pending) = self.pending.pop() {
            let target = self.resolve_target(&pending.target)?;
            self.nodes[pending.node].reference = Some(target);
        }
        Ok(())
    }

    fn resolve_target(&mut self, target: &Url) -> Result<NodeId, SchemaError> {
        if let Some(entry) = self.registry.get(target.as_str()) {
            return Ok(entry.node);
        }
        let fragment = target.fragment().map(str::to_string);
        let mut base = target.clone();
        base.set_fragment(None);
        let base_key = base.to_string();
        let (doc_key, prefix) = if let Some(entry) = self.registry.get(&base_key) {
            (entry.doc.clone(), entry.pointer.clone())
        } else if base_key == self.root_base {
            (ROOT_DOC.to_string(), String::new())
        } else if let Some(document) = self.docs.get(&base) {
            if !self
                .locations
                .contains_key(&(base_key.clone(), String::new()))
            {
                let node = match document {
                    Value::Object(map) => {
                        self.compile_node(map, None, &base, &base_key, String::new())?
                    }
                    _ => {
                        return Err(unresolved(target, "registered document is not an object"));
                    }
                };
                self.registry
                    .entry(base_key.clone())
                    .or_insert(RegistryEntry {
                        node,
                        doc: base_key.clone(),
                        pointer: String::new(),
                    });
            }
            (base_key.clone(), String::new())
        } else {
            return Err(unresolved(target, "no document matches the base URI"));
        };
        match fragment.as_deref() {
            None | Some("") => self
                .locations
                .get(&(doc_key, prefix))
                .copied()
                .ok_or_else(|| unresolved(target, "base document has no schema root")),
            Some(frag) => {
                let pointer = Pointer::from_fragment(frag)
                    .map_err(|err| unresolved(target, &err.to_string()))?;
                let full = format!("{}{}", prefix, pointer.raw());
                if let Some(node) = self.locations.get(&(doc_key.clone(), full.clone())) {
                    return Ok(*node);
                }
                self.compile_at_pointer(&doc_key, &full, target)
            }
        }
    }

    /// Compile the schema object a reference points at, when the normal
    /// walk did not visit it as a schema position.
    fn compile_at_pointer(
        &mut self,
        doc_key: &str,
        full_pointer: &str,
        target: &Url,
    ) -> Result<NodeId, SchemaError> {
        let (document, mut scope) = self.doc_root(doc_key, target)?;
        let pointer =
            Pointer::new(full_pointer).map_err(|err| unresolved(target, &err.to_string()))?;
        let mut current = document;
        let tokens = pointer.tokens();
        for (i, token) in tokens.iter().enumerate() {
            current = match current {
                Value::Object(map) => map
                    .get(token)
                    .ok_or_else(|| unresolved(target, "no value at the referenced location"))?,
                Value::Array(items) => token
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .ok_or_else(|| unresolved(target, "no value at the referenced location"))?,
                _ => return Err(unresolved(target, "no value at the referenced location")),
            };
            // `id` keywords along the path re-scope nested references; the
            // target's own `id` is applied during its compilation.
            if i + 1 < tokens.len() {
                if let Some(Value::String(id)) = current.get("id") {
                    scope = join_uri(&scope, id, "id")?;
                }
            }
        }
        match current {
            Value::Object(map) => {
                self.compile_node(map, None, &scope, doc_key, full_pointer.to_string())
            }
            _ => Err(unresolved(target, "referenced value is not a schema object")),
        }
    }

    fn doc_root(&self, doc_key: &str, target: &Url) -> Result<(&'d Value, Url), SchemaError> {
        if doc_key == ROOT_DOC {
            return Ok((self.root_doc, self.root_scope.clone()));
        }
        let url =
            Url::parse(doc_key).map_err(|_| unresolved(target, "invalid document base URI"))?;
        let document = self
            .docs
            .get(&url)
            .ok_or_else(|| unresolved(target, "no document matches the base URI"))?;
        let scope = self
            .locations
            .get(&(doc_key.to_string(), String::new()))
            .map(|node| self.nodes[*node].base_uri.clone())
            .unwrap_or(url);
        Ok((document, scope))
    }
}

fn unresolved(target: &Url, detail: &str) -> SchemaError {
    SchemaError::new(
        SchemaErrorKind::ReferenceUnresolved,
        format!("could not resolve reference '{}': {}", target, detail),
    )
}
