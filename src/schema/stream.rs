use crate::map::Map;
use crate::primitive_type::PrimitiveType;
use crate::schema::checks;
use crate::schema::error::{
    SchemaError, SchemaErrorKind, TypeKind, ValidationError, ValidationErrorKind, Verdict,
};
use crate::schema::node::{Dependency, Items, NodeId, SchemaOrFlag};
use crate::schema::Schema;
use crate::value::{value_hash, Value};
use std::collections::HashSet;
use std::rc::Rc;

/// Event-driven validator over a compiled schema.
///
/// The stream keeps a LIFO stack of positions. The bottom frame awaits
/// the document value; every container start pushes a frame whose active
/// nodes are the schemas in force for that container, and every end pops
/// it, folds the structural checks and combinator sub-streams, and
/// deposits the per-node results one frame down. Combinators (`allOf`,
/// `anyOf`, `oneOf`, `not`), union types and `$ref` targets run as
/// sub-streams fed the same events; their verdicts are combined when the
/// governed value completes. The first invalidation wins and the stream
/// never recovers to valid.
pub struct ValidationStream<'s> {
    schema: &'s Schema,
    stack: Vec<Frame<'s>>,
    outcome: Option<Result<(), ValidationError>>,
}

enum Event<'a> {
    ObjectStart,
    ObjectKey(&'a Rc<str>),
    ObjectUpdate(&'a Rc<str>, &'a Value),
    ObjectEnd,
    ArrayStart,
    ArrayAppend(&'a Value),
    ArrayEnd,
    Scalar(&'a Value),
}

enum Shape {
    Root,
    Object { seen: HashSet<Rc<str>> },
    Array { index: usize },
}

enum EnumAccum {
    Array(Vec<Value>),
    Object(Map),
}

/// One stack position: the container (or root) being validated and the
/// schema nodes applying to it.
struct Frame<'s> {
    shape: Shape,
    nodes: Vec<ActiveNode<'s>>,
    owners: Vec<Owner>,
    pending: Option<Slot<'s>>,
    pending_result: Option<Vec<(Owner, Result<(), ValidationError>)>>,
    /// Rebuilt container value, kept only while an active node carries
    /// `enum` and needs the whole value at the end.
    enum_accum: Option<EnumAccum>,
}

/// Where a slot node's verdict is recorded once its value completes.
#[derive(Clone, Copy)]
enum Owner {
    Root,
    Node(usize),
}

/// A pending value position: the child schemas a member or element must
/// satisfy, tagged with the frame nodes they report back to.
struct Slot<'s> {
    nodes: Vec<ActiveNode<'s>>,
    owners: Vec<Owner>,
}

enum SubKind {
    AllOf,
    AnyOf,
    OneOf,
    Not,
    Union,
    Ref,
}

struct SubCheck<'s> {
    kind: SubKind,
    streams: Vec<ValidationStream<'s>>,
    /// Union arm types, for the combined type error.
    types: Vec<PrimitiveType>,
}

struct DepCheck<'s> {
    key: Rc<str>,
    stream: ValidationStream<'s>,
}

#[derive(Default)]
struct UniqAccum {
    hashes: HashSet<u64>,
    values: Vec<Value>,
}

/// Per-schema-node state for one value extent.
struct ActiveNode<'s> {
    node: NodeId,
    /// A `$ref` expansion cycle landed back on this node with no input
    /// consumed; the outer expansion already covers it.
    vacuous: bool,
    failure: Option<ValidationError>,
    subs: Vec<SubCheck<'s>>,
    deps: Vec<DepCheck<'s>>,
    uniq: Option<UniqAccum>,
}

impl<'s> ActiveNode<'s> {
    fn build(schema: &'s Schema, node_id: NodeId, chain: &mut Vec<NodeId>) -> ActiveNode<'s> {
        let mut active = ActiveNode {
            node: node_id,
            vacuous: chain.contains(&node_id),
            failure: None,
            subs: Vec::new(),
            deps: Vec::new(),
            uniq: None,
        };
        if active.vacuous {
            return active;
        }
        chain.push(node_id);
        let node = schema.node(node_id);
        if let Some(target) = node.reference {
            active.subs.push(SubCheck {
                kind: SubKind::Ref,
                streams: vec![ValidationStream::new_at(schema, target, chain)],
                types: Vec::new(),
            });
        } else {
            if let Some(arms) = node.union_arms() {
                active.subs.push(SubCheck {
                    kind: SubKind::Union,
                    streams: arms
                        .iter()
                        .map(|arm| ValidationStream::new_at(schema, *arm, chain))
                        .collect(),
                    types: arms
                        .iter()
                        .filter_map(|arm| schema.node(*arm).declared_type())
                        .collect(),
                });
            }
            let combinators = [
                (SubKind::AllOf, node.common.all_of.as_ref()),
                (SubKind::AnyOf, node.common.any_of.as_ref()),
                (SubKind::OneOf, node.common.one_of.as_ref()),
            ];
            for (kind, list) in combinators {
                if let Some(list) = list {
                    active.subs.push(SubCheck {
                        kind,
                        streams: list
                            .iter()
                            .map(|sub| ValidationStream::new_at(schema, *sub, chain))
                            .collect(),
                        types: Vec::new(),
                    });
                }
            }
            if let Some(not) = node.common.not {
                active.subs.push(SubCheck {
                    kind: SubKind::Not,
                    streams: vec![ValidationStream::new_at(schema, not, chain)],
                    types: Vec::new(),
                });
            }
        }
        chain.pop();
        active
    }

    fn record(&mut self, error: ValidationError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }
}

impl<'s> Slot<'s> {
    fn build(schema: &'s Schema, entries: Vec<(NodeId, Owner)>, chain: &mut Vec<NodeId>) -> Slot<'s> {
        let mut nodes = Vec::with_capacity(entries.len());
        let mut owners = Vec::with_capacity(entries.len());
        for (node, owner) in entries {
            nodes.push(ActiveNode::build(schema, node, chain));
            owners.push(owner);
        }
        Slot { nodes, owners }
    }

    fn empty() -> Slot<'s> {
        Slot {
            nodes: Vec::new(),
            owners: Vec::new(),
        }
    }
}

impl<'s> Frame<'s> {
    fn root(slot: Slot<'s>) -> Frame<'s> {
        Frame {
            shape: Shape::Root,
            nodes: Vec::new(),
            owners: Vec::new(),
            pending: Some(slot),
            pending_result: None,
            enum_accum: None,
        }
    }
}

fn forward(stream: &mut ValidationStream<'_>, event: &Event<'_>) {
    match event {
        Event::ObjectStart => stream.object_start(),
        Event::ObjectKey(key) => stream.object_key(key),
        Event::ObjectUpdate(key, value) => stream.object_update(key, value),
        Event::ObjectEnd => stream.object_end(),
        Event::ArrayStart => stream.array_start(),
        Event::ArrayAppend(value) => stream.array_append(value),
        Event::ArrayEnd => stream.array_end(),
        Event::Scalar(value) => stream.value(value),
    }
}

fn sub_result(stream: &ValidationStream<'_>) -> Result<(), ValidationError> {
    match &stream.outcome {
        Some(result) => result.clone(),
        None => Err(ValidationError::new(ValidationErrorKind::Incomplete)),
    }
}

fn fold_subs(active: &ActiveNode<'_>, instance: &str) -> Result<(), ValidationError> {
    for sub in &active.subs {
        let outcomes: Vec<Result<(), ValidationError>> =
            sub.streams.iter().map(sub_result).collect();
        match sub.kind {
            SubKind::Ref | SubKind::AllOf => {
                for outcome in outcomes {
                    outcome?;
                }
            }
            SubKind::AnyOf => {
                if !outcomes.iter().any(Result::is_ok) {
                    return Err(ValidationError::new(ValidationErrorKind::AnyOf {
                        instance: instance.to_string(),
                    }));
                }
            }
            SubKind::OneOf => match outcomes.iter().filter(|o| o.is_ok()).count() {
                1 => {}
                0 => {
                    return Err(ValidationError::new(ValidationErrorKind::OneOfNotValid {
                        instance: instance.to_string(),
                    }))
                }
                _ => {
                    return Err(ValidationError::new(
                        ValidationErrorKind::OneOfMultipleValid {
                            instance: instance.to_string(),
                        },
                    ))
                }
            },
            SubKind::Not => {
                if outcomes.iter().all(Result::is_ok) {
                    return Err(ValidationError::new(ValidationErrorKind::Not {
                        instance: instance.to_string(),
                    }));
                }
            }
            SubKind::Union => {
                if !outcomes.iter().any(Result::is_ok) {
                    return Err(ValidationError::new(ValidationErrorKind::Type {
                        instance: instance.to_string(),
                        kind: TypeKind::Multiple(sub.types.clone()),
                    }));
                }
            }
        }
    }
    Ok(())
}

impl<'s> ValidationStream<'s> {
    pub fn new(schema: &'s Schema) -> ValidationStream<'s> {
        ValidationStream::new_at(schema, schema.root(), &mut Vec::new())
    }

    fn new_at(schema: &'s Schema, node: NodeId, chain: &mut Vec<NodeId>) -> ValidationStream<'s> {
        let slot = Slot::build(schema, vec![(node, Owner::Root)], chain);
        ValidationStream {
            schema,
            stack: vec![Frame::root(slot)],
            outcome: None,
        }
    }

    pub fn object_start(&mut self) {
        self.event(&Event::ObjectStart);
    }

    pub fn object_key(&mut self, key: &Rc<str>) {
        self.event(&Event::ObjectKey(key));
    }

    pub fn object_update(&mut self, key: &Rc<str>, value: &Value) {
        self.event(&Event::ObjectUpdate(key, value));
    }

    pub fn object_end(&mut self) {
        self.event(&Event::ObjectEnd);
    }

    pub fn array_start(&mut self) {
        self.event(&Event::ArrayStart);
    }

    pub fn array_append(&mut self, value: &Value) {
        self.event(&Event::ArrayAppend(value));
    }

    pub fn array_end(&mut self) {
        self.event(&Event::ArrayEnd);
    }

    pub fn value(&mut self, value: &Value) {
        self.event(&Event::Scalar(value));
    }

    /// The verdict. `Error` means the stream never saw a complete
    /// document value.
    pub fn finish(self) -> Verdict {
        match self.outcome {
            Some(Ok(())) => Verdict::Valid,
            Some(Err(error)) => Verdict::Invalid(error),
            None => Verdict::Error(SchemaError::new(
                SchemaErrorKind::KeywordPrep,
                "validation stream did not receive a complete document".to_string(),
            )),
        }
    }

    fn event(&mut self, event: &Event<'_>) {
        if self.outcome.is_some() {
            return;
        }
        self.broadcast(event);
        match event {
            Event::Scalar(value) => self.on_scalar(value),
            Event::ObjectStart => self.on_container_start(true),
            Event::ObjectKey(key) => self.on_object_key(key),
            Event::ObjectUpdate(key, value) => self.on_object_update(key, value),
            Event::ObjectEnd => self.on_container_end(true),
            Event::ArrayStart => self.on_container_start(false),
            Event::ArrayAppend(value) => self.on_array_append(value),
            Event::ArrayEnd => self.on_container_end(false),
        }
    }

    /// Combinator and dependency sub-streams of every open position see
    /// the raw event stream; pending-slot sub-streams are fed at the
    /// moment their value begins instead.
    fn broadcast(&mut self, event: &Event<'_>) {
        for frame in &mut self.stack {
            for active in &mut frame.nodes {
                for sub in &mut active.subs {
                    for stream in &mut sub.streams {
                        forward(stream, event);
                    }
                }
                for dep in &mut active.deps {
                    forward(&mut dep.stream, event);
                }
            }
        }
    }

    fn deposit(&mut self, results: Vec<(Owner, Result<(), ValidationError>)>) {
        let frame = self.stack.last_mut().expect("stack is never empty");
        if matches!(frame.shape, Shape::Root) {
            for (_, result) in results {
                if let Err(error) = result {
                    self.outcome = Some(Err(error));
                    return;
                }
            }
            self.outcome = Some(Ok(()));
        } else {
            frame.pending_result = Some(results);
        }
    }

    fn on_scalar(&mut self, value: &Value) {
        let schema = self.schema;
        let frame = self.stack.last_mut().expect("stack is never empty");
        let slot = match frame.pending.take() {
            Some(slot) => slot,
            None => return,
        };
        let mut results = Vec::with_capacity(slot.nodes.len());
        for (mut active, owner) in slot.nodes.into_iter().zip(slot.owners) {
            let result = if active.vacuous {
                Ok(())
            } else {
                for sub in &mut active.subs {
                    for stream in &mut sub.streams {
                        stream.value(value);
                    }
                }
                checks::check_scalar(schema.node(active.node), value)
                    .and_then(|_| fold_subs(&active, &checks::render(value)))
            };
            results.push((owner, result));
        }
        self.deposit(results);
    }

    fn on_container_start(&mut self, is_object: bool) {
        let schema = self.schema;
        let top = self.stack.last_mut().expect("stack is never empty");
        let slot = top.pending.take().unwrap_or_else(Slot::empty);
        let mut frame = Frame {
            shape: if is_object {
                Shape::Object {
                    seen: HashSet::new(),
                }
            } else {
                Shape::Array { index: 0 }
            },
            nodes: slot.nodes,
            owners: slot.owners,
            pending: None,
            pending_result: None,
            enum_accum: None,
        };
        let kind = if is_object {
            PrimitiveType::Object
        } else {
            PrimitiveType::Array
        };
        let start = if is_object {
            Event::ObjectStart
        } else {
            Event::ArrayStart
        };
        for active in &mut frame.nodes {
            if active.vacuous {
                continue;
            }
            // The slot's sub-streams have not seen this event yet.
            for sub in &mut active.subs {
                for stream in &mut sub.streams {
                    forward(stream, &start);
                }
            }
            let node = schema.node(active.node);
            if !node.allows(kind) {
                active.record(ValidationError::new(ValidationErrorKind::Type {
                    instance: kind.to_string(),
                    kind: node.type_error_kind(),
                }));
            }
            if node.common.enum_.is_some() && frame.enum_accum.is_none() {
                frame.enum_accum = Some(if is_object {
                    EnumAccum::Object(Map::new())
                } else {
                    EnumAccum::Array(Vec::new())
                });
            }
            if is_object {
                if let Some(keywords) = node.object_keywords() {
                    if let Some(dependencies) = &keywords.dependencies {
                        for (key, dependency) in dependencies {
                            if let Dependency::Node(dep_node) = dependency {
                                let mut stream =
                                    ValidationStream::new_at(schema, *dep_node, &mut Vec::new());
                                stream.object_start();
                                active.deps.push(DepCheck {
                                    key: Rc::clone(key),
                                    stream,
                                });
                            }
                        }
                    }
                }
            } else if let Some(keywords) = node.array_keywords() {
                if keywords.unique_items {
                    active.uniq = Some(UniqAccum::default());
                }
            }
        }
        if !is_object {
            frame.pending = Some(Self::item_slot(schema, &frame));
        }
        self.stack.push(frame);
    }

    /// Child schemas for the next array element: tuple position, list
    /// schema, or `additionalItems` beyond the tuple.
    fn item_slot(schema: &'s Schema, frame: &Frame<'s>) -> Slot<'s> {
        let index = match &frame.shape {
            Shape::Array { index } => *index,
            _ => return Slot::empty(),
        };
        let mut entries = Vec::new();
        for (i, active) in frame.nodes.iter().enumerate() {
            if active.vacuous || active.failure.is_some() {
                continue;
            }
            if let Some(keywords) = schema.node(active.node).array_keywords() {
                match &keywords.items {
                    None => {}
                    Some(Items::List(node)) => entries.push((*node, Owner::Node(i))),
                    Some(Items::Tuple(tuple)) => {
                        if let Some(node) = tuple.get(index) {
                            entries.push((*node, Owner::Node(i)));
                        } else if let Some(SchemaOrFlag::Node(node)) = &keywords.additional_items {
                            entries.push((*node, Owner::Node(i)));
                        }
                    }
                }
            }
        }
        Slot::build(schema, entries, &mut Vec::new())
    }

    fn on_object_key(&mut self, key: &Rc<str>) {
        let schema = self.schema;
        let frame = self.stack.last_mut().expect("stack is never empty");
        match &mut frame.shape {
            Shape::Object { seen } => {
                seen.insert(Rc::clone(key));
            }
            _ => return,
        }
        let mut entries = Vec::new();
        for (i, active) in frame.nodes.iter_mut().enumerate() {
            if active.vacuous || active.failure.is_some() {
                continue;
            }
            let node = schema.node(active.node);
            if let Some(keywords) = node.object_keywords() {
                let mut matched = false;
                if let Some(properties) = &keywords.properties {
                    if let Some((_, child)) = properties
                        .iter()
                        .find(|(name, _)| name.as_ref() == key.as_ref())
                    {
                        entries.push((*child, Owner::Node(i)));
                        matched = true;
                    }
                }
                if let Some(patterns) = &keywords.pattern_properties {
                    for pattern in patterns {
                        if pattern.pattern.is_match(key) {
                            entries.push((pattern.node, Owner::Node(i)));
                            matched = true;
                        }
                    }
                }
                if !matched {
                    match &keywords.additional_properties {
                        Some(SchemaOrFlag::Flag(false)) => {
                            active.record(ValidationError::new(
                                ValidationErrorKind::AdditionalProperties {
                                    property: key.to_string(),
                                },
                            ));
                        }
                        Some(SchemaOrFlag::Node(node)) => entries.push((*node, Owner::Node(i))),
                        _ => {}
                    }
                }
            }
        }
        frame.pending = Some(Slot::build(schema, entries, &mut Vec::new()));
    }

    fn on_object_update(&mut self, key: &Rc<str>, value: &Value) {
        let frame = self.stack.last_mut().expect("stack is never empty");
        if let Some(EnumAccum::Object(map)) = &mut frame.enum_accum {
            map.insert(Rc::clone(key), value.clone());
        }
        if let Some(results) = frame.pending_result.take() {
            for (owner, result) in results {
                if let (Owner::Node(i), Err(error)) = (owner, result) {
                    frame.nodes[i].record(error);
                }
            }
        }
        frame.pending = None;
    }

    fn on_array_append(&mut self, value: &Value) {
        let schema = self.schema;
        let frame = self.stack.last_mut().expect("stack is never empty");
        if let Some(results) = frame.pending_result.take() {
            for (owner, result) in results {
                if let (Owner::Node(i), Err(error)) = (owner, result) {
                    frame.nodes[i].record(error);
                }
            }
        }
        let index = match &frame.shape {
            Shape::Array { index } => *index,
            _ => return,
        };
        for active in frame.nodes.iter_mut() {
            if active.vacuous || active.failure.is_some() {
                continue;
            }
            let node = schema.node(active.node);
            if let Some(keywords) = node.array_keywords() {
                if let (Some(Items::Tuple(tuple)), Some(SchemaOrFlag::Flag(false))) =
                    (&keywords.items, &keywords.additional_items)
                {
                    if index >= tuple.len() {
                        active.record(ValidationError::new(
                            ValidationErrorKind::AdditionalItems { limit: tuple.len() },
                        ));
                        continue;
                    }
                }
            }
            if let Some(uniq) = &mut active.uniq {
                let hash = value_hash(value);
                if uniq.hashes.contains(&hash) && uniq.values.iter().any(|seen| seen == value) {
                    active.record(ValidationError::new(ValidationErrorKind::UniqueItems {
                        instance: checks::render(value),
                    }));
                } else {
                    uniq.hashes.insert(hash);
                    uniq.values.push(value.clone());
                }
            }
        }
        if let Some(EnumAccum::Array(items)) = &mut frame.enum_accum {
            items.push(value.clone());
        }
        if let Shape::Array { index } = &mut frame.shape {
            *index += 1;
        }
        let slot = Self::item_slot(schema, frame);
        frame.pending = Some(slot);
    }

    fn on_container_end(&mut self, is_object: bool) {
        let schema = self.schema;
        // A stray end without a matching start leaves the root frame
        // alone.
        if matches!(
            self.stack.last().map(|frame| &frame.shape),
            Some(Shape::Root) | None
        ) {
            return;
        }
        let mut frame = self.stack.pop().expect("stack is never empty");
        let enum_value = frame.enum_accum.take().map(|accum| match accum {
            EnumAccum::Array(items) => Value::Array(Rc::new(items)),
            EnumAccum::Object(map) => Value::Object(Rc::new(map)),
        });
        let instance = match &enum_value {
            Some(value) => checks::render(value),
            None => {
                if is_object {
                    "object".to_string()
                } else {
                    "array".to_string()
                }
            }
        };
        let mut results = Vec::with_capacity(frame.nodes.len());
        for (active, owner) in frame.nodes.iter_mut().zip(frame.owners.iter()) {
            let result = if active.vacuous {
                Ok(())
            } else if let Some(error) = active.failure.take() {
                Err(error)
            } else {
                Self::end_checks(schema, active, &frame.shape, enum_value.as_ref())
                    .and_then(|_| fold_subs(active, &instance))
            };
            results.push((*owner, result));
        }
        self.deposit(results);
    }

    fn end_checks(
        schema: &'s Schema,
        active: &ActiveNode<'s>,
        shape: &Shape,
        enum_value: Option<&Value>,
    ) -> Result<(), ValidationError> {
        let node = schema.node(active.node);
        match shape {
            Shape::Object { seen } => {
                if let Some(keywords) = node.object_keywords() {
                    if let Some(required) = &keywords.required {
                        for property in required {
                            if !seen.contains(property.as_ref()) {
                                return Err(ValidationError::new(ValidationErrorKind::Required {
                                    property: property.to_string(),
                                }));
                            }
                        }
                    }
                    let count = seen.len();
                    if let Some(minimum) = keywords.min_properties {
                        if (count as u64) < minimum {
                            return Err(ValidationError::new(
                                ValidationErrorKind::MinProperties {
                                    count,
                                    limit: minimum,
                                },
                            ));
                        }
                    }
                    if let Some(maximum) = keywords.max_properties {
                        if (count as u64) > maximum {
                            return Err(ValidationError::new(
                                ValidationErrorKind::MaxProperties {
                                    count,
                                    limit: maximum,
                                },
                            ));
                        }
                    }
                    if let Some(dependencies) = &keywords.dependencies {
                        for (key, dependency) in dependencies {
                            if !seen.contains(key.as_ref()) {
                                continue;
                            }
                            if let Dependency::Keys(required) = dependency {
                                for property in required {
                                    if !seen.contains(property.as_ref()) {
                                        return Err(ValidationError::new(
                                            ValidationErrorKind::Dependency {
                                                property: property.to_string(),
                                                dependency: key.to_string(),
                                            },
                                        ));
                                    }
                                }
                            }
                        }
                    }
                }
                for dep in &active.deps {
                    if seen.contains(dep.key.as_ref()) {
                        sub_result(&dep.stream)?;
                    }
                }
            }
            Shape::Array { index } => {
                if let Some(keywords) = node.array_keywords() {
                    if let Some(minimum) = keywords.min_items {
                        if (*index as u64) < minimum {
                            return Err(ValidationError::new(ValidationErrorKind::MinItems {
                                count: *index,
                                limit: minimum,
                            }));
                        }
                    }
                    if let Some(maximum) = keywords.max_items {
                        if (*index as u64) > maximum {
                            return Err(ValidationError::new(ValidationErrorKind::MaxItems {
                                count: *index,
                                limit: maximum,
                            }));
                        }
                    }
                }
            }
            Shape::Root => {}
        }
        if let Some(entries) = &node.common.enum_ {
            let value = enum_value.ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::Incomplete)
            })?;
            checks::check_enum(entries, value)?;
        }
        Ok(())
    }
}
