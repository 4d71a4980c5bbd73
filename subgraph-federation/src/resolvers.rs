//! The root resolvers a federation subgraph contributes, and the small resolver model they plug
//! into.
//!
//! An execution engine drives these through a [`RootValue`]: it looks up the resolver for a root
//! field and calls it with the parent value, the field arguments, the request [`Context`] and a
//! [`ResolveInfo`] pointing at the [`SubgraphSchema`] the operation executes against.

use std::fmt;
use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::validation::Valid;
use indexmap::IndexMap;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
use serde_json_bytes::Value;

use crate::error::FederationError;
use crate::subgraph::query_type_name;
use crate::subgraph::spec::REPRESENTATIONS_ARGUMENT;
use crate::subgraph::spec::SDL_FIELD;
use crate::subgraph::spec::TYPENAME;

pub type Object = Map<ByteString, Value>;

/// A root field resolver: `(parent, arguments, context, info) -> value`.
pub type Resolver = Arc<
    dyn Fn(&Value, &Object, &Context, &ResolveInfo<'_>) -> Result<Value, FederationError>
        + Send
        + Sync,
>;

/// Resolves an entity of one object type from its representation.
pub type ReferenceResolver =
    Arc<dyn Fn(&Object, &Context, &ResolveInfo<'_>) -> Result<Value, FederationError> + Send + Sync>;

/// Root field name to resolver, in insertion order.
#[derive(Clone, Default)]
pub struct RootValue {
    resolvers: IndexMap<String, Resolver>,
}

impl RootValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver<F>(mut self, field_name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&Value, &Object, &Context, &ResolveInfo<'_>) -> Result<Value, FederationError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(field_name, Arc::new(resolver));
        self
    }

    /// Adds `resolver` under `field_name`, returning the resolver it replaced.
    pub fn insert(&mut self, field_name: impl Into<String>, resolver: Resolver) -> Option<Resolver> {
        self.resolvers.insert(field_name.into(), resolver)
    }

    pub fn get(&self, field_name: &str) -> Option<&Resolver> {
        self.resolvers.get(field_name)
    }

    pub fn contains_key(&self, field_name: &str) -> bool {
        self.resolvers.contains_key(field_name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for RootValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// Per-request values shared by every resolver of an operation.
#[derive(Clone, Debug, Default)]
pub struct Context {
    entries: Object,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<ByteString>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key, value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

/// A validated subgraph schema, together with the reference resolvers of its entity types.
#[derive(Clone)]
pub struct SubgraphSchema {
    schema: Valid<Schema>,
    reference_resolvers: IndexMap<Name, ReferenceResolver>,
}

impl SubgraphSchema {
    pub fn new(schema: Valid<Schema>) -> Self {
        Self {
            schema,
            reference_resolvers: IndexMap::default(),
        }
    }

    /// Registers how entities of `type_name` are loaded from their representation. Types without
    /// one resolve to the representation itself.
    pub fn with_reference_resolver<F>(mut self, type_name: Name, resolver: F) -> Self
    where
        F: Fn(&Object, &Context, &ResolveInfo<'_>) -> Result<Value, FederationError>
            + Send
            + Sync
            + 'static,
    {
        self.reference_resolvers.insert(type_name, Arc::new(resolver));
        self
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn reference_resolver(&self, type_name: &str) -> Option<&ReferenceResolver> {
        self.reference_resolvers.get(type_name)
    }

    /// The name of the query root type.
    pub fn query_type(&self) -> Name {
        query_type_name(&self.schema)
    }

    /// The printed SDL of the schema.
    pub fn sdl(&self) -> String {
        self.schema.to_string()
    }
}

impl fmt::Debug for SubgraphSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubgraphSchema")
            .field("reference_resolvers", &self.reference_resolvers.keys())
            .finish_non_exhaustive()
    }
}

/// What a resolver knows about the field being resolved.
#[derive(Clone, Debug)]
pub struct ResolveInfo<'a> {
    pub parent_type: Name,
    pub field_name: Name,
    pub schema: &'a SubgraphSchema,
}

impl<'a> ResolveInfo<'a> {
    pub fn new(schema: &'a SubgraphSchema, parent_type: Name, field_name: Name) -> Self {
        Self {
            parent_type,
            field_name,
            schema,
        }
    }

    /// Info for `field_name` on the query root type of `schema`.
    pub fn for_root_field(schema: &'a SubgraphSchema, field_name: Name) -> Self {
        Self::new(schema, schema.query_type(), field_name)
    }

    pub fn field_definition(&self) -> Option<&'a Component<FieldDefinition>> {
        self.schema
            .schema()
            .type_field(&self.parent_type, &self.field_name)
            .ok()
    }
}

/// `_service`: the SDL of the schema the operation executes against.
pub(crate) fn service_resolver() -> Resolver {
    Arc::new(resolve_service)
}

fn resolve_service(
    _parent: &Value,
    _args: &Object,
    _context: &Context,
    info: &ResolveInfo<'_>,
) -> Result<Value, FederationError> {
    Ok(Value::Object(Object::from_iter([(
        ByteString::from(SDL_FIELD),
        Value::String(info.schema.sdl().into()),
    )])))
}

/// `_entities`: one entity per representation, in order. The first representation that fails
/// to resolve fails the whole field.
pub(crate) fn entities_resolver(max_representations: Option<usize>) -> Resolver {
    Arc::new(
        move |_parent: &Value, args: &Object, context: &Context, info: &ResolveInfo<'_>| {
            resolve_entities(max_representations, args, context, info)
        },
    )
}

fn resolve_entities(
    max_representations: Option<usize>,
    args: &Object,
    context: &Context,
    info: &ResolveInfo<'_>,
) -> Result<Value, FederationError> {
    let representations = args
        .get(REPRESENTATIONS_ARGUMENT)
        .ok_or_else(|| {
            FederationError::invalid_representation(format!(
                "missing argument \"{REPRESENTATIONS_ARGUMENT}\""
            ))
        })?
        .as_array()
        .ok_or_else(|| {
            FederationError::invalid_representation(format!(
                "argument \"{REPRESENTATIONS_ARGUMENT}\" must be a list"
            ))
        })?;
    if let Some(max) = max_representations.filter(|max| representations.len() > *max) {
        return Err(FederationError::TooManyRepresentations {
            count: representations.len(),
            max,
        });
    }

    representations
        .iter()
        .map(|representation| resolve_entity(representation, context, info))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn resolve_entity(
    representation: &Value,
    context: &Context,
    info: &ResolveInfo<'_>,
) -> Result<Value, FederationError> {
    let representation = representation.as_object().ok_or_else(|| {
        FederationError::invalid_representation("representations must be objects")
    })?;
    let type_name = representation
        .get(TYPENAME)
        .and_then(|value| value.as_str())
        .ok_or_else(|| {
            FederationError::invalid_representation(format!(
                "representation is missing a string \"{TYPENAME}\""
            ))
        })?;

    if info.schema.schema().get_object(type_name).is_none() {
        return Err(FederationError::UnknownEntityType {
            type_name: type_name.to_owned(),
        });
    }

    match info.schema.reference_resolver(type_name) {
        Some(resolve_reference) => {
            tracing::trace!(type_name, "resolving entity reference");
            resolve_reference(representation, context, info)
        }
        None => Ok(Value::Object(representation.clone())),
    }
}
