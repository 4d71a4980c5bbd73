use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::schema::ComponentOrigin;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use itertools::Itertools;

use crate::configuration::Configuration;
use crate::error::FederationError;
use crate::resolvers::RootValue;
use crate::resolvers::SubgraphSchema;
use crate::resolvers::entities_resolver;
use crate::resolvers::service_resolver;
use crate::subgraph::spec::DEFAULT_QUERY_TYPE;
use crate::subgraph::spec::ENTITIES_QUERY;
use crate::subgraph::spec::ENTITIES_SOURCE;
use crate::subgraph::spec::FEDERATION_SOURCE;
use crate::subgraph::spec::KEY_DIRECTIVE_NAME;
use crate::subgraph::spec::SERVICE_SDL_QUERY;
use crate::subgraph::spec::entities_sdl;
use crate::subgraph::spec::federation_sdl;
use crate::type_set::TypeSet;

pub mod spec;

/// Turns a plain schema into a federation v1 subgraph.
///
/// ```text
///   extend_schema:  schema ──► + federation definitions ──► + entity definitions (if any @key)
///   add_resolvers_to_root_value:  root value ──► + _service, _entities
/// ```
#[derive(Clone, Debug, Default)]
pub struct Federation {
    config: Configuration,
}

impl Federation {
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Returns a copy of `schema` extended with the federation directives, `_FieldSet`,
    /// `_Service` and `_service`, plus `_Any`, `_Entity` and `_entities` when the schema
    /// declares at least one entity.
    pub fn extend_schema(&self, schema: &Schema) -> Result<Schema, FederationError> {
        let query_type = query_type_name(schema);
        let schema = merge_sdl(
            schema,
            &query_type,
            &federation_sdl(&query_type),
            FEDERATION_SOURCE,
        )?;
        self.extend_schema_with_entities(schema, &query_type)
    }

    fn extend_schema_with_entities(
        &self,
        schema: Schema,
        query_type: &Name,
    ) -> Result<Schema, FederationError> {
        let entities = entities(&schema);
        if !entities.has_types() {
            tracing::debug!("no @key object types, skipping _entities");
            return Ok(schema);
        }

        let entity_members = entities.type_names().iter().join(" | ");
        tracing::debug!(entities = %entity_members, "adding _Entity union");
        merge_sdl(
            &schema,
            query_type,
            &entities_sdl(query_type, &entity_members),
            ENTITIES_SOURCE,
        )
    }

    /// Returns `root_value` with the `_service` and `_entities` resolvers added. Existing entries
    /// under those two names are replaced.
    pub fn add_resolvers_to_root_value(&self, mut root_value: RootValue) -> RootValue {
        root_value.insert(SERVICE_SDL_QUERY.to_string(), service_resolver());
        root_value.insert(
            ENTITIES_QUERY.to_string(),
            entities_resolver(self.config.max_representations),
        );
        root_value
    }

    /// Extends `schema` and prepares it for execution.
    pub fn build_subgraph(&self, schema: &Schema) -> Result<SubgraphSchema, FederationError> {
        let schema = self.extend_schema(schema)?;
        let schema = if self.config.validate {
            schema.validate()?
        } else {
            Valid::assume_valid(schema)
        };
        Ok(SubgraphSchema::new(schema))
    }
}

/// The object types of `schema` that carry a `@key` directive, in type map order.
pub fn entities(schema: &Schema) -> TypeSet<'_> {
    TypeSet::from_schema(schema)
        .filter(|ty| matches!(ty, ExtendedType::Object(_)))
        .filter(|ty| !ty.is_built_in())
        .filter(|ty| {
            has_key_directive(ty.directives().iter().map(|directive| directive.name.as_str()))
        })
}

/// Whether any of `directive_names` is `key`. Order and duplicates don't matter.
pub fn has_key_directive<'a>(directive_names: impl IntoIterator<Item = &'a str>) -> bool {
    directive_names
        .into_iter()
        .any(|name| name == KEY_DIRECTIVE_NAME.as_str())
}

/// The declared query root type, or `Query` when the schema has none.
pub(crate) fn query_type_name(schema: &Schema) -> Name {
    schema
        .schema_definition
        .query
        .as_ref()
        .map(|query| query.name.clone())
        .unwrap_or(DEFAULT_QUERY_TYPE)
}

/// Parses `sdl` and merges the definitions `schema` doesn't have yet into a new schema.
fn merge_sdl(
    schema: &Schema,
    query_type: &Name,
    sdl: &str,
    source: &str,
) -> Result<Schema, FederationError> {
    let mut document = ast::Document::parse(sdl, source)?;
    let added_root_fields = retain_missing_definitions(&mut document, schema)?;
    tracing::debug!(
        source,
        definitions = document.definitions.len(),
        "merging federation definitions"
    );

    let mut merged = Schema::builder()
        .adopt_orphan_extensions()
        .parse(schema.to_string(), "schema.graphql")
        .add_ast(&document)
        .build()?;
    fold_root_fields(&mut merged, query_type, &added_root_fields);
    adopt_query_root(&mut merged, query_type);
    Ok(merged)
}

/// Makes `query_type` the query root of a schema that declares a `schema` block without one.
fn adopt_query_root(schema: &mut Schema, query_type: &Name) {
    if schema.schema_definition.query.is_some() || schema.get_object(query_type).is_none() {
        return;
    }
    tracing::debug!(query_type = %query_type, "declaring the query root");
    schema.schema_definition.make_mut().query = Some(ComponentName {
        origin: ComponentOrigin::Definition,
        name: query_type.clone(),
    });
}

/// Drops the definitions of `document` that already exist in `schema`, and returns the names of
/// the fields that `document` still adds to an existing or new type through `extend type`.
///
/// An existing definition only counts when it matches the federation one: a directive with other
/// arguments, a type of another kind or a root field of another type is an error.
fn retain_missing_definitions(
    document: &mut ast::Document,
    schema: &Schema,
) -> Result<Vec<Name>, FederationError> {
    if let Some(message) = document
        .definitions
        .iter()
        .find_map(|definition| conflicting_definition(definition, schema))
    {
        return Err(FederationError::InvalidGraphQL { message });
    }

    let mut added_fields = Vec::new();
    document.definitions.retain_mut(|definition| match definition {
        ast::Definition::DirectiveDefinition(directive) => {
            !schema.directive_definitions.contains_key(&directive.name)
        }
        ast::Definition::ScalarTypeDefinition(scalar) => !schema.types.contains_key(&scalar.name),
        ast::Definition::ObjectTypeDefinition(object) => !schema.types.contains_key(&object.name),
        ast::Definition::UnionTypeDefinition(union_) => !schema.types.contains_key(&union_.name),
        ast::Definition::ObjectTypeExtension(extension) => {
            let existing = schema.get_object(&extension.name);
            let extension = extension.make_mut();
            extension.fields.retain(|field| {
                existing.is_none_or(|object| !object.fields.contains_key(&field.name))
            });
            added_fields.extend(extension.fields.iter().map(|field| field.name.clone()));
            !extension.fields.is_empty()
        }
        _ => true,
    });
    Ok(added_fields)
}

/// Describes how `schema` contradicts `definition`, if it already defines the same name differently.
fn conflicting_definition(definition: &ast::Definition, schema: &Schema) -> Option<String> {
    match definition {
        ast::Definition::DirectiveDefinition(directive) => {
            let existing = schema.directive_definitions.get(&directive.name)?;
            (!same_arguments(&existing.arguments, &directive.arguments)).then(|| {
                format!(
                    "directive @{} is already defined with arguments that differ from federation's @{}",
                    directive.name, directive.name
                )
            })
        }
        ast::Definition::ScalarTypeDefinition(scalar) => {
            let existing = schema.types.get(&scalar.name)?;
            (!matches!(existing, ExtendedType::Scalar(_)))
                .then(|| format!("type {} is already defined, but federation requires a scalar", scalar.name))
        }
        ast::Definition::ObjectTypeDefinition(object) => {
            let existing = schema.types.get(&object.name)?;
            (!matches!(existing, ExtendedType::Object(_))).then(|| {
                format!("type {} is already defined, but federation requires an object type", object.name)
            })
        }
        ast::Definition::UnionTypeDefinition(union_) => {
            let existing = schema.types.get(&union_.name)?;
            (!matches!(existing, ExtendedType::Union(_)))
                .then(|| format!("type {} is already defined, but federation requires a union", union_.name))
        }
        ast::Definition::ObjectTypeExtension(extension) => {
            let existing = schema.get_object(&extension.name)?;
            extension.fields.iter().find_map(|field| {
                let existing_field = existing.fields.get(&field.name)?;
                if existing_field.ty != field.ty {
                    return Some(format!(
                        "field {}.{} is already defined as `{}`, but federation requires `{}`",
                        extension.name, field.name, existing_field.ty, field.ty
                    ));
                }
                (!same_arguments(&existing_field.arguments, &field.arguments)).then(|| {
                    format!(
                        "field {}.{} is already defined with arguments that differ from federation's {}",
                        extension.name, field.name, field.name
                    )
                })
            })
        }
        _ => None,
    }
}

fn same_arguments(
    existing: &[Node<ast::InputValueDefinition>],
    expected: &[Node<ast::InputValueDefinition>],
) -> bool {
    existing.len() == expected.len()
        && existing
            .iter()
            .zip(expected)
            .all(|(existing, expected)| existing.name == expected.name && existing.ty == expected.ty)
}

/// Moves the given root fields from their `extend type` block into the query type's definition.
fn fold_root_fields(schema: &mut Schema, query_type: &Name, fields: &[Name]) {
    if fields.is_empty() {
        return;
    }
    if let Some(ExtendedType::Object(object)) = schema.types.get_mut(query_type) {
        let object = object.make_mut();
        for name in fields {
            if let Some(field) = object.fields.get_mut(name) {
                field.origin = ComponentOrigin::Definition;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    fn extend(sdl: &str) -> Schema {
        let schema = Schema::parse(sdl, "schema.graphql").expect("valid schema");
        Federation::default()
            .extend_schema(&schema)
            .expect("extended schema")
    }

    #[test]
    fn key_directive_predicate_only_looks_for_presence() {
        assert!(has_key_directive(["key"]));
        assert!(has_key_directive(["tag", "key", "key"]));
        assert!(!has_key_directive(["keys", "extends"]));
        assert!(!has_key_directive(std::iter::empty()));
    }

    #[test]
    fn entities_are_keyed_object_types_in_declaration_order() {
        let schema = Schema::parse(
            r#"
            type Query { a: A }
            type C @key(fields: "id") { id: ID! }
            type B { id: ID! }
            type A @key(fields: "id") { id: ID! }
            interface I @key(fields: "id") { id: ID! }
            "#,
            "schema.graphql",
        )
        .expect("valid schema");

        assert_eq!(entities(&schema).type_names(), [name!("C"), name!("A")]);
    }

    #[test]
    fn key_on_a_type_extension_makes_an_entity() {
        let schema = Schema::parse(
            r#"
            type Query { a: A }
            type A { id: ID! }
            extend type A @key(fields: "id")
            "#,
            "schema.graphql",
        )
        .expect("valid schema");

        assert_eq!(entities(&schema).type_names(), [name!("A")]);
    }

    #[test]
    fn uses_the_declared_query_root() {
        let schema = extend(
            r#"
            schema { query: RootQuery }
            type RootQuery { a: A }
            type A @key(fields: "id") { id: ID! }
            "#,
        );

        let root = schema.get_object("RootQuery").expect("root query type");
        assert!(root.fields.contains_key("_service"));
        assert!(root.fields.contains_key("_entities"));
        assert!(schema.get_object("Query").is_none());
    }

    #[test]
    fn creates_a_query_type_when_there_is_none() {
        let schema = extend(r#"type A @key(fields: "id") { id: ID! }"#);

        let query = schema.get_object("Query").expect("query type");
        assert_eq!(
            query.fields.keys().map(Name::as_str).collect::<Vec<_>>(),
            ["_service", "_entities"]
        );
    }

    #[test]
    fn declares_the_query_root_when_the_schema_block_has_none() {
        let schema = Schema::parse(
            r#"
            schema { mutation: M }
            type M { a: Int }
            type A @key(fields: "id") { id: ID! }
            "#,
            "schema.graphql",
        )
        .expect("valid schema");
        let federation = Federation::default();

        let extended = federation.extend_schema(&schema).expect("extended schema");
        let roots = &extended.schema_definition;
        assert_eq!(roots.query.as_ref().map(|root| root.name.as_str()), Some("Query"));
        assert_eq!(roots.mutation.as_ref().map(|root| root.name.as_str()), Some("M"));

        let subgraph = federation.build_subgraph(&schema).expect("valid subgraph");
        assert_eq!(subgraph.query_type(), name!("Query"));
    }

    #[test]
    fn root_field_with_another_type_is_rejected() {
        let schema = Schema::parse("type Query { _service: String }", "schema.graphql").unwrap();

        let error = Federation::default()
            .extend_schema(&schema)
            .expect_err("conflicting _service");
        assert!(matches!(error, FederationError::InvalidGraphQL { .. }));
        assert_eq!(
            error.to_string(),
            "field Query._service is already defined as `String`, but federation requires `_Service!`"
        );
    }

    #[test]
    fn entities_field_with_other_arguments_is_rejected() {
        let schema = Schema::parse(
            r#"
            scalar _Any
            union _Entity = A
            type Query { _entities(keys: [_Any!]!): [_Entity]! }
            type A @key(fields: "id") { id: ID! }
            "#,
            "schema.graphql",
        )
        .unwrap();

        let error = Federation::default()
            .extend_schema(&schema)
            .expect_err("conflicting _entities");
        assert!(error.to_string().contains("Query._entities"));
    }

    #[test]
    fn directive_with_another_signature_is_rejected() {
        let schema = Schema::parse(
            r#"
            directive @key(fields: String!) on OBJECT
            type Query { a: String }
            "#,
            "schema.graphql",
        )
        .unwrap();

        let error = Federation::default()
            .extend_schema(&schema)
            .expect_err("conflicting @key");
        assert_eq!(error.code(), "INVALID_GRAPHQL");
        assert!(error.to_string().starts_with("directive @key is already defined"));
    }

    #[test]
    fn federation_type_of_another_kind_is_rejected() {
        let schema = Schema::parse(
            "type Query { a: String }\ntype _FieldSet { fields: String }",
            "schema.graphql",
        )
        .unwrap();

        let error = Federation::default()
            .extend_schema(&schema)
            .expect_err("_FieldSet is not a scalar");
        assert!(error.to_string().contains("_FieldSet"));
    }

    #[test]
    fn existing_federation_definitions_are_not_duplicated() {
        let schema = extend(
            r#"
            scalar _FieldSet
            directive @key(fields: _FieldSet!) on OBJECT | INTERFACE
            type Query { a: A }
            type A @key(fields: "id") { id: ID! }
            "#,
        );

        assert!(schema.directive_definitions.contains_key("key"));
        assert!(schema.directive_definitions.contains_key("external"));
        assert!(schema.types.contains_key("_FieldSet"));
        assert!(schema.types.contains_key("_Entity"));
    }

    #[test]
    fn extending_twice_is_a_no_op() {
        let once = extend(
            r#"
            type Query { a: A }
            type A @key(fields: "id") { id: ID! }
            "#,
        );
        let twice = Federation::default()
            .extend_schema(&once)
            .expect("extended schema");

        pretty_assertions::assert_eq!(once.to_string(), twice.to_string());
    }

    #[test]
    fn root_fields_are_printed_inside_the_query_type() {
        let schema = extend("type Query { echo(message: String): String }");

        let sdl = schema.to_string();
        assert!(sdl.contains("type Query {\n  echo(message: String): String\n  _service: _Service!\n}"));
        assert!(!sdl.contains("extend type Query"));
    }

    #[test]
    fn user_extensions_are_kept() {
        let schema = extend(
            r#"
            type Query { echo: String }
            extend type Query { other: String }
            "#,
        );

        assert!(schema.to_string().contains("extend type Query {\n  other: String\n}"));
    }

    #[test]
    fn definitions_already_in_the_schema_are_dropped() {
        let schema = Schema::parse("type Query { a: String }", "schema.graphql").unwrap();
        let mut document =
            ast::Document::parse("scalar String\nscalar _Any", "test.graphql").unwrap();

        assert!(retain_missing_definitions(&mut document, &schema).unwrap().is_empty());
        assert_eq!(document.definitions.len(), 1);
    }

    #[test]
    fn malformed_fragment_is_reported() {
        let schema = Schema::parse("type Query { a: String }", "schema.graphql").unwrap();

        let error = merge_sdl(&schema, &DEFAULT_QUERY_TYPE, "type Broken {", "broken.graphql")
            .expect_err("unterminated type");
        assert!(matches!(error, FederationError::InvalidGraphQL { .. }));
    }
}
