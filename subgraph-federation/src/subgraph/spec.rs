use apollo_compiler::Name;
use apollo_compiler::name;

pub const FIELDSET_SCALAR_NAME: Name = name!("_FieldSet");
pub const ANY_SCALAR_NAME: Name = name!("_Any");
pub const ENTITY_UNION_NAME: Name = name!("_Entity");
pub const SERVICE_TYPE: Name = name!("_Service");

pub const SERVICE_SDL_QUERY: Name = name!("_service");
pub const ENTITIES_QUERY: Name = name!("_entities");
pub const REPRESENTATIONS_ARGUMENT: &str = "representations";
pub const SDL_FIELD: &str = "sdl";
pub const TYPENAME: &str = "__typename";

pub const KEY_DIRECTIVE_NAME: Name = name!("key");
pub const EXTENDS_DIRECTIVE_NAME: Name = name!("extends");
pub const EXTERNAL_DIRECTIVE_NAME: Name = name!("external");
pub const PROVIDES_DIRECTIVE_NAME: Name = name!("provides");
pub const REQUIRES_DIRECTIVE_NAME: Name = name!("requires");

pub const DEFAULT_QUERY_TYPE: Name = name!("Query");

pub(crate) const FEDERATION_SOURCE: &str = "federation.graphql";
pub(crate) const ENTITIES_SOURCE: &str = "federation_entities.graphql";

/// The definitions every federation v1 subgraph exposes, with `_service` added to `query_type`.
pub(crate) fn federation_sdl(query_type: &Name) -> String {
    format!(
        r#"scalar {FIELDSET_SCALAR_NAME}

type {SERVICE_TYPE} {{
  {SDL_FIELD}: String
}}

extend type {query_type} {{
  {SERVICE_SDL_QUERY}: {SERVICE_TYPE}!
}}

directive @{EXTERNAL_DIRECTIVE_NAME} on FIELD_DEFINITION
directive @{REQUIRES_DIRECTIVE_NAME}(fields: {FIELDSET_SCALAR_NAME}!) on FIELD_DEFINITION
directive @{PROVIDES_DIRECTIVE_NAME}(fields: {FIELDSET_SCALAR_NAME}!) on FIELD_DEFINITION
directive @{KEY_DIRECTIVE_NAME}(fields: {FIELDSET_SCALAR_NAME}!) on OBJECT | INTERFACE

directive @{EXTENDS_DIRECTIVE_NAME} on OBJECT | INTERFACE
"#
    )
}

/// `_Any`, the `_Entity` union over `entity_members` (already joined with ` | `) and
/// `_entities` on `query_type`.
pub(crate) fn entities_sdl(query_type: &Name, entity_members: &str) -> String {
    format!(
        r#"scalar {ANY_SCALAR_NAME}

union {ENTITY_UNION_NAME} = {entity_members}

extend type {query_type} {{
  {ENTITIES_QUERY}({REPRESENTATIONS_ARGUMENT}: [{ANY_SCALAR_NAME}!]!): [{ENTITY_UNION_NAME}]!
}}
"#
    )
}
