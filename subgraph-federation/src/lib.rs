//! ## Usage
//!
//! This crate turns an [`apollo_compiler::Schema`] into an
//! [Apollo Federation v1 subgraph](https://www.apollographql.com/docs/federation/v1/federation-spec/):
//!
//! ```
//! use apollo_compiler::Schema;
//! use subgraph_federation::Federation;
//! use subgraph_federation::RootValue;
//!
//! let schema = Schema::parse(
//!     r#"
//!     type Query { me: User }
//!     type User @key(fields: "id") { id: ID! }
//!     "#,
//!     "schema.graphql",
//! )
//! .unwrap();
//!
//! let federation = Federation::default();
//! let subgraph = federation.extend_schema(&schema).unwrap();
//! assert!(subgraph.to_string().contains("union _Entity = User"));
//!
//! let root_value = federation.add_resolvers_to_root_value(RootValue::new());
//! assert!(root_value.contains_key("_service"));
//! assert!(root_value.contains_key("_entities"));
//! ```
//!
//! Executing operations is left to the caller: resolvers receive a [`ResolveInfo`] pointing at
//! the [`SubgraphSchema`] being executed.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod configuration;
pub mod error;
pub mod resolvers;
pub mod subgraph;
pub mod type_set;

pub use crate::configuration::Configuration;
pub use crate::error::FederationError;
pub use crate::resolvers::Context;
pub use crate::resolvers::Object;
pub use crate::resolvers::ResolveInfo;
pub use crate::resolvers::Resolver;
pub use crate::resolvers::RootValue;
pub use crate::resolvers::SubgraphSchema;
pub use crate::subgraph::Federation;
pub use crate::type_set::TypeSet;

const _: () = {
    const fn assert_thread_safe<T: Sync + Send>() {}

    assert_thread_safe::<Federation>();
    assert_thread_safe::<RootValue>();
    assert_thread_safe::<SubgraphSchema>();
};
