use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::validation::WithErrors;

/// Errors raised while extending a schema or resolving the federation root fields.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FederationError {
    /// The schema, or a federation fragment merged into it, could not be parsed or built.
    #[error("{message}")]
    InvalidGraphQL { message: String },

    #[error(
        "The _entities resolver tried to load an entity for type \"{type_name}\", but no object type of that name was found in the schema"
    )]
    UnknownEntityType { type_name: String },

    #[error("Invalid entity representation: {message}")]
    InvalidRepresentation { message: String },

    #[error(
        "The _entities resolver received {count} representations, more than the configured maximum of {max}"
    )]
    TooManyRepresentations { count: usize, max: usize },

    /// Raised by a user-provided resolver.
    #[error("{message}")]
    Resolver { message: String },
}

impl FederationError {
    pub fn resolver(message: impl Into<String>) -> Self {
        Self::Resolver {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_representation(message: impl Into<String>) -> Self {
        Self::InvalidRepresentation {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidGraphQL { .. } => "INVALID_GRAPHQL",
            Self::UnknownEntityType { .. } => "UNKNOWN_ENTITY_TYPE",
            Self::InvalidRepresentation { .. } => "INVALID_REPRESENTATION",
            Self::TooManyRepresentations { .. } => "TOO_MANY_REPRESENTATIONS",
            Self::Resolver { .. } => "RESOLVER_ERROR",
        }
    }
}

impl From<DiagnosticList> for FederationError {
    fn from(errors: DiagnosticList) -> Self {
        Self::InvalidGraphQL {
            message: errors.to_string(),
        }
    }
}

impl<T> From<WithErrors<T>> for FederationError {
    fn from(WithErrors { errors, .. }: WithErrors<T>) -> Self {
        errors.into()
    }
}
