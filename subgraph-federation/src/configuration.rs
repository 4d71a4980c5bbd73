use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/// Configuration for federation support
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Validate the extended schema before handing it out for execution; defaults to true
    pub validate: bool,

    /// Maximum number of representations a single `_entities` call accepts.
    /// If not specified, there is no limit.
    pub max_representations: Option<usize>,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder]
    pub fn new(validate: Option<bool>, max_representations: Option<usize>) -> Self {
        Self {
            validate: validate.unwrap_or(true),
            max_representations,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::builder().build()
    }
}
