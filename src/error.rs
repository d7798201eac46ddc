use thiserror::Error;

/// The rule tables themselves are broken or do not cover a value.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no modifier for key '{key}' in table '{table}'")]
    MissingKey { key: String, table: String },

    #[error("modifier at '{table}' is not a number")]
    NotNumeric { table: String },

    #[error("'{table}' is a single modifier and cannot be searched for '{key}'")]
    NotATable { key: String, table: String },

    #[error("value '{value}' must wrap exactly one key to search table '{table}'")]
    AmbiguousValue { value: String, table: String },

    #[error("modifier table root must be a mapping")]
    NotAMapping,

    #[error("unable to read modifier table '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse modifier table: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// An authored ability breaks one of the authoring invariants.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Ability('{ability}') {message} (properties: {properties})")]
pub struct ValidationError {
    pub ability: String,
    pub message: String,
    /// Inline rendering of the normalized properties at the time of failure.
    pub properties: String,
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Ability('{ability}') nests sub-effects deeper than {limit} levels")]
    NestingTooDeep { ability: String, limit: usize },
}

impl EvaluationError {
    /// Message of the underlying validation failure, if this is one.
    pub fn validation_message(&self) -> Option<&str> {
        match self {
            Self::Invalid(err) => Some(err.message.as_str()),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
