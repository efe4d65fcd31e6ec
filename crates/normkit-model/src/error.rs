use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormkitError {
    /// A composition referenced a capability that the environment does not provide.
    #[error("`{name}' unit is not defined")]
    UnitNotDefined { name: String },

    /// The `block` capability was used but the declaration supplied no block.
    #[error("`block' unit cannot be used if a block is not given")]
    BlockNotGiven,

    #[error("{0}")]
    Configuration(String),

    /// Failure reported by a requirement loader, passed through untouched.
    #[error(transparent)]
    Load(anyhow::Error),

    #[error("`{operation}' is not supported for {kind} values")]
    UnsupportedOperation {
        operation: String,
        kind: &'static str,
    },

    #[error("`{operation}': {message}")]
    InvalidArgument { operation: String, message: String },
}

impl NormkitError {
    pub fn unit_not_defined(name: impl Into<String>) -> Self {
        Self::UnitNotDefined { name: name.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_argument(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NormkitError>;
