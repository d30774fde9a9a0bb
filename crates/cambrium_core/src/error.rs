//! Error types for cambrium_core.
//!
//! Validation failures surface immediately as typed errors; no partial
//! generation is ever returned alongside one.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug)]
pub enum GenesisError {
    /// A generation request arrived without a seed
    #[error("Seed unavailable: generation requires an explicit seed")]
    SeedUnavailable,

    /// Mutation referenced a trait that no loaded category defines
    #[error("Unknown trait: {0}")]
    UnknownTrait(String),

    /// Generation or mutation referenced an undefined category
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Allocated counts did not sum to the requested total
    #[error("Allocation invariant violated: expected {expected}, got {actual}")]
    AllocationInvariantViolation { expected: u64, actual: u64 },

    /// Formation lookup miss
    #[error("Formation pattern not found: {0}")]
    PatternNotFound(String),

    /// Cache capacity misconfigured
    #[error("Cache eviction failure: {0}")]
    CacheEvictionFailure(String),

    /// Caller supplied arguments the engine cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Block hash was not valid hex
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<GenesisError>,
    },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, GenesisError>;

impl GenesisError {
    #[must_use]
    pub fn unknown_trait<S: Into<String>>(key: S) -> Self {
        Self::UnknownTrait(key.into())
    }

    #[must_use]
    pub fn unknown_category<S: Into<String>>(name: S) -> Self {
        Self::UnknownCategory(name.into())
    }

    #[must_use]
    pub fn pattern_not_found<S: Into<String>>(id: S) -> Self {
        Self::PatternNotFound(id.into())
    }

    #[must_use]
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Cache misses are expected; everything else is a caller or engine fault.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::PatternNotFound(_) => true,
            Self::Context { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}
