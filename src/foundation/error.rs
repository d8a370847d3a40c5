/// Convenience result type used across spromoji.
pub type SpromojiResult<T> = Result<T, SpromojiError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Degenerate geometry has no variant: zero-area triangles are skipped
/// while rendering and only show up in [`crate::RenderStats`].
#[derive(thiserror::Error, Debug)]
pub enum SpromojiError {
    /// A rig could not be fetched, parsed, or validated.
    #[error("rig load error: {0}")]
    RigLoad(String),

    /// Caller-supplied data violates an operation's preconditions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every rig-acquisition path failed; the engine cannot render.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpromojiError {
    /// Build a [`SpromojiError::RigLoad`] value.
    pub fn rig_load(msg: impl Into<String>) -> Self {
        Self::RigLoad(msg.into())
    }

    /// Build a [`SpromojiError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`SpromojiError::Initialization`] value.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Build a [`SpromojiError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
