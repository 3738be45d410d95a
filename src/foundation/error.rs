/// Convenience result type used across Tessera.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Top-level error taxonomy used by engine APIs.
///
/// A request-propagation or render pass that returns [`TesseraError::Aborted`]
/// was interrupted through the abort flag and may be retried; any other error
/// means the pass failed and its partial results must be discarded.
#[derive(thiserror::Error, Debug)]
pub enum TesseraError {
    /// Invalid user-provided data (degenerate rectangles, bad graph wiring).
    #[error("validation error: {0}")]
    Validation(String),

    /// Fatal failure while propagating region-of-interest requests.
    #[error("propagation error: {0}")]
    Propagation(String),

    /// Fatal failure while rendering a node.
    #[error("render error: {0}")]
    Render(String),

    /// The render was cancelled through the abort flag.
    #[error("render aborted")]
    Aborted,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesseraError {
    /// Build a [`TesseraError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TesseraError::Propagation`] value.
    pub fn propagation(msg: impl Into<String>) -> Self {
        Self::Propagation(msg.into())
    }

    /// Build a [`TesseraError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// True for [`TesseraError::Aborted`], letting callers distinguish
    /// "interrupted" from "broken".
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
