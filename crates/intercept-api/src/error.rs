use thiserror::Error;

/// Errors surfaced by the interception layer.
///
/// The layer is a pass-through for failures originating below it
/// ([`InterceptError::Provider`]) and a first-class source of the other
/// two variants for failures of its own logic. Nothing is retried and
/// nothing is swallowed.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// An optional capability was probed and the backing source does not
    /// offer it.
    #[error("data source does not support {capability}")]
    UnsupportedCapability { capability: &'static str },

    /// A visitor failed while rewriting. The chain stops at the first
    /// failure; a partially rewritten tree is never executed.
    #[error("visitor '{visitor}' failed while rewriting: {reason}")]
    Visitor {
        visitor: String,
        reason: anyhow::Error,
    },

    /// The wrapped provider failed during query creation or execution.
    /// Carried verbatim; retries are the caller's business.
    #[error("backing provider failed: {reason}")]
    Provider { reason: anyhow::Error },
}

impl From<anyhow::Error> for InterceptError {
    fn from(reason: anyhow::Error) -> Self {
        InterceptError::Provider { reason }
    }
}

pub type Result<T> = std::result::Result<T, InterceptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_keep_their_message() {
        let err: InterceptError = anyhow::anyhow!("connection reset").into();
        assert!(err.to_string().contains("connection reset"));
        assert!(matches!(err, InterceptError::Provider { .. }));
    }
}
