use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No free {category} spots left")]
    CapacityExceeded { category: &'static str },

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Rendering error: {0}")]
    Rendering(String),
}

impl DomainError {
    /// Durable-store failures are logged at the call site and never undo
    /// an in-memory mutation that already happened.
    pub fn is_persistence(&self) -> bool {
        matches!(self, DomainError::Persistence(_))
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<InfraError> for DomainError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Render(msg) => DomainError::Rendering(msg),
            other => DomainError::Persistence(other.to_string()),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infra_errors_become_persistence_failures() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: DomainError = InfraError::from(io).into();
        assert!(err.is_persistence());
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn render_failures_keep_their_kind() {
        let err: DomainError = InfraError::Render("bad payload".into()).into();
        assert!(matches!(err, DomainError::Rendering(ref m) if m == "bad payload"));
        assert!(!err.is_persistence());
    }

    #[test]
    fn capacity_message_names_category() {
        let err = DomainError::CapacityExceeded {
            category: "accessible",
        };
        assert_eq!(err.to_string(), "No free accessible spots left");
        assert!(!err.is_persistence());
    }
}
