//! Error types shared by every glue bridge

/// Result type for host value operations
pub type GlueResult<T> = Result<T, GlueError>;

/// Errors surfaced by host values and bridge operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GlueError {
    /// Script syntax or execution error, carrying the engine message
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// An operator was applied to an instance whose class has no handler
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A script handle was used after its runtime was torn down
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Extraction of a concrete type failed
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Bad arity or missing receiver
    #[error("Argument error: {0}")]
    Argument(String),

    /// Host object is already borrowed
    #[error("Object already borrowed: {0}")]
    Borrowed(String),

    /// Host object was released before use
    #[error("Object released: {0}")]
    Released(String),
}

impl GlueError {
    /// Build a type mismatch error
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        GlueError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Whether this is a runtime error
    pub fn is_runtime(&self) -> bool {
        matches!(self, GlueError::Runtime(_))
    }

    /// Whether this is an invalid reference error
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, GlueError::InvalidReference(_))
    }
}

impl From<String> for GlueError {
    fn from(s: String) -> Self {
        GlueError::Runtime(s)
    }
}

impl From<&str> for GlueError {
    fn from(s: &str) -> Self {
        GlueError::Runtime(s.to_string())
    }
}

impl From<std::io::Error> for GlueError {
    fn from(e: std::io::Error) -> Self {
        GlueError::Runtime(e.to_string())
    }
}
