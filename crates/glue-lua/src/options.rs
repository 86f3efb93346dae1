//! State configuration

/// Options applied when a [`State`](crate::State) creates its own runtime
#[derive(Debug, Clone)]
pub struct StateOptions {
    /// Open the safe standard library at construction
    pub std_libs: bool,
    /// Allocator limit in bytes
    pub memory_limit: Option<usize>,
    /// Chunk name used by `run`
    pub chunk_name: String,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            std_libs: false,
            memory_limit: None,
            chunk_name: "glue".to_string(),
        }
    }
}

impl StateOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the standard library at construction
    pub fn with_std_libs(mut self) -> Self {
        self.std_libs = true;
        self
    }

    /// Cap the runtime's memory
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Chunk name used by `run`
    pub fn with_chunk_name(mut self, name: impl Into<String>) -> Self {
        self.chunk_name = name.into();
        self
    }
}
