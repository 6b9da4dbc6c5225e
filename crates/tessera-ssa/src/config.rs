/// Tracing switches, threaded through [`Program::new`](crate::Program::new).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugConfig {
    /// Log every emitted instruction at debug level.
    pub instructions: bool,
}

impl DebugConfig {
    pub fn all() -> Self {
        DebugConfig { instructions: true }
    }
}
