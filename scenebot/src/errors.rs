use thiserror::Error;

#[derive(Error, Debug)]
pub enum RobotError {
    #[error("Target not found: {target}: {source}")]
    TargetNotFound {
        target: String,
        #[source]
        source: Box<RobotError>,
    },

    #[error("No matching nodes were found: {0}")]
    NoNodesFound(String),

    #[error("Matching nodes were found, but none of them are visible: {0}")]
    NoVisibleNodesFound(String),

    #[error("Window not found: {0}")]
    WindowNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Node is detached from the scene graph: {0}")]
    NodeDetached(String),

    #[error("Node type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RobotError {
    /// True for the two "lookup came back empty" failures of the node finder.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            RobotError::NoNodesFound(_) | RobotError::NoVisibleNodesFound(_)
        )
    }
}
