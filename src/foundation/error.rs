pub type VizResult<T> = Result<T, VizError>;

/// Direction of a port referenced by a [`VizError::PortOutOfRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VizError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("pipeline cycle detected at node '{node}'")]
    PipelineCycle { node: String },

    #[error("port out of range: {node} has {available} {direction} port(s), index {index}")]
    PortOutOfRange {
        node: String,
        index: usize,
        available: usize,
        direction: PortDirection,
    },

    #[error("no override for '{class_name}' in backend '{backend}'")]
    NoOverride {
        class_name: String,
        backend: String,
    },

    #[error("resource error: {0}")]
    Resource(String),

    #[error("render context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("task cancelled")]
    TaskCancelled,

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VizError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn context_unavailable(msg: impl Into<String>) -> Self {
        Self::ContextUnavailable(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Categorical failures that abort a whole frame instead of one object or draw.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ContextUnavailable(_))
    }
}

impl From<serde_json::Error> for VizError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
