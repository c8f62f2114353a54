use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is not valid JSON/JSON5: {0}")]
    Parse(#[from] json5::Error),
    #[error("document root must be an object, found {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("node `{0}` has no backing entry in the document")]
    UnresolvedLabelTarget(String),
    #[error("label cannot be empty")]
    EmptyLabel,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("render surface rejected the layout: {0}")]
    SurfaceRejected(String),
    #[error("no layout is pending completion")]
    NoPendingLayout,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
