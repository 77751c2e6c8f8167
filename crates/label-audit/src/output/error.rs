use std::fmt;

#[derive(Debug)]
pub enum OutputError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Io(err) => write!(f, "failed to write report: {err}"),
            OutputError::Json(err) => write!(f, "failed to encode report: {err}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(err) => Some(err),
            OutputError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for OutputError {
    fn from(value: std::io::Error) -> Self {
        OutputError::Io(value)
    }
}

impl From<serde_json::Error> for OutputError {
    fn from(value: serde_json::Error) -> Self {
        OutputError::Json(value)
    }
}
