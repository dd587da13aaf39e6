use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Field-level messages produced when sign-in input is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [self.name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        f.write_str(&messages.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid sign-in: {0}")]
    Validation(FieldErrors),
    #[error("project {0} does not exist")]
    UnknownProject(String),
    #[error("storage file {path} is corrupted: {source}")]
    CorruptedStore {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("couldn't encode record: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
