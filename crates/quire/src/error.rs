use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error while {action} {path}: {source}")]
    IoAt {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {message}")]
    TomlParse { path: PathBuf, message: String },

    #[error("JSON parse error in {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    #[error("Could not serialize {path}: {message}")]
    Serialize { path: PathBuf, message: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Navigation outline not found: {path}")]
    SummaryNotFound { path: PathBuf },

    #[error("Template file not found: {path}")]
    TemplateNotFound { path: PathBuf },

    #[error("Unknown post-processor '{name}' (available: {available})")]
    UnknownPostProcessor { name: String, available: String },

    #[error("Directory walk error in {path}: {message}")]
    WalkDir { path: PathBuf, message: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    #[error("{name} failed: {message}")]
    Collaborator { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, QuireError>;

pub trait IoContext<T> {
    fn io_context(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, action: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| QuireError::IoAt {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_context_keeps_path_and_action() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let error = result
            .io_context("reading", Path::new("guide/intro.md"))
            .unwrap_err();

        let message = error.to_string();
        assert!(message.contains("reading"));
        assert!(message.contains("guide/intro.md"));
        assert!(message.contains("gone"));
    }
}
