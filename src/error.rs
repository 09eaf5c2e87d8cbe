//! Error types for schema generation

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// What kind of file was missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Schema,
    Reference,
    Binding,
    Episode,
    Catalog,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Schema => "Schema",
            FileKind::Reference => "Referenced schema",
            FileKind::Binding => "Binding",
            FileKind::Episode => "Episode",
            FileKind::Catalog => "Catalog",
        };
        f.write_str(name)
    }
}

/// Schema generation errors
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("{kind} {} does not exist", path.display())]
    NotFound { kind: FileKind, path: PathBuf },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Cyclic schema reference: {}", format_chain(chain))]
    GraphCycle { chain: Vec<PathBuf> },

    #[error("Schema compile failed with status {status}:\n{}", errors.join("\n"))]
    Compile { status: i32, errors: Vec<String> },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl GeneratorError {
    pub(crate) fn not_found(kind: FileKind, path: impl Into<PathBuf>) -> Self {
        GeneratorError::NotFound { kind, path: path.into() }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        GeneratorError::Parse { path: path.into(), message: err.to_string() }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_lists_blocks() {
        let err = GeneratorError::Compile {
            status: 1,
            errors: vec!["first".to_string(), "second\nline".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Schema compile failed with status 1"));
        assert!(msg.contains("first\nsecond\nline"));
    }

    #[test]
    fn test_cycle_error_shows_chain() {
        let err = GeneratorError::GraphCycle {
            chain: vec![PathBuf::from("/a.xsd"), PathBuf::from("/b.xsd"), PathBuf::from("/a.xsd")],
        };
        assert_eq!(err.to_string(), "Cyclic schema reference: /a.xsd -> /b.xsd -> /a.xsd");
    }
}
