//! Schema discovery on disk

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extension of schema documents
pub const SCHEMA_EXTENSION: &str = "xsd";

/// All `*.xsd` files below `dir`, sorted by path
pub fn discover_schemas(dir: &Path) -> Vec<PathBuf> {
    let mut schemas: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(SCHEMA_EXTENSION))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    schemas.sort();
    schemas
}
