//! Reference Graph Construction
//!
//! Parses the root schema, resolves each reference to a file on disk and
//! recurses depth-first. The chain of ancestors currently being expanded is
//! kept so that cyclic references fail instead of recursing forever.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use super::{NodeId, ReferenceGraph, ReferenceNode};
use crate::error::{FileKind, GeneratorError, Result};
use crate::reference::{RawReference, SchemaDocument};

pub(crate) struct GraphBuilder {
    base_folder: PathBuf,
    active: Vec<PathBuf>,
}

impl GraphBuilder {
    pub(crate) fn new(base_folder: &Path) -> Self {
        Self {
            base_folder: base_folder.to_path_buf(),
            active: Vec::new(),
        }
    }

    pub(crate) fn build(mut self, root_file: &Path) -> Result<ReferenceGraph> {
        let candidate = if root_file.is_absolute() {
            root_file.to_path_buf()
        } else {
            self.base_folder.join(root_file)
        };
        if !candidate.is_file() {
            return Err(GeneratorError::not_found(FileKind::Schema, candidate));
        }
        let file = fs::canonicalize(&candidate)?;
        let location = root_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_file.display().to_string());

        let mut graph = ReferenceGraph::with_root(file, location);
        let root = graph.root();
        self.expand(&mut graph, root)?;
        Ok(graph)
    }

    fn expand(&mut self, graph: &mut ReferenceGraph, id: NodeId) -> Result<()> {
        let file = graph.node(id).file.clone();
        let document = SchemaDocument::read(&file)?;
        let folder = file.parent().map(Path::to_path_buf).unwrap_or_default();

        self.active.push(file);

        for reference in document.references {
            if is_remote(&reference.schema_location) {
                warn!(
                    location = %reference.schema_location,
                    "Skipping remote schema reference, only local files are resolved"
                );
                continue;
            }

            let child_file = self.resolve(&folder, &reference.schema_location)?;
            if self.active.contains(&child_file) {
                let mut chain = self.active.clone();
                chain.push(child_file);
                return Err(GeneratorError::GraphCycle { chain });
            }

            trace!(
                relation = %reference.relation,
                location = %reference.schema_location,
                file = %child_file.display(),
                "Resolved schema reference"
            );

            let RawReference { relation, schema_location, namespace } = reference;
            let child = graph.attach(
                id,
                ReferenceNode::new(child_file, schema_location, Some(relation), namespace),
            );
            self.expand(graph, child)?;
        }

        self.active.pop();
        Ok(())
    }

    fn resolve(&self, folder: &Path, location: &str) -> Result<PathBuf> {
        let local = folder.join(location);
        for candidate in [&local, &self.base_folder.join(location)] {
            if candidate.is_file() {
                return Ok(fs::canonicalize(candidate)?);
            }
        }
        Err(GeneratorError::not_found(FileKind::Reference, local))
    }
}

fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
