//! Episode Artifacts
//!
//! An episode is written by the code generator next to its output and
//! records the classes generated for one schema unit. Its presence lets
//! dependents bind against the already generated types instead of
//! regenerating them, which is what makes repeated runs incremental.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::{base_name, NodeId, ReferenceGraph};

/// File extension of episode artifacts
pub const EPISODE_EXTENSION: &str = "episode";

/// Episode file for one schema unit: `{output_dir}/{schema_base_name}.episode`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    path: PathBuf,
}

impl Episode {
    pub fn for_schema(output_dir: &Path, schema_file: &Path) -> Self {
        Self {
            path: output_dir.join(format!("{}.{}", base_name(schema_file), EPISODE_EXTENSION)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// A usable episode is non-empty and has at least two `bindings`
    /// elements. The generator writes a lone outer `bindings` element for
    /// units that produced nothing, which must not count as cached.
    pub fn is_valid(&self) -> bool {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {}
            _ => return false,
        }
        match fs::read_to_string(&self.path) {
            Ok(content) => count_bindings(&content) >= 2,
            Err(e) => {
                warn!(episode = %self.path.display(), error = %e, "Could not read episode");
                false
            }
        }
    }
}

fn count_bindings(content: &str) -> usize {
    let mut reader = Reader::from_str(content);
    let mut count = 0;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"bindings" {
                    count += 1;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // Truncated output still counts what was written
            Err(_) => break,
        }
    }
    count
}

/// Outcome of the cache check for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDecision {
    /// Needs an independent compiler run
    Build,
    /// Included into its parent's unit, never built on its own
    SkipIncluded,
    /// A valid episode already exists
    SkipCached,
}

impl CacheDecision {
    pub fn is_buildable(self) -> bool {
        matches!(self, CacheDecision::Build)
    }
}

/// Decide whether a node must be built, given the output directory
pub fn check(graph: &ReferenceGraph, id: NodeId, output_dir: &Path) -> CacheDecision {
    let node = graph.node(id);
    if node.is_merged() {
        warn!(
            schema = %node.schema_location,
            parent = %node.parent().map(|p| graph.node(p).schema_location.as_str()).unwrap_or("-"),
            "Ignoring schema, it is included by its parent"
        );
        return CacheDecision::SkipIncluded;
    }

    let episode = Episode::for_schema(output_dir, &node.file);
    if episode.is_valid() {
        return CacheDecision::SkipCached;
    }
    if episode.exists() {
        debug!(episode = %episode.path().display(), "Episode is empty or incomplete, rebuilding");
    }
    CacheDecision::Build
}
