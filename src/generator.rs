//! Build Orchestration
//!
//! [`Generator`] drives the compiler over a schema and everything it
//! references. The reference tree is walked bottom-up so each unit is built
//! after all of its dependencies; units that are included into their parent
//! or already have a valid episode are skipped.
//!
//! Per node: `Discovered -> SkippedIncluded | SkippedCached | Built | Failed`.
//! The first failure ends the run. Files already written stay on disk and
//! the report of the failed run, ending in its `Failed` node, is kept as
//! [`Generator::last_report`].
//!
//! Runs are sequential. Independent import subtrees could be built in
//! parallel, but two runs sharing an output directory are not guarded
//! against.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::compiler::{CompilerOutput, SchemaCompiler, XjcCommand};
use crate::episode::{self, CacheDecision, Episode};
use crate::error::{GeneratorError, Result};
use crate::graph::{NodeId, ReferenceGraph, ReferenceNode};
use crate::package::PackageResolver;
use crate::reference::RelationType;
use crate::request::{BuildRequest, Flag, DEFAULT_ENCODING};

/// Conventional suffix of a schema's binding file
pub const DEFAULT_BINDING_EXTENSION: &str = ".xjb.xml";

/// Per-run settings shared by every unit of a build
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Folder holding binding files (defaults to each schema's folder)
    pub binding_folder: Option<PathBuf>,
    pub binding_extension: String,
    /// Append the file name version token to derived packages
    pub use_filename_versions: bool,
    pub catalog: Option<PathBuf>,
    /// `None` selects [`Flag::DEFAULTS`]
    pub flags: Option<Vec<Flag>>,
    /// Package for every unit, replaces derivation
    pub package_name: Option<String>,
    /// Also collect episodes from beyond the nearest imported unit
    pub transitive_episodes: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            binding_folder: None,
            binding_extension: DEFAULT_BINDING_EXTENSION.to_string(),
            use_filename_versions: false,
            catalog: None,
            flags: None,
            package_name: None,
            transitive_episodes: false,
        }
    }
}

impl GenerateOptions {
    /// Conventional binding file of a schema; it may not exist
    pub fn binding_for(&self, schema: &Path) -> PathBuf {
        let extension = if self.binding_extension.starts_with('.') {
            self.binding_extension.clone()
        } else {
            format!(".{}", self.binding_extension)
        };
        let folder = self
            .binding_folder
            .clone()
            .or_else(|| schema.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        folder.join(format!("{}{}", crate::graph::base_name(schema), extension))
    }

    fn existing_bindings(&self, schema: &Path) -> Vec<PathBuf> {
        let binding = self.binding_for(schema);
        if binding.is_file() {
            vec![binding]
        } else {
            Vec::new()
        }
    }
}

/// Terminal state of one node in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Discovered,
    SkippedIncluded,
    SkippedCached,
    Built,
    Failed,
}

/// What happened to one node
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutcome {
    pub schema_location: String,
    pub file: PathBuf,
    pub relation: Option<RelationType>,
    pub state: NodeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<PathBuf>,
}

impl NodeOutcome {
    fn discovered(node: &ReferenceNode) -> Self {
        Self {
            schema_location: node.schema_location.clone(),
            file: node.file.clone(),
            relation: node.relation,
            state: NodeState::Discovered,
            package: None,
            episodes: Vec::new(),
        }
    }
}

/// Summary of one auto-resolve run, nodes in build order
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub invocations: usize,
    pub nodes: Vec<NodeOutcome>,
}

impl BuildReport {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            started_at: Utc::now(),
            invocations: 0,
            nodes: Vec::new(),
        }
    }

    /// The node that ended the run, if it failed
    pub fn failed(&self) -> Option<&NodeOutcome> {
        self.nodes.iter().find(|n| n.state == NodeState::Failed)
    }

    pub fn count(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state == state).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Orchestrates compiler runs into one output directory
pub struct Generator<C = XjcCommand> {
    output_dir: PathBuf,
    encoding: String,
    compiler: C,
    last_report: Option<BuildReport>,
}

impl<C: SchemaCompiler> Generator<C> {
    pub fn new(output_dir: impl Into<PathBuf>, compiler: C) -> Self {
        Self {
            output_dir: output_dir.into(),
            encoding: DEFAULT_ENCODING.to_string(),
            compiler,
            last_report: None,
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn into_compiler(self) -> C {
        self.compiler
    }

    /// Report of the most recent auto-resolve run, including failed ones
    pub fn last_report(&self) -> Option<&BuildReport> {
        self.last_report.as_ref()
    }

    /// Empty request targeting this generator's output directory
    pub fn new_request(&self, schemas: Vec<PathBuf>) -> BuildRequest {
        BuildRequest::new(&self.output_dir, schemas).with_encoding(self.encoding.clone())
    }

    /// Run the compiler once.
    ///
    /// Missing inputs are reported before the compiler is started; a
    /// nonzero exit status becomes [`GeneratorError::Compile`].
    pub fn generate(&mut self, request: BuildRequest) -> Result<CompilerOutput> {
        info!("Parsing schemas: {}", file_names(&request.schemas));
        request.validate()?;
        fs::create_dir_all(&request.output_dir)?;

        let output = self.compiler.invoke(&request)?;
        for line in output.status_lines() {
            info!("{}", line);
        }
        if !output.success() {
            return Err(GeneratorError::Compile {
                status: output.status,
                errors: output.errors(),
            });
        }

        info!("Schema generation successful");
        Ok(output)
    }

    /// Build `schema` against explicitly named dependencies, generating the
    /// episode of every dependency that does not have a valid one yet.
    pub fn generate_with_dependencies(
        &mut self,
        schema: &Path,
        dependencies: &[PathBuf],
        create_episode: bool,
        options: &GenerateOptions,
    ) -> Result<CompilerOutput> {
        info!(
            "Generating schema {} with dependencies ({})",
            schema.display(),
            file_names(dependencies)
        );

        let mut episodes = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let episode = Episode::for_schema(&self.output_dir, dependency);
            if !episode.is_valid() {
                info!(
                    "Episode for dependency {} does not exist, starting generation",
                    dependency.display()
                );
                let request = self.unit_request(dependency, options)?.creating_episode(true);
                self.generate(request)?;
            }
            episodes.push(episode.path().to_path_buf());
        }

        let request = self
            .unit_request(schema, options)?
            .with_episodes(episodes)
            .creating_episode(create_episode);
        self.generate(request)
    }

    /// Resolve the reference tree of `root_schema` and build every unit that
    /// is not included or cached, dependencies first.
    pub fn generate_auto_resolve(
        &mut self,
        root_schema: &Path,
        base_folder: &Path,
        options: &GenerateOptions,
    ) -> Result<BuildReport> {
        let graph = ReferenceGraph::build(root_schema, base_folder)?;
        trace!(base_folder = %base_folder.display(), output = %self.output_dir.display(), ?options);
        self.build_graph(&graph, options)
    }

    /// Auto-resolve several root schemas into the same output directory.
    ///
    /// References are resolved against `base_folder`, or each schema's own
    /// folder when it is `None`. A schema that another of the given schemas
    /// includes is part of that schema's unit and is not built as a root.
    pub fn generate_all(
        &mut self,
        schemas: &[PathBuf],
        base_folder: Option<&Path>,
        options: &GenerateOptions,
    ) -> Result<Vec<BuildReport>> {
        let mut graphs = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let folder = match base_folder {
                Some(folder) => folder.to_path_buf(),
                None => schema.parent().map(Path::to_path_buf).unwrap_or_default(),
            };
            graphs.push(ReferenceGraph::build(schema, &folder)?);
        }

        let included = included_files(&graphs);
        let mut reports = Vec::with_capacity(graphs.len());
        for graph in &graphs {
            let root = &graph[graph.root()];
            if included.contains(&root.file) {
                warn!(
                    schema = %root.schema_location,
                    "Ignoring schema, it is included by another schema of this run"
                );
                continue;
            }
            reports.push(self.build_graph(graph, options)?);
        }
        Ok(reports)
    }

    fn build_graph(&mut self, graph: &ReferenceGraph, options: &GenerateOptions) -> Result<BuildReport> {
        let root = graph.root();
        info!("Generating schema {} with auto resolve", graph[root].schema_location);

        debug!("Found references:");
        for line in graph.render_tree().lines() {
            debug!("{}", line);
        }

        let resolver = PackageResolver::new(options.use_filename_versions);
        let mut report = BuildReport::new(graph[root].file.clone());

        for id in graph.bottom_up(root) {
            let node = &graph[id];
            let mut outcome = NodeOutcome::discovered(node);

            match episode::check(graph, id, &self.output_dir) {
                CacheDecision::SkipIncluded => outcome.state = NodeState::SkippedIncluded,
                CacheDecision::SkipCached => {
                    info!(
                        "Episode {}.episode exists, skipping {}",
                        node.base_name(),
                        node.schema_location
                    );
                    outcome.state = NodeState::SkippedCached;
                }
                CacheDecision::Build => {
                    if let Err(e) = self.build_node(graph, id, &resolver, options, &mut outcome) {
                        error!(schema = %node.schema_location, "Build failed: {}", e);
                        outcome.state = NodeState::Failed;
                        report.nodes.push(outcome);
                        self.last_report = Some(report);
                        return Err(e);
                    }
                    outcome.state = NodeState::Built;
                    report.invocations += 1;
                }
            }

            report.nodes.push(outcome);
        }

        info!(
            built = report.count(NodeState::Built),
            cached = report.count(NodeState::SkippedCached),
            included = report.count(NodeState::SkippedIncluded),
            "Finished {}",
            graph[root].schema_location
        );
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn build_node(
        &mut self,
        graph: &ReferenceGraph,
        id: NodeId,
        resolver: &PackageResolver,
        options: &GenerateOptions,
        outcome: &mut NodeOutcome,
    ) -> Result<()> {
        let node = &graph[id];
        trace!("Building schema file {}", node.file.display());

        let package = resolver.resolve(&node.file, options.package_name.as_deref())?;
        let episodes = self.collect_episodes(graph, id, options.transitive_episodes);
        let bindings = options.existing_bindings(&node.file);

        trace!("Episodes: {}", file_names(&episodes));
        trace!("Bindings: {}", file_names(&bindings));

        outcome.package = Some(package.name());
        outcome.episodes = episodes.clone();

        let request = self
            .new_request(vec![node.file.clone()])
            .with_package(Some(package.name()))
            .with_bindings(bindings)
            .with_episodes(episodes)
            .with_catalog(options.catalog.clone())
            .with_flags(options.flags.clone())
            .creating_episode(true);
        self.generate(request)?;
        Ok(())
    }

    fn unit_request(&self, schema: &Path, options: &GenerateOptions) -> Result<BuildRequest> {
        let package = PackageResolver::new(options.use_filename_versions)
            .resolve(schema, options.package_name.as_deref())?;
        Ok(self
            .new_request(vec![schema.to_path_buf()])
            .with_package(Some(package.name()))
            .with_bindings(options.existing_bindings(schema))
            .with_catalog(options.catalog.clone())
            .with_flags(options.flags.clone()))
    }

    /// Episodes a unit is compiled against.
    ///
    /// Included children are part of the unit, so their references are
    /// searched too. An imported child contributes its own episode and the
    /// search stops there unless `transitive` is set.
    pub fn collect_episodes(&self, graph: &ReferenceGraph, id: NodeId, transitive: bool) -> Vec<PathBuf> {
        let mut episodes = Vec::new();
        self.collect_episodes_into(graph, id, transitive, &mut episodes);
        episodes
    }

    fn collect_episodes_into(
        &self,
        graph: &ReferenceGraph,
        id: NodeId,
        transitive: bool,
        episodes: &mut Vec<PathBuf>,
    ) {
        for &child in graph[id].children() {
            let node = &graph[child];
            if node.is_merged() {
                self.collect_episodes_into(graph, child, transitive, episodes);
                continue;
            }

            let episode = Episode::for_schema(&self.output_dir, &node.file);
            if episode.is_valid() {
                let path = episode.path().to_path_buf();
                if !episodes.contains(&path) {
                    episodes.push(path);
                }
            } else {
                debug!("No usable episode for {}", node.schema_location);
            }

            if transitive {
                self.collect_episodes_into(graph, child, transitive, episodes);
            }
        }
    }
}

/// Files that some graph pulls in through an include
fn included_files(graphs: &[ReferenceGraph]) -> HashSet<PathBuf> {
    graphs
        .iter()
        .flat_map(|graph| graph.top_down(graph.root()).map(move |id| &graph[id]))
        .filter(|node| node.is_merged())
        .map(|node| node.file.clone())
        .collect()
}

fn file_names(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_for_normalizes_extension() {
        let mut options = GenerateOptions::default();
        assert_eq!(
            options.binding_for(Path::new("/schemas/order_v1.xsd")),
            PathBuf::from("/schemas/order_v1.xjb.xml")
        );

        options.binding_extension = "bindings.xml".to_string();
        options.binding_folder = Some(PathBuf::from("/bindings"));
        assert_eq!(
            options.binding_for(Path::new("/schemas/order_v1.xsd")),
            PathBuf::from("/bindings/order_v1.bindings.xml")
        );
    }

    #[test]
    fn test_report_failed_node() {
        let mut report = BuildReport::new(PathBuf::from("/s/a.xsd"));
        let outcome = |location: &str, state| NodeOutcome {
            schema_location: location.to_string(),
            file: PathBuf::from("/s").join(location),
            relation: None,
            state,
            package: None,
            episodes: Vec::new(),
        };
        report.nodes.push(outcome("b.xsd", NodeState::Built));
        assert!(report.failed().is_none());

        report.nodes.push(outcome("a.xsd", NodeState::Failed));
        assert_eq!(report.failed().unwrap().schema_location, "a.xsd");
        assert_eq!(report.count(NodeState::Failed), 1);
    }

    #[test]
    fn test_file_names() {
        let paths = vec![PathBuf::from("/a/b.xsd"), PathBuf::from("c.xsd")];
        assert_eq!(file_names(&paths), "b.xsd, c.xsd");
    }
}
