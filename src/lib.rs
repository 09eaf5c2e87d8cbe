//! XSD Code Generation Orchestrator
//!
//! Drives an external schema-to-source compiler (`xjc`) over a schema and
//! everything it includes, imports or redefines, building each independent
//! unit once and reusing its episode on later runs.
//!
//! ## Features
//!
//! - **Reference Graph**: transitive include/import/redefine tree per root schema
//! - **Bottom-Up Builds**: dependencies are compiled before their dependents
//! - **Incremental**: units with a valid episode are skipped
//! - **Package Derivation**: output packages from target namespaces and file name versions
//!
//! ## Layout
//!
//! ```text
//! schemas/
//! ├── articleList_v3.xsd        imports article_v3.xsd
//! ├── articleList_v3.xjb.xml    binding picked up by name
//! └── article_v3.xsd
//! generated/
//! ├── de/alexanderwolz/...      generated sources
//! ├── article_v3.episode
//! └── articleList_v3.episode
//! ```

pub mod compiler;
pub mod config;
pub mod discover;
pub mod episode;
pub mod error;
pub mod generator;
pub mod graph;
pub mod package;
pub mod reference;
pub mod request;

pub use compiler::{CompilerOutput, SchemaCompiler, XjcCommand};
pub use config::GeneratorConfig;
pub use discover::discover_schemas;
pub use episode::{CacheDecision, Episode};
pub use error::{FileKind, GeneratorError, Result};
pub use generator::{BuildReport, GenerateOptions, Generator, NodeOutcome, NodeState};
pub use graph::{NodeId, ReferenceGraph, ReferenceNode};
pub use package::{PackageResolver, PackageSpec};
pub use reference::{RawReference, RelationType, SchemaDocument};
pub use request::{BuildRequest, Flag};
