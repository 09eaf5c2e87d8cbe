//! Build Requests
//!
//! A [`BuildRequest`] is everything one compiler run needs. It is turned into
//! the flat argument list only after every referenced file was checked, so a
//! bad request never reaches the compiler.
//!
//! Argument order:
//!
//! ```text
//! -d <out> -encoding <enc> [flags..] [-p <pkg>] [-b <binding>]* [-b <episode>]*
//!     [-episode <new episode>] [-catalog <catalog>] <schema>..
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::episode::Episode;
use crate::error::{FileKind, GeneratorError, Result};

/// Default encoding of generated sources
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Generator switches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flag {
    Extension,
    MarkGenerated,
    AutoNameResolution,
    GenerateEquals,
    GenerateHashCode,
    GenerateToString,
    /// Any other token passed through as is, must start with `-`
    Custom(String),
}

impl Flag {
    /// Used whenever the caller does not pick flags
    pub const DEFAULTS: [Flag; 2] = [Flag::Extension, Flag::AutoNameResolution];

    pub fn token(&self) -> &str {
        match self {
            Flag::Extension => "-extension",
            Flag::MarkGenerated => "-mark-generated",
            Flag::AutoNameResolution => "-XautoNameResolution",
            Flag::GenerateEquals => "-Xequals",
            Flag::GenerateHashCode => "-XhashCode",
            Flag::GenerateToString => "-XtoString",
            Flag::Custom(token) => token,
        }
    }

    pub fn defaults() -> Vec<Flag> {
        Self::DEFAULTS.to_vec()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Instruction set for one compiler run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    pub output_dir: PathBuf,
    pub encoding: String,
    pub flags: Vec<Flag>,
    pub package: Option<String>,
    pub bindings: Vec<PathBuf>,
    /// Episodes of dependencies, passed like bindings
    pub episodes: Vec<PathBuf>,
    pub catalog: Option<PathBuf>,
    /// Where to write the episode of this run
    pub create_episode: Option<PathBuf>,
    pub schemas: Vec<PathBuf>,
}

impl BuildRequest {
    pub fn new(output_dir: impl Into<PathBuf>, schemas: Vec<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            encoding: DEFAULT_ENCODING.to_string(),
            flags: Flag::defaults(),
            package: None,
            bindings: Vec::new(),
            episodes: Vec::new(),
            catalog: None,
            create_episode: None,
            schemas,
        }
    }

    pub fn with_package(mut self, package: Option<String>) -> Self {
        self.package = package;
        self
    }

    pub fn with_bindings(mut self, bindings: Vec<PathBuf>) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_episodes(mut self, episodes: Vec<PathBuf>) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_catalog(mut self, catalog: Option<PathBuf>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_flags(mut self, flags: Option<Vec<Flag>>) -> Self {
        self.flags = flags.unwrap_or_else(Flag::defaults);
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Request an episode for the first schema; one run writes one episode
    pub fn creating_episode(mut self, create: bool) -> Self {
        self.create_episode = if create {
            self.schemas
                .first()
                .map(|schema| Episode::for_schema(&self.output_dir, schema).path().to_path_buf())
        } else {
            None
        };
        self
    }

    /// Check that the request is complete and every input file exists
    pub fn validate(&self) -> Result<()> {
        if self.schemas.is_empty() {
            return Err(GeneratorError::Argument("schemas must not be empty".to_string()));
        }
        require_all(FileKind::Schema, &self.schemas)?;
        require_all(FileKind::Binding, &self.bindings)?;
        require_all(FileKind::Episode, &self.episodes)?;
        require_all(FileKind::Catalog, self.catalog.iter())?;
        Ok(())
    }

    /// Validate and flatten into compiler arguments
    pub fn to_args(&self) -> Result<Vec<String>> {
        self.validate()?;

        let mut args = Arguments::default();
        args.option("-d", path_arg(&self.output_dir))?;
        args.option("-encoding", self.encoding.clone())?;
        for flag in &self.flags {
            args.switch(flag.token())?;
        }
        if let Some(package) = &self.package {
            args.option("-p", package.clone())?;
        }
        for binding in self.bindings.iter().chain(&self.episodes) {
            args.option("-b", path_arg(binding))?;
        }
        if let Some(episode) = &self.create_episode {
            args.option("-episode", path_arg(episode))?;
        }
        if let Some(catalog) = &self.catalog {
            args.option("-catalog", path_arg(catalog))?;
        }
        for schema in &self.schemas {
            args.value(path_arg(schema));
        }
        Ok(args.into_vec())
    }
}

fn require_all<'a>(kind: FileKind, paths: impl IntoIterator<Item = &'a PathBuf>) -> Result<()> {
    match paths.into_iter().find(|p| !p.exists()) {
        Some(missing) => Err(GeneratorError::not_found(kind, missing.clone())),
        None => Ok(()),
    }
}

fn path_arg(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Flat argument list builder
#[derive(Debug, Default)]
struct Arguments {
    args: Vec<String>,
}

impl Arguments {
    fn check_key(key: &str) -> Result<()> {
        if key.len() < 2 || !key.starts_with('-') {
            return Err(GeneratorError::Argument(format!("option '{key}' must start with '-'")));
        }
        Ok(())
    }

    fn switch(&mut self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        self.args.push(key.to_string());
        Ok(())
    }

    fn option(&mut self, key: &str, value: String) -> Result<()> {
        Self::check_key(key)?;
        self.args.push(key.to_string());
        self.args.push(value);
        Ok(())
    }

    fn value(&mut self, value: String) {
        self.args.push(value);
    }

    fn into_vec(self) -> Vec<String> {
        self.args
    }
}
