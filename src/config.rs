//! Configuration management for the schema generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (xsdgen.toml)
//! - Environment variables (XSDGEN__*)
//!
//! ## Example config file (xsdgen.toml):
//! ```toml
//! [output]
//! dir = "build/generated-sources/xjc"
//! encoding = "UTF-8"
//!
//! [schemas]
//! folder = "src/main/resources/schemas"
//! binding_extension = ".xjb.xml"
//! use_filename_versions = true
//!
//! [compiler]
//! program = "xjc"
//! flags = ["extension", "auto-name-resolution", "generate-to-string"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::compiler::XjcCommand;
use crate::generator::{GenerateOptions, DEFAULT_BINDING_EXTENSION};
use crate::request::{Flag, DEFAULT_ENCODING};

/// Main configuration for the generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Schema lookup and package settings
    #[serde(default)]
    pub schemas: SchemasConfig,

    /// External compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving generated sources and episodes
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Encoding of generated sources
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// Schema configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemasConfig {
    /// Base folder for resolving schema references
    #[serde(default)]
    pub folder: Option<PathBuf>,

    /// Folder holding binding files (defaults to the schema's folder)
    #[serde(default)]
    pub binding_folder: Option<PathBuf>,

    /// Suffix of binding files next to their schema
    #[serde(default = "default_binding_extension")]
    pub binding_extension: String,

    /// Append the version token of the file name to derived packages
    #[serde(default)]
    pub use_filename_versions: bool,

    /// XML catalog passed to the compiler
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Package for all generated units
    #[serde(default)]
    pub package_name: Option<String>,

    /// Collect dependency episodes through imported units
    #[serde(default)]
    pub transitive_episodes: bool,
}

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Executable to run
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Working directory of the compiler process
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Compiler switches
    #[serde(default = "Flag::defaults")]
    pub flags: Vec<Flag>,
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

fn default_binding_extension() -> String {
    DEFAULT_BINDING_EXTENSION.to_string()
}

fn default_program() -> PathBuf {
    PathBuf::from("xjc")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            encoding: default_encoding(),
        }
    }
}

impl Default for SchemasConfig {
    fn default() -> Self {
        Self {
            folder: None,
            binding_folder: None,
            binding_extension: default_binding_extension(),
            use_filename_versions: false,
            catalog: None,
            package_name: None,
            transitive_episodes: false,
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            working_dir: None,
            flags: Flag::defaults(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with an explicit file taking precedence
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["xsdgen.toml", ".xsdgen.toml", "config/xsdgen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("de", "alexanderwolz", "xsdgen") {
            let xdg_config = config_dir.config_dir().join("xsdgen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // XSDGEN__OUTPUT__DIR=...
        builder = builder.add_source(
            Environment::with_prefix("XSDGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Options for the orchestrator
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            binding_folder: self.schemas.binding_folder.clone(),
            binding_extension: self.schemas.binding_extension.clone(),
            use_filename_versions: self.schemas.use_filename_versions,
            catalog: self.schemas.catalog.clone(),
            flags: Some(self.compiler.flags.clone()),
            package_name: self.schemas.package_name.clone(),
            transitive_episodes: self.schemas.transitive_episodes,
        }
    }

    /// Compiler process described by this configuration
    pub fn compiler(&self) -> XjcCommand {
        XjcCommand::new(&self.compiler.program).with_working_dir(self.compiler.working_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.output.dir, PathBuf::from("generated"));
        assert_eq!(config.output.encoding, "UTF-8");
        assert_eq!(config.compiler.flags, vec![Flag::Extension, Flag::AutoNameResolution]);

        let options = config.generate_options();
        assert_eq!(options.binding_extension, ".xjb.xml");
        assert!(!options.use_filename_versions);
    }

    #[test]
    fn test_serialize_config() {
        let config = GeneratorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[compiler]"));
        assert!(toml_str.contains("auto-name-resolution"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[output]
dir = "out"

[schemas]
use_filename_versions = true
package_name = "com.example.model"

[compiler]
flags = ["mark-generated"]
"#,
        )
        .unwrap();

        let config = GeneratorConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.encoding, "UTF-8");
        assert!(config.schemas.use_filename_versions);
        assert_eq!(config.compiler.flags, vec![Flag::MarkGenerated]);
        assert_eq!(
            config.generate_options().package_name.as_deref(),
            Some("com.example.model")
        );
    }
}
