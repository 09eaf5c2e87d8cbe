//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use xsd_generator::{BuildRequest, CompilerOutput, SchemaCompiler};

pub fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn schemas_dir() -> PathBuf {
    fs::canonicalize(fixtures_path().join("schemas")).unwrap()
}

pub fn chain_dir() -> PathBuf {
    fs::canonicalize(fixtures_path().join("chain")).unwrap()
}

/// Episode content with an outer and one inner `bindings` element
pub fn valid_episode(package: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<bindings xmlns="https://jakarta.ee/xml/ns/jaxb" if-exists="true" version="3.0">
  <bindings if-exists="true" scd="x-schema::tns">
    <schemaBindings map="false"><package name="{package}"/></schemaBindings>
  </bindings>
</bindings>
"#
    )
}

/// Records every request instead of compiling; writes an episode when one
/// is requested so later runs see the unit as built.
#[derive(Debug, Default)]
pub struct RecordingCompiler {
    pub requests: Vec<BuildRequest>,
    /// Base name of a schema whose build should fail
    pub fail_on: Option<String>,
}

impl RecordingCompiler {
    pub fn failing_on(name: &str) -> Self {
        Self {
            requests: Vec::new(),
            fail_on: Some(name.to_string()),
        }
    }

    /// Base names of the built schemas, in call order
    pub fn built(&self) -> Vec<String> {
        self.requests
            .iter()
            .map(|r| base_name(&r.schemas[0]))
            .collect()
    }
}

impl SchemaCompiler for RecordingCompiler {
    fn invoke(&mut self, request: &BuildRequest) -> xsd_generator::Result<CompilerOutput> {
        // Same validation and flattening the real compiler performs
        request.to_args()?;
        self.requests.push(request.clone());

        let name = base_name(&request.schemas[0]);
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Ok(CompilerOutput {
                status: 1,
                stdout: "parsing a schema...\n".to_string(),
                stderr: format!(
                    "[ERROR] src-resolve: Cannot resolve the name 'tns:Missing'.\n  line 3 of file:{}\n",
                    request.schemas[0].display()
                ),
            });
        }

        if let Some(episode) = &request.create_episode {
            let package = request.package.clone().unwrap_or_default();
            fs::write(episode, valid_episode(&package)).unwrap();
        }
        Ok(CompilerOutput {
            status: 0,
            stdout: "parsing a schema...\ncompiling a schema...\n".to_string(),
            stderr: String::new(),
        })
    }
}

pub fn base_name(path: &Path) -> String {
    path.file_stem().unwrap().to_string_lossy().into_owned()
}

pub fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}
