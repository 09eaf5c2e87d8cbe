//! Schema reference parsing
//!
//! Reads one XSD document and extracts its composition references
//! (`xs:include`, `xs:import`, `xs:redefine`) in document order, together
//! with the declared `targetNamespace` of the schema element.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::{Deserialize, Serialize};

use crate::error::{FileKind, GeneratorError, Result};

/// Namespace of the XML Schema vocabulary
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// How a schema document refers to another one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// Definitions are merged into the referencing compilation unit
    Include,
    /// Separately compiled unit, usually in another namespace
    Import,
    /// Separately compiled unit whose components are redefined
    Redefine,
}

impl RelationType {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"include" => Some(RelationType::Include),
            b"import" => Some(RelationType::Import),
            b"redefine" => Some(RelationType::Redefine),
            _ => None,
        }
    }

    /// Merged references never produce their own output
    pub fn is_merged(self) -> bool {
        match self {
            RelationType::Include => true,
            RelationType::Import | RelationType::Redefine => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Include => "include",
            RelationType::Import => "import",
            RelationType::Redefine => "redefine",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference as written in the referencing document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    pub relation: RelationType,
    /// Value of the `schemaLocation` attribute
    pub schema_location: String,
    /// Value of the `namespace` attribute (imports)
    pub namespace: Option<String>,
}

/// The parts of a schema document the generator cares about
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub path: PathBuf,
    pub target_namespace: Option<String>,
    pub references: Vec<RawReference>,
}

impl SchemaDocument {
    /// Read and parse a schema file
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => GeneratorError::not_found(FileKind::Schema, path),
            _ => GeneratorError::Io(e),
        })?;
        Self::parse(path, &content)
    }

    /// Parse schema content; `path` is only used for error reporting
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut target_namespace = None;
        let mut references = Vec::new();
        let mut depth = 0usize;
        let mut seen_root = false;

        loop {
            let (ns, event) = reader
                .read_resolved_event()
                .map_err(|e| GeneratorError::parse(path, e))?;
            let in_xsd = matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == XSD_NAMESPACE.as_bytes());

            let element = match event {
                Event::Start(e) | Event::Empty(e) if depth == 0 && seen_root => {
                    return Err(GeneratorError::parse(
                        path,
                        format!("second root element <{}>", String::from_utf8_lossy(e.name().as_ref())),
                    ));
                }
                Event::Start(e) => {
                    seen_root = true;
                    depth += 1;
                    e
                }
                Event::Empty(e) => {
                    seen_root = true;
                    e
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    continue;
                }
                Event::Text(_) | Event::CData(_) if depth == 0 => {
                    return Err(GeneratorError::parse(path, "content outside of the root element"));
                }
                Event::Eof if depth > 0 => {
                    return Err(GeneratorError::parse(
                        path,
                        format!("unexpected end of document, {} element(s) not closed", depth),
                    ));
                }
                Event::Eof if !seen_root => {
                    return Err(GeneratorError::parse(path, "document has no root element"));
                }
                Event::Eof => break,
                _ => continue,
            };
            if !in_xsd {
                continue;
            }

            let local = element.local_name();
            if local.as_ref() == b"schema" {
                if target_namespace.is_none() {
                    target_namespace = attribute(path, &element, "targetNamespace")?;
                }
                continue;
            }

            let Some(relation) = RelationType::from_local_name(local.as_ref()) else {
                continue;
            };
            // Without a location there is nothing to resolve
            let Some(schema_location) = attribute(path, &element, "schemaLocation")? else {
                continue;
            };
            references.push(RawReference {
                relation,
                schema_location,
                namespace: attribute(path, &element, "namespace")?,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            target_namespace,
            references,
        })
    }
}

fn attribute(path: &Path, element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let Some(attr) = element
        .try_get_attribute(name)
        .map_err(|e| GeneratorError::parse(path, e))?
    else {
        return Ok(None);
    };
    let value = attr
        .unescape_value()
        .map_err(|e| GeneratorError::parse(path, e))?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<SchemaDocument> {
        SchemaDocument::parse(Path::new("test.xsd"), content)
    }

    #[test]
    fn test_references_in_document_order() {
        let doc = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                       targetNamespace="http://alexanderwolz.de/schema/articles">
                <xs:import namespace="http://alexanderwolz.de/schema/authors" schemaLocation="author_v2.xsd"/>
                <xs:include schemaLocation="status.xsd"/>
                <xs:redefine schemaLocation="base_v1.xsd"></xs:redefine>
                <xs:element name="article" type="xs:string"/>
            </xs:schema>"#,
        )
        .unwrap();

        assert_eq!(doc.target_namespace.as_deref(), Some("http://alexanderwolz.de/schema/articles"));
        let kinds: Vec<_> = doc.references.iter().map(|r| r.relation).collect();
        assert_eq!(kinds, vec![RelationType::Import, RelationType::Include, RelationType::Redefine]);
        assert_eq!(doc.references[0].schema_location, "author_v2.xsd");
        assert_eq!(doc.references[0].namespace.as_deref(), Some("http://alexanderwolz.de/schema/authors"));
        assert_eq!(doc.references[1].namespace, None);
    }

    #[test]
    fn test_missing_or_empty_location_is_ignored() {
        let doc = parse(
            r#"<schema xmlns="http://www.w3.org/2001/XMLSchema">
                <import namespace="urn:no-location"/>
                <include schemaLocation="  "/>
                <include schemaLocation="common.xsd"/>
            </schema>"#,
        )
        .unwrap();

        assert_eq!(doc.target_namespace, None);
        assert_eq!(doc.references.len(), 1);
        assert_eq!(doc.references[0].schema_location, "common.xsd");
    }

    #[test]
    fn test_foreign_namespace_elements_are_ignored() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:other="urn:other">
                <other:include schemaLocation="nope.xsd"/>
                <xs:annotation><xs:appinfo><include schemaLocation="also-nope.xsd"/></xs:appinfo></xs:annotation>
            </xs:schema>"#,
        )
        .unwrap();
        assert!(doc.references.is_empty());
    }

    #[test]
    fn test_malformed_document_fails() {
        let result = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:include schemaLocation="a.xsd">
            </xs:schema>"#,
        );
        assert!(matches!(result, Err(GeneratorError::Parse { .. })));
    }

    #[test]
    fn test_truncated_document_fails() {
        let result = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:include schemaLocation="a.xsd"/>"#,
        );
        match result {
            Err(GeneratorError::Parse { message, .. }) => assert!(message.contains("not closed")),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_text_outside_root_fails() {
        assert!(matches!(parse("this is not xml"), Err(GeneratorError::Parse { .. })));
        assert!(matches!(
            parse(r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/> trailing"#),
            Err(GeneratorError::Parse { .. })
        ));
    }

    #[test]
    fn test_document_without_root_fails() {
        assert!(matches!(parse(""), Err(GeneratorError::Parse { .. })));
        assert!(matches!(
            parse("<?xml version=\"1.0\"?>\n<!-- nothing here -->\n"),
            Err(GeneratorError::Parse { .. })
        ));
    }

    #[test]
    fn test_second_root_fails() {
        let result = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/><xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#,
        );
        assert!(matches!(result, Err(GeneratorError::Parse { .. })));
    }

    #[test]
    fn test_relation_merging() {
        assert!(RelationType::Include.is_merged());
        assert!(!RelationType::Import.is_merged());
        assert!(!RelationType::Redefine.is_merged());
    }
}
