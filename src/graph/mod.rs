//! Schema Reference Graph
//!
//! The transitive include/import/redefine structure of one root schema,
//! stored as an arena of nodes. Every node keeps its ordered child indices
//! and an optional parent index; the root has no parent.
//!
//! A document reachable along two different paths appears as two
//! independent nodes. Only the active ancestor path is checked for cycles.

pub mod builder;
pub mod traverse;

pub use traverse::{BottomUp, TopDown};

use std::ops::Index;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::reference::RelationType;

/// Index of a node inside its [`ReferenceGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One schema document in the reference tree
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceNode {
    /// Absolute path of the schema document
    pub file: PathBuf,
    /// Location as written by the referencing document
    pub schema_location: String,
    /// How the parent refers to this document (`None` for the root)
    pub relation: Option<RelationType>,
    /// Declared namespace of the reference (imports)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ReferenceNode {
    fn new(
        file: PathBuf,
        schema_location: String,
        relation: Option<RelationType>,
        namespace: Option<String>,
    ) -> Self {
        Self {
            file,
            schema_location,
            relation,
            namespace,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in document order of discovery
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Included documents are compiled as part of their parent
    pub fn is_merged(&self) -> bool {
        self.relation.is_some_and(RelationType::is_merged)
    }

    /// File name without extension, e.g. `article_v3`
    pub fn base_name(&self) -> String {
        base_name(&self.file)
    }
}

/// File stem of a schema path as an owned string
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Tree of schema references rooted at the requested schema
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceGraph {
    nodes: Vec<ReferenceNode>,
    root: NodeId,
}

impl ReferenceGraph {
    /// Resolve the transitive references of `root_file`.
    ///
    /// Relative locations are resolved against the referencing document's
    /// folder first and `base_folder` second.
    pub fn build(root_file: &Path, base_folder: &Path) -> crate::Result<Self> {
        builder::GraphBuilder::new(base_folder).build(root_file)
    }

    fn with_root(file: PathBuf, schema_location: String) -> Self {
        Self {
            nodes: vec![ReferenceNode::new(file, schema_location, None, None)],
            root: NodeId(0),
        }
    }

    fn attach(&mut self, parent: NodeId, mut node: ReferenceNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ReferenceNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distance from the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Indented top-down listing, one `location -> file` line per node
    pub fn render_tree(&self) -> String {
        let mut output = String::new();
        for id in self.top_down(self.root) {
            let node = self.node(id);
            output.push_str(&"  ".repeat(self.depth(id)));
            output.push_str(&format!("{} -> {}\n", node.schema_location, node.file.display()));
        }
        output
    }

    /// Graphviz rendering, edges labelled with the relation type
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph SchemaReferences {\n");
        output.push_str("  rankdir=BT;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n");
        output.push('\n');

        for id in self.top_down(self.root) {
            let node = self.node(id);
            let color = match node.relation {
                None => "#FFCC80",
                Some(RelationType::Include) => "#E0E0E0",
                Some(RelationType::Import) => "#90CAF9",
                Some(RelationType::Redefine) => "#CE93D8",
            };
            output.push_str(&format!(
                "  n{} [label=\"{}\", fillcolor=\"{}\"];\n",
                id.0,
                node.base_name().replace('"', "\\\""),
                color
            ));
        }

        output.push('\n');

        for id in self.top_down(self.root) {
            let node = self.node(id);
            for child in &node.children {
                let label = self.node(*child).relation.map(RelationType::as_str).unwrap_or("");
                output.push_str(&format!("  n{} -> n{} [label=\"{}\"];\n", id.0, child.0, label));
            }
        }

        output.push_str("}\n");
        output
    }
}

impl Index<NodeId> for ReferenceGraph {
    type Output = ReferenceNode;

    fn index(&self, id: NodeId) -> &ReferenceNode {
        self.node(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `root` imports `a` (which includes `a_inc`) and imports `b`
    pub(crate) fn sample_graph() -> ReferenceGraph {
        let mut graph = ReferenceGraph::with_root(PathBuf::from("/s/root.xsd"), "root.xsd".to_string());
        let root = graph.root();
        let a = graph.attach(root, node("a", RelationType::Import));
        graph.attach(a, node("a_inc", RelationType::Include));
        graph.attach(root, node("b", RelationType::Import));
        graph
    }

    fn node(name: &str, relation: RelationType) -> ReferenceNode {
        ReferenceNode::new(
            PathBuf::from(format!("/s/{name}.xsd")),
            format!("{name}.xsd"),
            Some(relation),
            None,
        )
    }

    #[test]
    fn test_parent_links_and_depth() {
        let graph = sample_graph();
        let root = graph.root();
        let a = graph[root].children()[0];
        let a_inc = graph[a].children()[0];

        assert!(graph[root].is_root());
        assert_eq!(graph[a_inc].parent(), Some(a));
        assert_eq!(graph.depth(root), 0);
        assert_eq!(graph.depth(a_inc), 2);
        assert!(graph[a_inc].is_merged());
        assert!(!graph[a].is_merged());
        assert!(!graph[root].is_merged());
    }

    #[test]
    fn test_render_tree_indents_by_depth() {
        let graph = sample_graph();
        assert_eq!(
            graph.render_tree(),
            "root.xsd -> /s/root.xsd\n  a.xsd -> /s/a.xsd\n    a_inc.xsd -> /s/a_inc.xsd\n  b.xsd -> /s/b.xsd\n"
        );
    }

    #[test]
    fn test_dot_has_labelled_edges() {
        let dot = sample_graph().to_dot();
        assert!(dot.starts_with("digraph SchemaReferences {"));
        assert!(dot.contains("n0 -> n1 [label=\"import\"]"));
        assert!(dot.contains("n1 -> n2 [label=\"include\"]"));
        assert!(dot.contains("n0 [label=\"root\""));
    }

    #[test]
    fn test_graph_serializes_with_indices() {
        let json = serde_json::to_value(sample_graph()).unwrap();
        assert_eq!(json["root"], 0);
        assert_eq!(json["nodes"][1]["relation"], "import");
        assert_eq!(json["nodes"][1]["children"], serde_json::json!([2]));
        assert_eq!(json["nodes"][2]["parent"], 1);
    }
}
