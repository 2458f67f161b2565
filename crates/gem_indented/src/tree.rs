//! Parsed node tree
//!
//! Nodes are stored in file order in a flat arena and refer to each other
//! by [`NodeId`].

use std::fmt;
use std::ops::Index;

use gem_cast::Value;

/// Index of a node in its tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One declaration line
#[derive(Debug, Clone, PartialEq)]
pub struct IndentedNode {
    /// First word of the line
    pub type_name: String,
    /// Optional second word
    pub name: Option<String>,
    /// Line started with `*`: not attached to its parent on replay
    pub free: bool,
    /// Text after the colon
    pub args: String,
    /// `pcast` result of `args`, when requested
    pub value: Option<Value>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Leading whitespace width
    pub indent: usize,
    /// 1-based source line
    pub line: usize,
}

impl IndentedNode {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            free: false,
            args: String::new(),
            value: None,
            parent: None,
            children: Vec::new(),
            indent: 0,
            line: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndentedTree {
    nodes: Vec<IndentedNode>,
}

impl IndentedTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node; its parent must already be in the tree
    pub fn push(&mut self, node: IndentedNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Rebuild every node's child list from the parent links
    pub fn build_child_list(&mut self) {
        for node in &mut self.nodes {
            node.children.clear();
        }
        for index in 0..self.nodes.len() {
            if let Some(parent) = self.nodes[index].parent {
                self.nodes[parent.0].children.push(NodeId(index));
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&IndentedNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut IndentedNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Number of ancestors
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    /// First node with the given name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    /// Nodes in file order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &IndentedNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeId> for IndentedTree {
    type Output = IndentedNode;

    fn index(&self, id: NodeId) -> &IndentedNode {
        &self.nodes[id.0]
    }
}

/// One line per node, four spaces per depth level
impl fmt::Display for IndentedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, node) in self.iter() {
            let line = format!("{}{}: {}", "    ".repeat(self.depth(id)), node.type_name, node.args);
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
