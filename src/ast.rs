//! Node types, arena, and navigation helpers for the parsed JSON tree.
//!
//! Nodes live in a flat arena owned by [`JSONDocument`]; a [`NodeId`] is just
//! an index into it. `parent` is a back reference only, never an owner.

use tower_lsp::lsp_types::{Diagnostic, Position, Range};

use crate::line_index::LineIndex;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Property,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Null,
    Boolean(bool),
    Number {
        value: f64,
        is_integer: bool,
        /// Original source lexeme, needed for exact `multipleOf` decomposition.
        raw: String,
    },
    String(String),
    Array(Vec<NodeId>),
    Object(Vec<NodeId>),
    Property {
        key: NodeId,
        value: Option<NodeId>,
        colon_offset: i64,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub offset: usize,
    pub length: usize,
    pub parent: Option<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Null => NodeKind::Null,
            NodeData::Boolean(_) => NodeKind::Boolean,
            NodeData::Number { .. } => NodeKind::Number,
            NodeData::String(_) => NodeKind::String,
            NodeData::Array(_) => NodeKind::Array,
            NodeData::Object(_) => NodeKind::Object,
            NodeData::Property { .. } => NodeKind::Property,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.end()
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            NodeData::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Children to descend into for traversal/offset lookup. Property nodes
    /// descend into their key and (if present) value.
    pub fn descend_children(&self) -> Vec<NodeId> {
        match &self.data {
            NodeData::Array(c) | NodeData::Object(c) => c.clone(),
            NodeData::Property { key, value, .. } => {
                let mut v = vec![*key];
                if let Some(val) = value {
                    v.push(*val);
                }
                v
            }
            _ => Vec::new(),
        }
    }
}

pub struct JSONDocument {
    pub source: String,
    arena: Vec<Node>,
    pub root: Option<NodeId>,
    pub syntax_errors: Vec<Diagnostic>,
    /// Byte offset + length pairs, in source order.
    pub comments: Vec<(usize, usize)>,
    line_index: LineIndex,
}

impl JSONDocument {
    pub(crate) fn new(
        source: String,
        arena: Vec<Node>,
        root: Option<NodeId>,
        syntax_errors: Vec<Diagnostic>,
        comments: Vec<(usize, usize)>,
    ) -> Self {
        let line_index = LineIndex::new(&source);
        Self {
            source,
            arena,
            root,
            syntax_errors,
            comments,
            line_index,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Deepest node containing `offset`. When `include_right_bound` is set, a
    /// node whose end equals `offset` is also considered containing.
    pub fn get_node_from_offset(&self, offset: usize, include_right_bound: bool) -> Option<NodeId> {
        fn find(doc: &JSONDocument, id: NodeId, offset: usize, include_right: bool) -> Option<NodeId> {
            let node = doc.node(id);
            let in_range = if include_right {
                node.offset <= offset && offset <= node.end()
            } else {
                node.contains(offset)
            };
            if !in_range {
                return None;
            }
            for child in node.descend_children() {
                if let Some(found) = find(doc, child, offset, include_right) {
                    return Some(found);
                }
            }
            Some(id)
        }
        self.root.and_then(|r| find(self, r, offset, include_right_bound))
    }

    /// Pre-order depth-first traversal. Stops early when `f` returns `false`.
    pub fn visit(&self, mut f: impl FnMut(NodeId) -> bool) {
        fn go(doc: &JSONDocument, id: NodeId, f: &mut impl FnMut(NodeId) -> bool) -> bool {
            if !f(id) {
                return false;
            }
            for child in doc.node(id).descend_children() {
                if !go(doc, child, f) {
                    return false;
                }
            }
            true
        }
        if let Some(r) = self.root {
            go(self, r, &mut f);
        }
    }

    pub fn position_at(&self, offset: usize) -> Position {
        self.line_index.position_at(&self.source, offset)
    }

    pub fn range_for(&self, offset: usize, length: usize) -> Range {
        Range {
            start: self.position_at(offset),
            end: self.position_at(offset + length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{self, ParseOptions};

    #[test]
    fn nodes_nest_within_parent_bounds() {
        let doc = parser::parse(r#"{"a": [1, 2, {"b": true}]}"#, ParseOptions::default());
        doc.visit(|id| {
            let node = doc.node(id);
            if let Some(parent_id) = node.parent {
                let parent = doc.node(parent_id);
                assert!(parent.offset <= node.offset);
                assert!(node.end() <= parent.end());
            }
            true
        });
    }

    #[test]
    fn get_node_from_offset_finds_deepest_node() {
        let text = r#"{"a": 1}"#;
        let doc = parser::parse(text, ParseOptions::default());
        // offset of the `1`
        let offset = text.find('1').unwrap();
        let id = doc.get_node_from_offset(offset, false).unwrap();
        assert_eq!(doc.node(id).kind(), NodeKind::Number);
    }
}
