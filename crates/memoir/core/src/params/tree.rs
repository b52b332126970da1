// Memoir
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The resolved parameter tree.
//!
//! Every node carries its own [`NodePath`], so owner relationships are
//! ordinary data: a node's owner is the node at `path.parent()`. There is
//! no attribute-access indirection; the tree is fully materialized when the
//! configuration overlay succeeds.

use super::value::ParamValue;
use memoir_common::NodePath;

/// One entry of a resolved node: a leaf value or a nested subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamNode {
    Leaf(ParamValue),
    Nested(ParamTree),
}

/// A fully resolved parameter tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamTree {
    label: String,
    path: NodePath,
    entries: Vec<(String, ParamNode)>,
}

impl ParamTree {
    pub(crate) fn new(label: impl Into<String>, path: NodePath, entries: Vec<(String, ParamNode)>) -> Self {
        Self {
            label: label.into(),
            path,
            entries,
        }
    }

    /// Type name of this node (the schema label it was resolved from).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Position of this node inside the tree; empty at the root.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// The name this node has inside its owner, or `None` at the root.
    pub fn name(&self) -> Option<&str> {
        self.path.name()
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ParamNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Leaf value declared at this level.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find_map(|(entry, node)| match node {
            ParamNode::Leaf(value) if entry == name => Some(value),
            _ => None,
        })
    }

    /// Nested subtree declared at this level.
    pub fn child(&self, name: &str) -> Option<&ParamTree> {
        self.entries.iter().find_map(|(entry, node)| match node {
            ParamNode::Nested(tree) if entry == name => Some(tree),
            _ => None,
        })
    }

    /// Leaf value at a dotted path relative to this node.
    pub fn get_at(&self, path: &NodePath) -> Option<&ParamValue> {
        let segments = path.segments();
        let (leaf, owners) = segments.split_last()?;
        let mut node = self;
        for owner in owners {
            node = node.child(owner)?;
        }
        node.get(leaf)
    }

    /// Subtree at a dotted path relative to this node.
    pub fn node(&self, path: &NodePath) -> Option<&ParamTree> {
        let mut node = self;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        Some(node)
    }

    /// Typed accessor for leaf values.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParamValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParamTree {
        let nested = ParamTree::new(
            "Output",
            NodePath::parse("output"),
            vec![("precision".to_string(), ParamNode::Leaf(ParamValue::Int(6)))],
        );
        ParamTree::new(
            "Sim",
            NodePath::root(),
            vec![
                ("dt".to_string(), ParamNode::Leaf(ParamValue::Float(0.01))),
                ("output".to_string(), ParamNode::Nested(nested)),
            ],
        )
    }

    #[test]
    fn test_lookup() {
        let tree = sample();
        assert_eq!(tree.get_f64("dt"), Some(0.01));
        assert_eq!(tree.child("output").unwrap().get_i64("precision"), Some(6));
        assert!(tree.get("missing").is_none());
        assert!(tree.child("dt").is_none());
    }

    #[test]
    fn test_dotted_lookup() {
        let tree = sample();
        assert_eq!(tree.get_at(&NodePath::parse("output.precision")), Some(&ParamValue::Int(6)));
        assert_eq!(tree.get_at(&NodePath::parse("dt")), Some(&ParamValue::Float(0.01)));
        assert!(tree.get_at(&NodePath::parse("output.missing")).is_none());
        let node = tree.node(&NodePath::parse("output")).unwrap();
        assert_eq!(node.label(), "Output");
        assert_eq!(node.name(), Some("output"));
    }

    #[test]
    fn test_owner_backreference() {
        let tree = sample();
        let nested = tree.child("output").unwrap();
        let owner_path = nested.path().parent().unwrap();
        assert_eq!(tree.node(&owner_path).unwrap().label(), "Sim");
    }
}
