//! Label-keyed result trees.
//!
//! A [`ResultTree`] nests one level per non-spatial axis, keyed by the
//! semantic label of each coordinate, with numeric (or null) leaves:
//!
//! ```json
//! {"1950-2008": {"CRU-TS": {"historical": 12.4}}}
//! ```
//!
//! Branches keep insertion order so serialized output follows enumeration
//! order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use zonal_common::{ZonalError, ZonalResult};

/// A node of a result tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultNode {
    Leaf(Option<f64>),
    Branch(IndexMap<String, ResultNode>),
}

impl ResultNode {
    /// The leaf value, or None for branches.
    pub fn value(&self) -> Option<Option<f64>> {
        match self {
            ResultNode::Leaf(value) => Some(*value),
            ResultNode::Branch(_) => None,
        }
    }

    pub fn children(&self) -> Option<&IndexMap<String, ResultNode>> {
        match self {
            ResultNode::Branch(children) => Some(children),
            ResultNode::Leaf(_) => None,
        }
    }

    fn collect_leaves(&self, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, Option<f64>)>) {
        match self {
            ResultNode::Leaf(value) => out.push((path.clone(), *value)),
            ResultNode::Branch(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }

    pub(crate) fn for_each_leaf_mut(&mut self, f: &mut impl FnMut(&mut Option<f64>)) {
        match self {
            ResultNode::Leaf(value) => f(value),
            ResultNode::Branch(children) => {
                for child in children.values_mut() {
                    child.for_each_leaf_mut(f);
                }
            }
        }
    }
}

/// Nested mapping from label paths to aggregated values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTree {
    levels: Vec<String>,
    root: ResultNode,
}

impl Serialize for ResultTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl ResultTree {
    /// An empty tree with one level per named axis. With no levels the
    /// root is a single null leaf.
    pub fn new(levels: Vec<String>) -> Self {
        let root = if levels.is_empty() {
            ResultNode::Leaf(None)
        } else {
            ResultNode::Branch(IndexMap::new())
        };
        Self { levels, root }
    }

    /// Rebuild a tree from serialized JSON and its level names. Key order
    /// in the text is kept.
    pub fn from_json_str(levels: Vec<String>, text: &str) -> ZonalResult<Self> {
        let root: ResultNode = serde_json::from_str(text)
            .map_err(|e| ZonalError::InvalidTree(format!("Not a result tree: {}", e)))?;
        Ok(Self { levels, root })
    }

    /// Axis names, one per level.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn root(&self) -> &ResultNode {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut ResultNode {
        &mut self.root
    }

    /// Read the node at `path`.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> ZonalResult<&ResultNode> {
        let mut node = &self.root;
        for key in path {
            node = match node {
                ResultNode::Branch(children) => children
                    .get(key.as_ref())
                    .ok_or_else(|| path_not_found(path))?,
                ResultNode::Leaf(_) => return Err(path_not_found(path)),
            };
        }
        Ok(node)
    }

    /// Read the leaf value at a full-depth `path`.
    pub fn get_value<S: AsRef<str>>(&self, path: &[S]) -> ZonalResult<Option<f64>> {
        self.get(path)?
            .value()
            .ok_or_else(|| ZonalError::InvalidTree(format!("'{}' is not a leaf", join(path))))
    }

    /// Mutable access to the node at `path`, creating missing levels.
    ///
    /// Created nodes are branches above the leaf depth and null leaves at
    /// it. Fails with `InvalidTree` when the path runs through a leaf or
    /// deeper than the tree.
    pub fn get_or_create_mut<S: AsRef<str>>(&mut self, path: &[S]) -> ZonalResult<&mut ResultNode> {
        if path.len() > self.levels.len() {
            return Err(ZonalError::InvalidTree(format!(
                "Path '{}' is deeper than the tree ({} levels)",
                join(path),
                self.levels.len()
            )));
        }

        let depth = self.levels.len();
        let mut node = &mut self.root;
        for (level, key) in path.iter().enumerate() {
            let ResultNode::Branch(children) = node else {
                return Err(ZonalError::InvalidTree(format!(
                    "Cannot descend through leaf at '{}'",
                    join(&path[..level])
                )));
            };
            node = children.entry(key.as_ref().to_string()).or_insert_with(|| {
                if level + 1 == depth {
                    ResultNode::Leaf(None)
                } else {
                    ResultNode::Branch(IndexMap::new())
                }
            });
        }
        Ok(node)
    }

    /// Write a leaf at a full-depth path.
    pub fn set_leaf<S: AsRef<str>>(&mut self, path: &[S], value: Option<f64>) -> ZonalResult<()> {
        if path.len() != self.levels.len() {
            return Err(ZonalError::InvalidTree(format!(
                "Leaf path '{}' has {} keys, tree has {} levels",
                join(path),
                path.len(),
                self.levels.len()
            )));
        }
        *self.get_or_create_mut(path)? = ResultNode::Leaf(value);
        Ok(())
    }

    /// Remove the subtree at `path`. Removing a missing path is a no-op.
    pub fn remove<S: AsRef<str>>(&mut self, path: &[S]) -> Option<ResultNode> {
        let (last, parents) = path.split_last()?;
        let mut node = &mut self.root;
        for key in parents {
            node = match node {
                ResultNode::Branch(children) => children.get_mut(key.as_ref())?,
                ResultNode::Leaf(_) => return None,
            };
        }
        match node {
            ResultNode::Branch(children) => children.shift_remove(last.as_ref()),
            ResultNode::Leaf(_) => None,
        }
    }

    /// Every leaf with its path, in insertion order.
    pub fn leaves(&self) -> Vec<(Vec<String>, Option<f64>)> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        fn count(node: &ResultNode) -> usize {
            match node {
                ResultNode::Leaf(_) => 1,
                ResultNode::Branch(children) => children.values().map(count).sum(),
            }
        }
        count(&self.root)
    }

    /// Paths of every node at `depth` (1-based; depth 1 is the first level).
    pub fn paths_at(&self, depth: usize) -> Vec<Vec<String>> {
        fn walk(
            node: &ResultNode,
            depth: usize,
            path: &mut Vec<String>,
            out: &mut Vec<Vec<String>>,
        ) {
            if path.len() == depth {
                out.push(path.clone());
                return;
            }
            if let ResultNode::Branch(children) = node {
                for (key, child) in children {
                    path.push(key.clone());
                    walk(child, depth, path, out);
                    path.pop();
                }
            }
        }

        let mut out = Vec::new();
        if depth > 0 {
            walk(&self.root, depth, &mut Vec::new(), &mut out);
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.root).unwrap_or(serde_json::Value::Null)
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/")
}

fn path_not_found<S: AsRef<str>>(path: &[S]) -> ZonalError {
    ZonalError::PathNotFound(join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_level() -> ResultTree {
        ResultTree::new(vec!["era".to_string(), "model".to_string()])
    }

    #[test]
    fn test_write_then_read() {
        let mut tree = two_level();
        tree.set_leaf(&["2040-2069", "GFDL-CM3"], Some(1.5)).unwrap();
        tree.set_leaf(&["2040-2069", "CRU-TS"], None).unwrap();
        tree.set_leaf(&["1950-2008", "CRU-TS"], Some(-2.0)).unwrap();

        assert_eq!(tree.get_value(&["2040-2069", "GFDL-CM3"]).unwrap(), Some(1.5));
        assert_eq!(tree.get_value(&["2040-2069", "CRU-TS"]).unwrap(), None);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(
            tree.to_json(),
            json!({"2040-2069": {"GFDL-CM3": 1.5, "CRU-TS": null}, "1950-2008": {"CRU-TS": -2.0}})
        );
    }

    #[test]
    fn test_missing_path() {
        let tree = two_level();
        assert!(matches!(tree.get(&["nope"]), Err(ZonalError::PathNotFound(p)) if p == "nope"));
    }

    #[test]
    fn test_write_through_leaf_fails() {
        let mut tree = two_level();
        tree.set_leaf(&["a", "b"], Some(1.0)).unwrap();
        assert!(matches!(
            tree.set_leaf(&["a", "b", "c"], Some(1.0)),
            Err(ZonalError::InvalidTree(_))
        ));
        assert!(matches!(tree.set_leaf(&["a"], Some(1.0)), Err(ZonalError::InvalidTree(_))));
    }

    #[test]
    fn test_get_or_create_mut_through_leaf_fails() {
        let mut tree = ResultTree::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        // Force a leaf at depth 1
        if let ResultNode::Branch(children) = tree.root_mut() {
            children.insert("x".to_string(), ResultNode::Leaf(Some(1.0)));
        }
        assert!(matches!(tree.get_or_create_mut(&["x", "y"]), Err(ZonalError::InvalidTree(_))));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut tree = two_level();
        tree.set_leaf(&["a", "b"], Some(1.0)).unwrap();
        tree.set_leaf(&["a", "c"], Some(2.0)).unwrap();

        assert!(tree.remove(&["a", "b"]).is_some());
        assert!(tree.remove(&["a", "b"]).is_none());
        assert!(tree.remove(&["missing", "b"]).is_none());
        assert_eq!(tree.leaves(), vec![(vec!["a".to_string(), "c".to_string()], Some(2.0))]);
    }

    #[test]
    fn test_depth_zero_tree() {
        let mut tree = ResultTree::new(Vec::new());
        assert_eq!(tree.leaf_count(), 1);
        tree.set_leaf::<&str>(&[], Some(4.0)).unwrap();
        assert_eq!(tree.get_value::<&str>(&[]).unwrap(), Some(4.0));
        assert_eq!(tree.to_json(), json!(4.0));
        assert_eq!(tree.leaves(), vec![(Vec::new(), Some(4.0))]);
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let text = r#"{"z":{"b":1.0,"a":null},"y":{"c":3.0}}"#;
        let tree = ResultTree::from_json_str(vec!["one".into(), "two".into()], text).unwrap();
        let keys: Vec<String> = tree.leaves().into_iter().map(|(p, _)| p.join("/")).collect();
        assert_eq!(keys, vec!["z/b", "z/a", "y/c"]);
        assert_eq!(serde_json::to_string(&tree).unwrap(), text);
    }

    #[test]
    fn test_paths_at() {
        let mut tree = two_level();
        tree.set_leaf(&["a", "x"], Some(1.0)).unwrap();
        tree.set_leaf(&["b", "y"], Some(1.0)).unwrap();
        assert_eq!(tree.paths_at(1), vec![vec!["a".to_string()], vec!["b".to_string()]]);
        assert_eq!(tree.paths_at(2).len(), 2);
        assert!(tree.paths_at(0).is_empty());
    }
}
