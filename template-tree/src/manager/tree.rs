//! Containment tree
//!
//! The tree is computed from each template's child element names alone, so
//! it can be built and tested without a document.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

/// One template in the containment tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateNode {
    /// Template name
    pub name: String,
    /// Templates referenced from this template's markup, in document order
    pub children: Vec<TemplateNode>,
}

impl TemplateNode {
    /// Leaf node
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Every name in the tree, depth first, starting with this node
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        for child in &self.children {
            names.extend(child.names());
        }
        names
    }

    /// First node with `name`, depth first
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Whether `name` appears anywhere in the tree
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
        for (index, child) in self.children.iter().enumerate() {
            let last = index + 1 == self.children.len();
            let (branch, indent) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
            writeln!(f, "{prefix}{branch}{}", child.name)?;
            child.render(f, &format!("{prefix}{indent}"))?;
        }
        Ok(())
    }
}

impl fmt::Display for TemplateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        self.render(f, "")
    }
}

/// Build the containment tree rooted at `root`
///
/// `children` maps every known template name to the element names found in
/// its markup. Names that are not keys of `children` are dropped, repeated
/// child names collapse to their first occurrence and a name already on the
/// path from the root is not descended into again. Returns `None` when
/// `root` is not a known template.
#[must_use]
pub fn build_tree<S: BuildHasher>(root: &str, children: &HashMap<String, Vec<String>, S>) -> Option<TemplateNode> {
    children.contains_key(root).then(|| {
        let mut path = vec![root.to_string()];
        build_node(root, children, &mut path)
    })
}

fn build_node<S: BuildHasher>(name: &str, children: &HashMap<String, Vec<String>, S>, path: &mut Vec<String>) -> TemplateNode {
    let mut node = TemplateNode::new(name);
    let mut seen: Vec<&str> = Vec::new();

    for child in children.get(name).into_iter().flatten() {
        if !children.contains_key(child) || seen.contains(&child.as_str()) || path.contains(child) {
            continue;
        }
        seen.push(child);
        path.push(child.clone());
        node.children.push(build_node(child, children, path));
        path.pop();
    }
    node
}
