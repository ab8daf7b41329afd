/*!
 * Core types and data structures for the dumpmd application
 */

use std::cmp::Ordering;
use std::path::PathBuf;

use crate::utils::locale_cmp;

/// Kind of an included filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Directory containing other entries
    Directory,
    /// Regular file with an included extension
    File,
}

/// One filesystem entry retained after filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Absolute path
    pub path: PathBuf,
    /// Base name, used for ordering and display
    pub name: String,
    /// Directory or file
    pub kind: NodeKind,
    /// Distance from the scan root, which has depth 0
    pub depth: usize,
    /// Ordered children, always empty for files
    pub children: Vec<TreeNode>,
    /// Listing failure of an unreadable directory
    pub error: Option<String>,
}

impl TreeNode {
    /// Create a file node
    pub fn file(path: PathBuf, name: String, depth: usize) -> Self {
        Self {
            path,
            name,
            kind: NodeKind::File,
            depth,
            children: Vec::new(),
            error: None,
        }
    }

    /// Create a directory node, ordering its children
    pub fn directory(path: PathBuf, name: String, depth: usize, mut children: Vec<TreeNode>) -> Self {
        children.sort_by(TreeNode::sibling_order);
        Self {
            path,
            name,
            kind: NodeKind::Directory,
            depth,
            children,
            error: None,
        }
    }

    /// Whether this node is a directory
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Directories before files, then by name
    pub fn sibling_order(a: &TreeNode, b: &TreeNode) -> Ordering {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| locale_cmp(&a.name, &b.name))
    }

    /// File nodes in pre-order
    pub fn files(&self) -> Vec<&TreeNode> {
        let mut files = Vec::new();
        self.collect_files(&mut files);
        files
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a TreeNode>) {
        match self.kind {
            NodeKind::File => out.push(self),
            NodeKind::Directory => {
                for child in &self.children {
                    child.collect_files(out);
                }
            }
        }
    }
}

/// A package dependency declared by a project manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    /// Package identifier
    pub name: String,
    /// Requested version, if declared
    pub version: Option<String>,
}

/// A project manifest referenced from a solution manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestProject {
    /// Location of the project manifest
    pub file_path: PathBuf,
    /// Target framework from the first property group
    pub target_framework: Option<String>,
    /// Package references from the first item group
    pub package_references: Vec<PackageReference>,
}
