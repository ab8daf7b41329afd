/*!
 * Directory scanning: builds the ordered tree of included entries
 */

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::{DumpMdError, Result};
use crate::filter::PathFilter;
use crate::languages::extension_of;
use crate::types::TreeNode;

/// Scanner statistics
#[derive(Debug, Clone, Default)]
pub struct ScannerStatistics {
    /// Directories included in the tree, root included
    pub directories: usize,
    /// Files included in the tree
    pub files: usize,
    /// Sub-directories whose listing failed
    pub unreadable_directories: usize,
}

/// Scanner for directory contents
pub struct Scanner {
    /// Scanner configuration
    config: Config,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    /// Scanner statistics
    statistics: Arc<Mutex<ScannerStatistics>>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        Self {
            config,
            progress,
            statistics: Arc::new(Mutex::new(ScannerStatistics::default())),
        }
    }

    /// Get scanner statistics
    pub fn get_statistics(&self) -> ScannerStatistics {
        self.statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Scan the target directory and return the directory tree.
    ///
    /// Returns `None` when the root itself carries an ignored name. A root
    /// that cannot be listed is an error; unreadable sub-directories are kept
    /// as annotated, empty nodes.
    pub fn scan(&self) -> Result<Option<TreeNode>> {
        let root = fs::canonicalize(&self.config.target_dir)?;
        let filter = PathFilter::new(&self.config);
        let name = node_name(&root);

        if filter.should_skip_directory(&name) {
            debug!("Scan root {} is an ignored directory", root.display());
            return Ok(None);
        }

        let entries = list_entries(&root).map_err(|source| DumpMdError::Scan {
            path: root.clone(),
            source,
        })?;

        Ok(Some(self.build_directory(&filter, &root, name, 0, entries)))
    }

    /// Build the node for a directory, or `None` when its name is ignored
    pub fn build(&self, filter: &PathFilter<'_>, path: &Path, depth: usize) -> Option<TreeNode> {
        let name = node_name(path);
        if filter.should_skip_directory(&name) {
            debug!("Skipping ignored directory {}", path.display());
            return None;
        }

        match list_entries(path) {
            Ok(entries) => Some(self.build_directory(filter, path, name, depth, entries)),
            Err(e) => {
                warn!("Failed to list directory {}: {}", path.display(), e);
                self.update_statistics(|stats| {
                    stats.directories += 1;
                    stats.unreadable_directories += 1;
                });

                let mut node = TreeNode::directory(path.to_path_buf(), name, depth, Vec::new());
                node.error = Some(listing_error_reason(&e));
                Some(node)
            }
        }
    }

    fn build_directory(
        &self,
        filter: &PathFilter<'_>,
        path: &Path,
        name: String,
        depth: usize,
        entries: Vec<DirEntry>,
    ) -> TreeNode {
        self.progress
            .set_message(format!("Scanning {}", path.display()));

        let (dirs, files): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .filter(|e| e.file_type().is_dir() || e.file_type().is_file())
            .partition(|e| e.file_type().is_dir());

        // Sibling subtrees are independent; order is restored by the sort below
        let mut children: Vec<TreeNode> = dirs
            .par_iter()
            .filter_map(|entry| self.build(filter, entry.path(), depth + 1))
            .collect();

        let file_nodes: Vec<TreeNode> = files
            .iter()
            .filter(|entry| self.include_file(filter, entry.path()))
            .map(|entry| {
                TreeNode::file(
                    entry.path().to_path_buf(),
                    entry.file_name().to_string_lossy().to_string(),
                    depth + 1,
                )
            })
            .collect();

        let file_count = file_nodes.len();
        children.extend(file_nodes);
        self.update_statistics(|stats| {
            stats.directories += 1;
            stats.files += file_count;
        });

        TreeNode::directory(path.to_path_buf(), name, depth, children)
    }

    /// Check if a file qualifies by extension and is not the output document
    fn include_file(&self, filter: &PathFilter<'_>, path: &Path) -> bool {
        if filter.is_output_file(path) {
            return false;
        }

        match extension_of(path) {
            Some(ext) => filter.should_include_file(&ext),
            None => false,
        }
    }

    fn update_statistics(&self, f: impl FnOnce(&mut ScannerStatistics)) {
        let mut stats = self
            .statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }
}

/// Direct entries of a directory, without following symlinks
fn list_entries(path: &Path) -> std::result::Result<Vec<DirEntry>, walkdir::Error> {
    WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .collect()
}

/// Base name of a path, falling back to the whole path for roots like `/`
pub(crate) fn node_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn listing_error_reason(e: &walkdir::Error) -> String {
    match e.io_error() {
        Some(io) => io.to_string(),
        None => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scanner(config: &Config) -> Scanner {
        Scanner::new(config.clone(), Arc::new(ProgressBar::hidden()))
    }

    #[test]
    fn test_root_with_ignored_name_is_omitted() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("node_modules");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("index.js"), "x").unwrap();

        let config = Config::new(&root);
        assert_eq!(scanner(&config).scan().unwrap(), None);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().join("missing"));
        assert!(scanner(&config).scan().is_err());
    }

    #[test]
    fn test_depth_and_statistics() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/deep.rs"), "").unwrap();
        fs::write(dir.path().join("top.rs"), "").unwrap();
        fs::write(dir.path().join("skip.bin"), "").unwrap();

        let config = Config::new(dir.path());
        let scanner = scanner(&config);
        let root = scanner.scan().unwrap().unwrap();

        assert_eq!(root.depth, 0);
        let a = &root.children[0];
        assert_eq!((a.name.as_str(), a.depth), ("a", 1));
        let b = &a.children[0];
        assert_eq!((b.name.as_str(), b.depth), ("b", 2));
        assert_eq!(b.children[0].depth, 3);

        let stats = scanner.get_statistics();
        assert_eq!(stats.directories, 3);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.unreadable_directories, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_annotated() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.rs"), "").unwrap();
        fs::write(dir.path().join("open.rs"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not restrict root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let config = Config::new(dir.path());
        let scanner = scanner(&config);
        let root = scanner.scan().unwrap().unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let locked_node = &root.children[0];
        assert_eq!(locked_node.name, "locked");
        assert!(locked_node.children.is_empty());
        assert!(locked_node.error.is_some());
        assert_eq!(root.children[1].name, "open.rs");
        assert_eq!(scanner.get_statistics().unreadable_directories, 1);
    }
}
