/*!
 * Path filtering for dumpmd
 */

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Decides which directories and files take part in a scan
#[derive(Debug, Clone)]
pub struct PathFilter<'a> {
    ignored_dirs: &'a HashSet<String>,
    included_extensions: &'a HashSet<String>,
    /// Absolute location of the generated document
    output_file: Option<PathBuf>,
}

impl<'a> PathFilter<'a> {
    /// Create a filter over the configured sets
    pub fn new(config: &'a Config) -> Self {
        Self {
            ignored_dirs: &config.ignored_dirs,
            included_extensions: &config.included_extensions,
            output_file: resolve_output_file(&config.output_file),
        }
    }

    /// True iff the basename is an ignored directory name, at any depth
    pub fn should_skip_directory(&self, basename: &str) -> bool {
        self.ignored_dirs.contains(basename)
    }

    /// True iff the dot-prefixed extension is included
    pub fn should_include_file(&self, extension: &str) -> bool {
        self.included_extensions.contains(extension)
    }

    /// Whether a path is the document being generated
    pub fn is_output_file(&self, path: &Path) -> bool {
        self.output_file.as_deref() == Some(path)
    }
}

/// Absolute output path, resolved through its parent so it does not need to exist yet
fn resolve_output_file(output_file: &Path) -> Option<PathBuf> {
    let file_name = output_file.file_name()?;
    let parent = match output_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    fs::canonicalize(parent).ok().map(|p| p.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_should_skip_directory_by_name() {
        let config = Config::new(".");
        let filter = PathFilter::new(&config);

        assert!(filter.should_skip_directory("node_modules"));
        assert!(filter.should_skip_directory("bin"));
        assert!(!filter.should_skip_directory("src"));
        // Names, not paths
        assert!(!filter.should_skip_directory("src/node_modules"));
    }

    #[test]
    fn test_should_include_file_uses_configured_set() {
        let config = Config::new(".").with_extensions(["py"]);
        let filter = PathFilter::new(&config);

        assert!(filter.should_include_file(".py"));
        assert!(!filter.should_include_file(".rs"));
        assert!(!filter.should_include_file("py"));
    }

    #[test]
    fn test_is_output_file() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.output_file = dir.path().join("out.md");
        let filter = PathFilter::new(&config);

        let root = fs::canonicalize(dir.path()).unwrap();
        assert!(filter.is_output_file(&root.join("out.md")));
        assert!(!filter.is_output_file(&root.join("other.md")));
    }
}
