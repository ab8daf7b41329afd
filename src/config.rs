/*!
 * Configuration handling for dumpmd
 */

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::ensure;
use crate::error::Result;
use crate::languages::DEFAULT_EXTENSIONS;
use crate::utils::DEFAULT_IGNORED_DIRS;

/// Default output file name
pub const DEFAULT_OUTPUT_FILE: &str = ".dumpmd.context.md";

/// Command-line arguments for dumpmd
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "dumpmd",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate a markdown document of a project's structure and sources",
    long_about = "Walks a directory, lists its structure and embeds the contents of its source files in a single markdown document. Solution and project manifests are summarized with their target frameworks and package references."
)]
pub struct Args {
    /// Target directory to process
    #[clap(default_value = ".")]
    pub directory_path: String,

    /// Output markdown file name
    #[clap(default_value = DEFAULT_OUTPUT_FILE)]
    pub output_file: String,

    /// Comma-separated directory names to ignore, in addition to the defaults
    #[clap(long, value_delimiter = ',')]
    pub ignore_dirs: Vec<String>,

    /// Comma-separated extensions to include (replaces the default list)
    #[clap(long, value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Skip solution and project manifest analysis
    #[clap(long)]
    pub skip_manifests: bool,

    /// Number of threads to use for processing
    #[clap(long, default_value = "4")]
    pub threads: usize,

    /// Replace the content of files larger than this many bytes with a size note
    #[clap(long)]
    pub max_file_size: Option<u64>,

    /// Print diagnostic output
    #[clap(short, long)]
    pub verbose: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Scan configuration shared by every stage of the pipeline
#[derive(Clone, Debug)]
pub struct Config {
    /// Target directory to process
    pub target_dir: PathBuf,

    /// Output markdown file path
    pub output_file: PathBuf,

    /// Directory that headings in the source section are relative to
    pub base_dir: PathBuf,

    /// Directory basenames whose subtrees are never visited
    pub ignored_dirs: HashSet<String>,

    /// Dot-prefixed extensions that qualify a file for inclusion
    pub included_extensions: HashSet<String>,

    /// Skip solution and project manifest analysis
    pub skip_manifests: bool,

    /// Largest file whose content is embedded; every file when unset
    pub max_file_size: Option<u64>,

    /// Number of threads to use for processing
    pub num_threads: usize,

    /// Emit diagnostic logging
    pub verbose: bool,
}

impl Config {
    /// Configuration with the default ignore and extension sets
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        let target_dir = target_dir.into();
        Self {
            output_file: target_dir.join(DEFAULT_OUTPUT_FILE),
            base_dir: target_dir.clone(),
            target_dir,
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|d| d.to_string()).collect(),
            included_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            skip_manifests: false,
            max_file_size: None,
            num_threads: 4,
            verbose: false,
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        let mut config = Self::new(PathBuf::from(&args.directory_path));

        config.output_file = PathBuf::from(args.output_file);
        config.base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        config.ignored_dirs.extend(
            args.ignore_dirs
                .into_iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        );
        if !args.extensions.is_empty() {
            config.included_extensions = args
                .extensions
                .iter()
                .filter_map(|e| normalize_extension(e))
                .collect();
        }
        config.skip_manifests = args.skip_manifests;
        config.max_file_size = args.max_file_size;
        config.num_threads = args.threads;
        config.verbose = args.verbose;

        config
    }

    /// Replace the extension set, adding missing leading dots
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.included_extensions = extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.target_dir.is_dir(),
            PathNotFound,
            "Target directory not found: {}",
            self.target_dir.display()
        );

        // Check if output file directory exists
        if let Some(parent) = self.output_file.parent() {
            ensure!(
                parent.as_os_str().is_empty() || parent.exists(),
                PathNotFound,
                "Output directory not found: {}",
                parent.display()
            );
        }

        ensure!(
            !self.included_extensions.is_empty(),
            Config,
            "At least one file extension must be included"
        );
        ensure!(
            self.num_threads > 0,
            InvalidArgument,
            "Thread count must be at least 1"
        );

        Ok(())
    }
}

/// Trim an extension and make sure it starts with a dot
fn normalize_extension(extension: &str) -> Option<String> {
    let trimmed = extension.trim();
    match trimmed {
        "" | "." => None,
        ext if ext.starts_with('.') => Some(ext.to_string()),
        ext => Some(format!(".{}", ext)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extensions_are_normalized() {
        let args = Args::parse_from(["dumpmd", ".", "out.md", "--extensions", "py, .rs,,"]);
        let config = Config::from_args(args);

        let mut extensions: Vec<_> = config.included_extensions.into_iter().collect();
        extensions.sort();
        assert_eq!(extensions, vec![".py".to_string(), ".rs".to_string()]);
    }

    #[test]
    fn test_ignore_dirs_extend_defaults() {
        let args = Args::parse_from(["dumpmd", "--ignore-dirs", "generated,fixtures"]);
        let config = Config::from_args(args);

        assert!(config.ignored_dirs.contains("generated"));
        assert!(config.ignored_dirs.contains("fixtures"));
        assert!(config.ignored_dirs.contains("node_modules"));
        assert_eq!(config.output_file, PathBuf::from(DEFAULT_OUTPUT_FILE));
    }

    #[test]
    fn test_validate() {
        let dir = tempdir().unwrap();
        assert!(Config::new(dir.path()).validate().is_ok());

        let missing = Config::new(dir.path().join("missing"));
        assert!(missing.validate().is_err());

        let empty = Config::new(dir.path()).with_extensions(Vec::<String>::new());
        assert!(empty.validate().is_err());
    }
}
