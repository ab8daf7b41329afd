/*!
 * dumpmd - Generate a markdown document of a project's structure and sources
 *
 * This library walks a directory tree and renders a single markdown document
 * with the directory structure, the verbatim contents of source files and a
 * summary of any solution and project manifests, for use as context for Large
 * Language Models.
 */

pub mod config;
pub mod error;
pub mod filter;
pub mod languages;
pub mod manifest;
pub mod report;
pub mod scanner;
pub mod types;
pub mod utils;
pub mod writer;


use std::fs;
use std::sync::Arc;

use indicatif::ProgressBar;
use log::{debug, info};

// Re-export main components for easier access
pub use config::Config;
pub use error::{DumpMdError, Result};
pub use filter::PathFilter;
pub use manifest::{ManifestAnalyzer, ManifestError, SolutionAnalysis};
pub use report::{FileReportInfo, ReportFormat, Reporter, ScanReport};
pub use scanner::{Scanner, ScannerStatistics};
pub use types::{ManifestProject, NodeKind, PackageReference, TreeNode};
pub use utils::{count_files, format_file_size};
pub use writer::{write_document, MarkdownWriter, RenderStatistics};

use error::ResultExt;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A generated document together with what it took to build it
#[derive(Debug, Clone)]
pub struct Output {
    /// The assembled markdown document
    pub markdown: String,
    /// Tree statistics
    pub scan: ScannerStatistics,
    /// Content statistics
    pub render: RenderStatistics,
    /// Solution manifests analyzed
    pub solutions: usize,
    /// Project manifests analyzed
    pub projects: usize,
}

/// Run the whole pipeline for a configuration.
///
/// Manifest analysis runs first unless skipped, then the tree is built and
/// rendered. Nothing is written to disk.
pub fn generate(config: &Config, progress: Arc<ProgressBar>) -> Result<Output> {
    let root = fs::canonicalize(&config.target_dir)
        .with_context(|| format!("Failed to resolve {}", config.target_dir.display()))?;
    let title = scanner::node_name(&root);

    let analysis = if config.skip_manifests {
        debug!("Manifest analysis skipped");
        None
    } else {
        progress.set_message("Analyzing solution manifests");
        ManifestAnalyzer::new(config).analyze_all(&root)
    };
    if let Some(analysis) = &analysis {
        info!(
            "Analyzed {} solutions with {} projects",
            analysis.solutions, analysis.projects
        );
    }

    let scanner = Scanner::new(config.clone(), Arc::clone(&progress));
    let tree = scanner.scan()?;
    let scan = scanner.get_statistics();
    info!(
        "Scanned {} directories and {} files under {}",
        scan.directories,
        scan.files,
        root.display()
    );

    let writer = MarkdownWriter::new(config.clone(), progress);
    let markdown = writer.render_document(
        &title,
        analysis.as_ref().map(|a| a.markdown.as_str()),
        tree.as_ref(),
    );

    Ok(Output {
        markdown,
        scan,
        render: writer.get_statistics(),
        solutions: analysis.as_ref().map_or(0, |a| a.solutions),
        projects: analysis.as_ref().map_or(0, |a| a.projects),
    })
}

/// Generate the markdown document without progress reporting
pub fn generate_markdown(config: &Config) -> Result<String> {
    Ok(generate(config, Arc::new(ProgressBar::hidden()))?.markdown)
}
