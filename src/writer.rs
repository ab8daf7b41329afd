/*!
 * Markdown writer implementation for dumpmd
 */

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use indicatif::ProgressBar;
use log::warn;
use rayon::prelude::*;

use crate::config::Config;
use crate::languages::{extension_of, highlight_tag};
use crate::report::FileReportInfo;
use crate::types::{NodeKind, TreeNode};
use crate::utils::{format_file_size, relative_display, resolve_base};

/// Statistics gathered while rendering file contents
#[derive(Debug, Clone, Default)]
pub struct RenderStatistics {
    /// Number of files whose content was embedded
    pub files_rendered: usize,
    /// Total number of lines
    pub total_lines: usize,
    /// Total number of characters
    pub total_chars: usize,
    /// Details for each file, keyed by displayed path
    pub file_details: HashMap<String, FileReportInfo>,
}

/// Outcome of reading one file for the content section
enum FileContent {
    Text(String),
    TooLarge(u64),
}

/// Markdown writer for directory contents
pub struct MarkdownWriter {
    /// Writer configuration
    config: Config,
    /// Directory that source headings are relative to
    base_dir: PathBuf,
    /// Progress bar, advanced once per rendered file
    progress: Arc<ProgressBar>,
    statistics: Arc<Mutex<RenderStatistics>>,
}

impl MarkdownWriter {
    /// Create a new markdown writer
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        let base_dir = resolve_base(&config.base_dir);
        Self {
            config,
            base_dir,
            progress,
            statistics: Arc::new(Mutex::new(RenderStatistics::default())),
        }
    }

    /// Get render statistics
    pub fn get_statistics(&self) -> RenderStatistics {
        self.statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Assemble the full document.
    ///
    /// Sections: title, solution analysis (when present), directory
    /// structure, source code.
    pub fn render_document(
        &self,
        title: &str,
        solutions: Option<&str>,
        tree: Option<&TreeNode>,
    ) -> String {
        let mut doc = format!("# Project Documentation: {}\n\n", title);

        if let Some(solutions) = solutions {
            doc.push_str(solutions);
        }

        doc.push_str("## Directory Structure\n\n```\n");
        if let Some(tree) = tree {
            doc.push_str(&self.render_structure(tree));
        }
        doc.push_str("```\n\n");

        doc.push_str("## Source Code\n\n");
        if let Some(tree) = tree {
            doc.push_str(&self.render_contents(tree));
        }

        doc
    }

    /// One line per entry below the root, two spaces of indent per level
    pub fn render_structure(&self, root: &TreeNode) -> String {
        let mut out = String::new();
        push_structure(root, &mut out);
        out
    }

    /// Heading and fenced block for every file, in pre-order
    pub fn render_contents(&self, root: &TreeNode) -> String {
        let fragments: Vec<String> = root
            .files()
            .par_iter()
            .map(|file| self.render_file(file))
            .collect();

        fragments.concat()
    }

    fn render_file(&self, node: &TreeNode) -> String {
        self.progress.inc(1);
        self.progress
            .set_message(format!("Current file: {}", node.name));

        let display = relative_display(&node.path, &self.base_dir);
        let mut out = format!("### {}\n\n", display);

        match self.read_content(&node.path) {
            Ok(FileContent::Text(content)) => {
                let tag = extension_of(&node.path).map_or("", |ext| highlight_tag(&ext));
                let fence = fence_for(&content);

                out.push_str(&fence);
                out.push_str(tag);
                out.push('\n');
                out.push_str(&content);
                if !content.is_empty() && !content.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&fence);
                out.push_str("\n\n");

                self.record(display, &content);
            }
            Ok(FileContent::TooLarge(size)) => {
                out.push_str(&format!(
                    "> File too large to include content. Size: {}\n\n",
                    format_file_size(size)
                ));
            }
            Err(e) => {
                warn!("Failed to read {}: {}", node.path.display(), e);
                out.push_str(&format!("> ⚠️ Error reading file: {}\n\n", e));
            }
        }

        out
    }

    /// Read a file as text, replacing invalid UTF-8
    fn read_content(&self, path: &Path) -> io::Result<FileContent> {
        if let Some(limit) = self.config.max_file_size {
            let size = fs::metadata(path)?.len();
            if size > limit {
                return Ok(FileContent::TooLarge(size));
            }
        }

        let bytes = fs::read(path)?;
        Ok(FileContent::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn record(&self, display: String, content: &str) {
        let info = FileReportInfo {
            lines: content.lines().count(),
            chars: content.chars().count(),
        };

        let mut stats = self
            .statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        stats.files_rendered += 1;
        stats.total_lines += info.lines;
        stats.total_chars += info.chars;
        stats.file_details.insert(display, info);
    }
}

/// Write a rendered document to `output_file`
pub fn write_document(output_file: &Path, document: &str) -> io::Result<()> {
    let file = File::create(output_file)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(document.as_bytes())?;
    writer.flush()
}

fn push_structure(node: &TreeNode, out: &mut String) {
    for child in &node.children {
        let indent = "  ".repeat(child.depth.saturating_sub(1));
        match child.kind {
            NodeKind::Directory => {
                out.push_str(&format!("{}📁 {}/", indent, child.name));
                if let Some(err) = &child.error {
                    out.push_str(&format!(" (unreadable: {})", err));
                }
                out.push('\n');
                push_structure(child, out);
            }
            NodeKind::File => out.push_str(&format!("{}📄 {}\n", indent, child.name)),
        }
    }
}

/// Backtick fence longer than any backtick run inside `content`, at least three
pub fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    "`".repeat((longest + 1).max(3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn writer(config: &Config) -> MarkdownWriter {
        MarkdownWriter::new(config.clone(), Arc::new(ProgressBar::hidden()))
    }

    #[test]
    fn test_fence_for() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("inline `code` here"), "```");
        assert_eq!(fence_for("```rust\nfn main() {}\n```"), "````");
        assert_eq!(fence_for("`````"), "``````");
    }

    #[test]
    fn test_render_structure() {
        let deep = TreeNode::directory(
            "/r/src/empty".into(),
            "empty".into(),
            2,
            vec![],
        );
        let src = TreeNode::directory(
            "/r/src".into(),
            "src".into(),
            1,
            vec![TreeNode::file("/r/src/main.rs".into(), "main.rs".into(), 2), deep],
        );
        let mut locked = TreeNode::directory("/r/locked".into(), "locked".into(), 1, vec![]);
        locked.error = Some("Permission denied".to_string());
        let root = TreeNode::directory(
            "/r".into(),
            "r".into(),
            0,
            vec![TreeNode::file("/r/README.md".into(), "README.md".into(), 1), src, locked],
        );

        let config = Config::new("/r");
        assert_eq!(
            writer(&config).render_structure(&root),
            "📁 locked/ (unreadable: Permission denied)\n\
             📁 src/\n  \
             📁 empty/\n  \
             📄 main.rs\n\
             📄 README.md\n"
        );
    }

    #[test]
    fn test_render_contents_lengthens_fence_and_notes_failures() {
        let dir = tempdir().unwrap();
        let root_path = fs::canonicalize(dir.path()).unwrap();
        fs::write(root_path.join("doc.md"), "```sh\nls\n```\n").unwrap();
        fs::write(root_path.join("big.rs"), "x".repeat(64)).unwrap();

        let root = TreeNode::directory(
            root_path.clone(),
            "root".into(),
            0,
            vec![
                TreeNode::file(root_path.join("doc.md"), "doc.md".into(), 1),
                TreeNode::file(root_path.join("big.rs"), "big.rs".into(), 1),
                TreeNode::file(root_path.join("gone.py"), "gone.py".into(), 1),
            ],
        );

        let mut config = Config::new(&root_path);
        config.max_file_size = Some(32);
        let writer = writer(&config);
        let contents = writer.render_contents(&root);

        assert!(contents.starts_with(
            "### big.rs\n\n\
             > File too large to include content. Size: 64 bytes\n\n\
             ### doc.md\n\n\
             ````markdown\n```sh\nls\n```\n````\n\n\
             ### gone.py\n\n\
             > ⚠️ Error reading file: "
        ));
        assert!(contents.ends_with("\n\n"));

        let stats = writer.get_statistics();
        assert_eq!(stats.files_rendered, 1);
        assert_eq!(stats.total_lines, 3);
    }

    #[test]
    fn test_render_document_section_order() {
        let config = Config::new("/r");
        let root = TreeNode::directory("/r".into(), "r".into(), 0, vec![]);
        let doc = writer(&config).render_document("r", Some("## Solution Analysis\n\n"), Some(&root));

        assert_eq!(
            doc,
            "# Project Documentation: r\n\n\
             ## Solution Analysis\n\n\
             ## Directory Structure\n\n```\n```\n\n\
             ## Source Code\n\n"
        );
    }
}
