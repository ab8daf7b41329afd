/*!
 * Reporting functionality for dumpmd
 *
 * Prints a summary of a run using the tabled library for clean, consistent
 * table rendering.
 */

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

/// Information about a file in the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileReportInfo {
    /// Number of lines in the file
    pub lines: usize,
    /// Number of characters in the file
    pub chars: usize,
}

/// Statistics for a run
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Output file path
    pub output_file: String,
    /// When the document was generated
    pub generated_at: DateTime<Local>,
    /// Time taken to scan and render
    pub duration: Duration,
    /// Number of directories in the tree
    pub directories: usize,
    /// Number of sub-directories that could not be listed
    pub unreadable_directories: usize,
    /// Number of files embedded
    pub files_processed: usize,
    /// Total number of lines
    pub total_lines: usize,
    /// Total number of characters
    pub total_chars: usize,
    /// Solution manifests analyzed
    pub solutions: usize,
    /// Project manifests analyzed
    pub projects: usize,
    /// Details for each file
    pub file_details: HashMap<String, FileReportInfo>,
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for run results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string based on run statistics
    pub fn generate_report(&self, report: &ScanReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &ScanReport) {
        println!("\n{}", self.generate_report(report));
    }

    // Keep the last path segments that fit in max_len
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut current_len = 3; // "..."
        let mut segments = Vec::new();
        for part in path.split('/').rev() {
            let part_len = part.chars().count() + 1;
            if current_len + part_len > max_len {
                break;
            }
            segments.push(part);
            current_len += part_len;
        }

        if segments.is_empty() {
            let tail: String = path
                .chars()
                .rev()
                .take(max_len.saturating_sub(3))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return format!("...{}", tail);
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn create_summary_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "📂 Output File".to_string(),
                value: report.output_file.clone(),
            },
            SummaryRow {
                key: "🕒 Generated".to_string(),
                value: report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📁 Directories".to_string(),
                value: self.format_number(report.directories),
            },
            SummaryRow {
                key: "📄 Files Processed".to_string(),
                value: self.format_number(report.files_processed),
            },
            SummaryRow {
                key: "📝 Total Lines".to_string(),
                value: self.format_number(report.total_lines),
            },
            SummaryRow {
                key: "📦 LLM Tokens".to_string(),
                value: format!(
                    "{} tokens (estimated)",
                    self.format_number(report.total_chars / 4)
                ),
            },
        ];

        if report.solutions > 0 {
            rows.push(SummaryRow {
                key: "🧩 Solutions".to_string(),
                value: format!(
                    "{} ({} projects)",
                    report.solutions, report.projects
                ),
            });
        }

        if report.unreadable_directories > 0 {
            rows.push(SummaryRow {
                key: "⚠️ Unreadable Directories".to_string(),
                value: report.unreadable_directories.to_string(),
            });
        }

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Est. Tokens")]
            tokens: String,
        }

        // Largest first, path as tie-break
        let mut files: Vec<_> = report.file_details.iter().collect();
        files.sort_by(|(pa, a), (pb, b)| b.chars.cmp(&a.chars).then_with(|| pa.cmp(pb)));

        let files_to_show = if files.len() > 15 {
            &files[0..10]
        } else {
            &files[..]
        };

        let rows: Vec<FileRow> = files_to_show
            .iter()
            .map(|(path, info)| FileRow {
                path: self.format_path(path, 60),
                lines: self.format_number(info.lines),
                tokens: self.format_number(info.chars / 4),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, report: &ScanReport) -> String {
        let summary_table = self.create_summary_table(report);
        let files_table = self.create_files_table(report);

        let summary_title = "✅  DOCUMENT COMPLETE";
        let files_title = if report.file_details.len() > 15 {
            "📋  TOP 10 LARGEST FILES BY CHARACTER COUNT  📋"
        } else {
            "📋  PROCESSED FILES"
        };

        format!(
            "{}\n{}\n\n{}\n{}",
            files_title, files_table, summary_title, summary_table
        )
    }
}
