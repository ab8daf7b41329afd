/*!
 * Solution and project manifest analysis
 *
 * Solution files are read line by line: any line declaring a project is
 * searched for a quoted path ending in a project suffix. This is best-effort
 * extraction, not a grammar. Project files are parsed as XML with quick-xml.
 *
 * Failures never escape this module. A solution or project that cannot be
 * read or parsed is rendered as an inline note and its siblings are still
 * analyzed.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::Config;
use crate::filter::PathFilter;
use crate::types::{ManifestProject, PackageReference};
use crate::utils::{locale_cmp, relative_display, resolve_base};

/// Solution manifest file suffix
pub const SOLUTION_SUFFIX: &str = ".sln";

/// Project manifest file suffixes referenced from solutions
pub const PROJECT_SUFFIXES: [&str; 3] = [".csproj", ".fsproj", ".vbproj"];

/// Token that marks a project declaration line in a solution
const PROJECT_MARKER: &str = "Project(";

/// A quoted field ending in one of the project suffixes
static PROJECT_PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    let suffixes: Vec<String> = PROJECT_SUFFIXES.iter().map(|s| regex::escape(s)).collect();
    Regex::new(&format!(r#""([^"]*(?:{}))""#, suffixes.join("|"))).unwrap()
});

/// Errors raised while reading a single manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest could not be read
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The markup is not well-formed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute is not well-formed
    #[error("Invalid attribute: {0}")]
    Attr(#[from] AttrError),

    /// Element structure is broken
    #[error("Malformed project file: {0}")]
    Malformed(String),
}

/// Result of analyzing every solution under a root
#[derive(Debug, Clone, Default)]
pub struct SolutionAnalysis {
    /// Rendered `## Solution Analysis` section
    pub markdown: String,
    /// Number of solution manifests found
    pub solutions: usize,
    /// Number of project manifests rendered
    pub projects: usize,
}

/// Locates and summarizes solution and project manifests
pub struct ManifestAnalyzer<'a> {
    filter: PathFilter<'a>,
    base_dir: PathBuf,
}

impl<'a> ManifestAnalyzer<'a> {
    /// Create an analyzer sharing the scan's ignore rules
    pub fn new(config: &'a Config) -> Self {
        Self {
            filter: PathFilter::new(config),
            base_dir: resolve_base(&config.base_dir),
        }
    }

    /// Find files whose name ends with `suffix`, in tree order.
    ///
    /// Ignored directory names are pruned exactly as in the tree scan.
    /// Unreadable directories are skipped.
    pub fn find_manifests(&self, root: &Path, suffix: &str) -> Vec<PathBuf> {
        let walker = WalkDir::new(root)
            .sort_by(|a, b| {
                b.file_type()
                    .is_dir()
                    .cmp(&a.file_type().is_dir())
                    .then_with(|| {
                        locale_cmp(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
                    })
            })
            .into_iter()
            .filter_entry(|e| {
                !e.file_type().is_dir()
                    || !self.filter.should_skip_directory(&e.file_name().to_string_lossy())
            });

        let mut found = Vec::new();
        for entry in walker {
            match entry {
                Ok(e) if e.file_type().is_file() && e.file_name().to_string_lossy().ends_with(suffix) => {
                    found.push(e.into_path());
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry while searching for {}: {}", suffix, e),
            }
        }
        found
    }

    /// Render the solution analysis section, or `None` without solutions
    pub fn analyze_all(&self, root: &Path) -> Option<SolutionAnalysis> {
        let solutions = self.find_manifests(root, SOLUTION_SUFFIX);
        if solutions.is_empty() {
            debug!("No solution manifests under {}", root.display());
            return None;
        }

        let mut analysis = SolutionAnalysis {
            markdown: String::from("## Solution Analysis\n\n"),
            solutions: solutions.len(),
            projects: 0,
        };
        for solution in &solutions {
            let (fragment, projects) = self.solution_fragment(solution);
            analysis.markdown.push_str(&fragment);
            analysis.projects += projects;
        }

        Some(analysis)
    }

    /// Render a `###` fragment for one solution manifest
    pub fn analyze_solution(&self, path: &Path) -> String {
        self.solution_fragment(path).0
    }

    fn solution_fragment(&self, path: &Path) -> (String, usize) {
        let mut out = format!("### {}\n\n", relative_display(path, &self.base_dir));

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read solution {}: {}", path.display(), e);
                out.push_str(&error_note("Error analyzing solution", &e));
                return (out, 0);
            }
        };

        let solution_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut projects = 0;
        for reference in project_paths(&text) {
            let project_path = solution_dir.join(reference.replace('\\', "/"));
            if !project_path.is_file() {
                warn!(
                    "Project {} referenced from {} does not exist",
                    project_path.display(),
                    path.display()
                );
                continue;
            }

            out.push_str(&self.analyze_project(&project_path));
            projects += 1;
        }

        if projects == 0 {
            out.push_str("_No project references found._\n\n");
        }

        (out, projects)
    }

    /// Render a `####` fragment for one project manifest
    pub fn analyze_project(&self, path: &Path) -> String {
        let heading = format!("#### {}\n\n", relative_display(path, &self.base_dir));

        match parse_project(path) {
            Ok(project) => heading + &render_project(&project),
            Err(e) => {
                warn!("Failed to parse project {}: {}", path.display(), e);
                heading + &error_note("Error parsing project", &e)
            }
        }
    }
}

/// Quoted project paths declared in solution text, in order of appearance
pub fn project_paths(solution_text: &str) -> Vec<String> {
    solution_text
        .lines()
        .filter(|line| line.contains(PROJECT_MARKER))
        .flat_map(|line| {
            PROJECT_PATH_REGEX
                .captures_iter(line)
                .map(|caps| caps[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Read and parse a project manifest
pub fn parse_project(path: &Path) -> Result<ManifestProject, ManifestError> {
    let text = fs::read_to_string(path)?;
    parse_project_str(path, &text)
}

/// Which top-level group the parser is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Group {
    #[default]
    None,
    FirstProperty,
    FirstItem,
    Other,
}

/// Element whose text is being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    TargetFramework,
    TargetFrameworks,
    Version,
}

#[derive(Default)]
struct ProjectParser {
    stack: Vec<Vec<u8>>,
    property_groups: usize,
    item_groups: usize,
    group: Group,
    field: Option<Field>,
    text: String,
    target_framework: Option<String>,
    target_frameworks: Option<String>,
    pending: Option<PackageReference>,
    packages: Vec<PackageReference>,
}

impl ProjectParser {
    /// Handle an opening tag; `stack` does not yet contain it
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), ManifestError> {
        let depth = self.stack.len();
        let local = e.local_name();

        match (depth, local.as_ref()) {
            (1, b"PropertyGroup") if !empty => {
                self.property_groups += 1;
                self.group = if self.property_groups == 1 {
                    Group::FirstProperty
                } else {
                    Group::Other
                };
            }
            (1, b"ItemGroup") if !empty => {
                self.item_groups += 1;
                self.group = if self.item_groups == 1 {
                    Group::FirstItem
                } else {
                    Group::Other
                };
            }
            (2, b"TargetFramework") if self.group == Group::FirstProperty && !empty => {
                self.begin_field(Field::TargetFramework);
            }
            (2, b"TargetFrameworks") if self.group == Group::FirstProperty && !empty => {
                self.begin_field(Field::TargetFrameworks);
            }
            (2, b"PackageReference") if self.group == Group::FirstItem => {
                let name = attribute(e, b"Include")?.or(attribute(e, b"Update")?);
                let Some(name) = name else {
                    debug!("PackageReference without Include or Update attribute");
                    return Ok(());
                };

                let package = PackageReference {
                    name,
                    version: attribute(e, b"Version")?,
                };
                if empty {
                    self.packages.push(package);
                } else {
                    self.pending = Some(package);
                }
            }
            (3, b"Version") if self.pending.is_some() && !empty => {
                self.begin_field(Field::Version);
            }
            _ => {}
        }

        Ok(())
    }

    /// Handle a closing tag; `stack` still contains it
    fn close(&mut self, name: &[u8]) -> Result<(), ManifestError> {
        let open = self
            .stack
            .pop()
            .ok_or_else(|| ManifestError::Malformed("unexpected closing tag".to_string()))?;
        if open != name {
            return Err(ManifestError::Malformed(format!(
                "expected </{}>, found </{}>",
                String::from_utf8_lossy(&open),
                String::from_utf8_lossy(name)
            )));
        }

        let depth = self.stack.len();
        if let Some(field) = self.field.filter(|&f| field_depth(f) == depth) {
            let value = std::mem::take(&mut self.text).trim().to_string();
            self.field = None;
            match field {
                Field::TargetFramework => {
                    self.target_framework.get_or_insert(value);
                }
                Field::TargetFrameworks => {
                    self.target_frameworks.get_or_insert(value);
                }
                Field::Version => {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.version = Some(value);
                    }
                }
            }
        }

        match depth {
            2 => {
                if let Some(package) = self.pending.take() {
                    self.packages.push(package);
                }
            }
            1 => self.group = Group::None,
            _ => {}
        }

        Ok(())
    }

    fn begin_field(&mut self, field: Field) {
        self.field = Some(field);
        self.text.clear();
    }
}

/// Depth of the stack after a field element is popped
fn field_depth(field: Field) -> usize {
    match field {
        Field::Version => 3,
        Field::TargetFramework | Field::TargetFrameworks => 2,
    }
}

/// Parse project manifest text
pub fn parse_project_str(path: &Path, text: &str) -> Result<ManifestProject, ManifestError> {
    let mut reader = Reader::from_str(text);
    let mut parser = ProjectParser::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                parser.open(&e, false)?;
                parser.stack.push(e.name().as_ref().to_vec());
            }
            Event::Empty(e) => parser.open(&e, true)?,
            Event::End(e) => parser.close(e.name().as_ref())?,
            Event::Text(t) if parser.field.is_some() => parser.text.push_str(&t.unescape()?),
            Event::CData(t) if parser.field.is_some() => {
                parser.text.push_str(&String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = parser.stack.last() {
        return Err(ManifestError::Malformed(format!(
            "unclosed element <{}>",
            String::from_utf8_lossy(open)
        )));
    }

    let target_framework = parser
        .target_framework
        .or(parser.target_frameworks)
        .filter(|f| !f.is_empty());

    Ok(ManifestProject {
        file_path: path.to_path_buf(),
        target_framework,
        package_references: parser.packages,
    })
}

/// Trimmed, unescaped value of an attribute
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ManifestError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.trim().to_string()));
        }
    }
    Ok(None)
}

/// Markdown summary of a parsed project
pub fn render_project(project: &ManifestProject) -> String {
    let mut out = String::new();

    if let Some(framework) = &project.target_framework {
        out.push_str(&format!("- **Target Framework:** {}\n", framework));
    }

    if !project.package_references.is_empty() {
        out.push_str("- **Package References:**\n");
        for package in &project.package_references {
            match &package.version {
                Some(version) => out.push_str(&format!("  - {} ({})\n", package.name, version)),
                None => out.push_str(&format!("  - {}\n", package.name)),
            }
        }
    }

    if out.is_empty() {
        out.push_str("_No target framework or package references declared._\n");
    }
    out.push('\n');
    out
}

fn error_note(context: &str, e: &dyn std::fmt::Display) -> String {
    format!("> ⚠️ {}: {}\n\n", context, e)
}
