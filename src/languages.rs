/*!
 * Extension classification for dumpmd
 *
 * Maps file extensions to default inclusion and to the tag used on fenced
 * code blocks. Extensions always carry their leading dot and are matched
 * case-sensitively.
 */

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

/// Extensions included when no custom list is given
pub static DEFAULT_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // .NET
        ".cs",
        ".csx",
        ".fs",
        ".fsx",
        ".vb",
        ".csproj",
        ".fsproj",
        ".vbproj",
        ".sln",
        ".props",
        ".targets",
        ".razor",
        ".cshtml",
        ".xaml",
        ".config",
        ".resx",
        // General purpose
        ".rs",
        ".py",
        ".js",
        ".jsx",
        ".mjs",
        ".ts",
        ".tsx",
        ".go",
        ".java",
        ".kt",
        ".swift",
        ".c",
        ".h",
        ".cpp",
        ".hpp",
        ".rb",
        ".php",
        ".sql",
        ".sh",
        ".ps1",
        ".vue",
        ".svelte",
        // Markup & data
        ".html",
        ".htm",
        ".xml",
        ".md",
        ".json",
        ".yml",
        ".yaml",
        ".toml",
        // Styling
        ".css",
        ".scss",
        ".sass",
        ".less",
    ]
});

/// Syntax highlighting tags by extension
static HIGHLIGHT_TAGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (".cs", "csharp"),
        (".csx", "csharp"),
        (".fs", "fsharp"),
        (".fsx", "fsharp"),
        (".vb", "vbnet"),
        (".csproj", "xml"),
        (".fsproj", "xml"),
        (".vbproj", "xml"),
        (".props", "xml"),
        (".targets", "xml"),
        (".config", "xml"),
        (".resx", "xml"),
        (".xaml", "xml"),
        (".xml", "xml"),
        (".razor", "razor"),
        (".cshtml", "razor"),
        (".rs", "rust"),
        (".py", "python"),
        (".js", "javascript"),
        (".jsx", "jsx"),
        (".mjs", "javascript"),
        (".ts", "typescript"),
        (".tsx", "tsx"),
        (".go", "go"),
        (".java", "java"),
        (".kt", "kotlin"),
        (".swift", "swift"),
        (".c", "c"),
        (".h", "c"),
        (".cpp", "cpp"),
        (".hpp", "cpp"),
        (".rb", "ruby"),
        (".php", "php"),
        (".sql", "sql"),
        (".sh", "bash"),
        (".ps1", "powershell"),
        (".vue", "vue"),
        (".svelte", "svelte"),
        (".html", "html"),
        (".htm", "html"),
        (".md", "markdown"),
        (".json", "json"),
        (".yml", "yaml"),
        (".yaml", "yaml"),
        (".toml", "toml"),
        (".css", "css"),
        (".scss", "scss"),
        (".sass", "sass"),
        (".less", "less"),
    ])
});

/// Whether an extension is part of the default inclusion set
pub fn is_default_extension(extension: &str) -> bool {
    DEFAULT_EXTENSIONS.contains(&extension)
}

/// Highlighting tag for a fenced code block, empty when unknown
pub fn highlight_tag(extension: &str) -> &'static str {
    HIGHLIGHT_TAGS.get(extension).copied().unwrap_or("")
}

/// Dot-prefixed extension of a path.
///
/// Dotfiles such as `.gitignore` and names without a dot have no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extensions_cover_dotnet_and_general() {
        for ext in [".cs", ".csproj", ".sln", ".razor", ".py", ".ts", ".css", ".json"] {
            assert!(is_default_extension(ext), "{} should be tracked", ext);
        }
        assert!(!is_default_extension(".exe"));
        assert!(!is_default_extension("cs"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(!is_default_extension(".CS"));
        assert_eq!(highlight_tag(".PY"), "");
    }

    #[test]
    fn test_highlight_tag() {
        assert_eq!(highlight_tag(".py"), "python");
        assert_eq!(highlight_tag(".cs"), "csharp");
        assert_eq!(highlight_tag(".csproj"), "xml");
        assert_eq!(highlight_tag(".unknown"), "");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("src/a.py")), Some(".py".to_string()));
        assert_eq!(
            extension_of(Path::new("App.sln")),
            Some(".sln".to_string())
        );
        assert_eq!(extension_of(Path::new("archive.tar.gz")), Some(".gz".to_string()));
        assert_eq!(extension_of(Path::new(".gitignore")), None);
        assert_eq!(extension_of(Path::new("Makefile")), None);
    }
}
