/*!
 * Integration tests for the public dumpmd API
 */

use std::fs;
use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use dumpmd::manifest::{parse_project, SOLUTION_SUFFIX};
use dumpmd::writer::write_document;
use dumpmd::{generate, Config, ManifestAnalyzer, Scanner};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_solution(root: &Path) {
    write(
        root,
        "Inventory.sln",
        "Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Inventory.Api\", \"src\\Inventory.Api\\Inventory.Api.csproj\", \"{0B1C}\"\nEndProject\n",
    );
    write(
        root,
        "src/Inventory.Api/Inventory.Api.csproj",
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project Sdk="Microsoft.NET.Sdk.Web">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <Nullable>enable</Nullable>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Swashbuckle.AspNetCore" Version="6.5.0" />
    <PackageReference Include="Microsoft.EntityFrameworkCore" Version="8.0.0" />
  </ItemGroup>
</Project>
"#,
    );
    write(root, "src/Inventory.Api/Program.cs", "var builder = WebApplication.CreateBuilder(args);\n");
    write(root, "src/Inventory.Api/bin/Debug/Inventory.Api.dll.config", "<configuration />");
    write(root, "src/Inventory.Api/appsettings.json", "{ \"Logging\": {} }\n");
}

#[test]
fn test_generate_reports_statistics() {
    let dir = tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    sample_solution(&root);

    let mut config = Config::new(&root);
    config.base_dir = root.clone();
    let output = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    assert_eq!(output.solutions, 1);
    assert_eq!(output.projects, 1);
    // root, src, Inventory.Api
    assert_eq!(output.scan.directories, 3);
    // sln, csproj, Program.cs, appsettings.json
    assert_eq!(output.scan.files, 4);
    assert_eq!(output.render.files_rendered, 4);
    assert!(output
        .render
        .file_details
        .contains_key("src/Inventory.Api/Program.cs"));

    assert!(output.markdown.contains(
        "#### src/Inventory.Api/Inventory.Api.csproj\n\n\
         - **Target Framework:** net8.0\n\
         - **Package References:**\n  \
         - Swashbuckle.AspNetCore (6.5.0)\n  \
         - Microsoft.EntityFrameworkCore (8.0.0)\n\n"
    ));
    assert!(!output.markdown.contains("bin/"));
}

#[test]
fn test_written_document_matches_generated_markdown() {
    let dir = tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    sample_solution(&root);

    let mut config = Config::new(&root);
    config.output_file = root.join("CONTEXT.md");
    let output = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    write_document(&config.output_file, &output.markdown).unwrap();

    assert_eq!(fs::read_to_string(&config.output_file).unwrap(), output.markdown);
}

#[test]
fn test_components_compose() {
    let dir = tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    sample_solution(&root);

    let config = Config::new(&root);
    let analyzer = ManifestAnalyzer::new(&config);
    let solutions = analyzer.find_manifests(&root, SOLUTION_SUFFIX);
    assert_eq!(solutions, vec![root.join("Inventory.sln")]);

    let project = parse_project(&root.join("src/Inventory.Api/Inventory.Api.csproj")).unwrap();
    assert_eq!(project.target_framework.as_deref(), Some("net8.0"));
    assert_eq!(project.package_references.len(), 2);

    let scanner = Scanner::new(config.clone(), Arc::new(ProgressBar::hidden()));
    let tree = scanner.scan().unwrap().unwrap();
    let names: Vec<_> = tree.files().iter().map(|f| f.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            "appsettings.json",
            "Inventory.Api.csproj",
            "Program.cs",
            "Inventory.sln"
        ]
    );
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path().join("does-not-exist"));

    assert!(config.validate().is_err());
    assert!(generate(&config, Arc::new(ProgressBar::hidden())).is_err());
}
