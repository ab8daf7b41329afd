/*!
 * Command-line interface for dumpmd
 */

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, LevelFilter};
use rayon::ThreadPoolBuilder;

use dumpmd::config::{Args, Config};
use dumpmd::report::{ReportFormat, Reporter, ScanReport};
use dumpmd::utils::count_files;
use dumpmd::writer::write_document;

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let config = Config::from_args(args);
    init_logging(config.verbose);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the log sink; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(config: &Config) -> dumpmd::Result<()> {
    config.validate()?;

    // Configure thread pool
    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        eprintln!("Warning: Failed to set thread pool size: {}", e);
    }

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_prefix("📊 Setup");
    progress.set_message(format!(
        "📂 Scanning directory: {}",
        config.target_dir.display()
    ));

    // Count files for progress tracking
    let total_files = count_files(&config.target_dir, config);
    progress.set_length(total_files);
    progress.set_prefix("📊 Processing");

    let start_time = Instant::now();

    let output = dumpmd::generate(config, Arc::new(progress.clone()))?;
    write_document(&config.output_file, &output.markdown)?;

    let duration = start_time.elapsed();
    progress.finish_and_clear();

    let scan_report = ScanReport {
        output_file: config.output_file.display().to_string(),
        generated_at: Local::now(),
        duration,
        directories: output.scan.directories,
        unreadable_directories: output.scan.unreadable_directories,
        files_processed: output.render.files_rendered,
        total_lines: output.render.total_lines,
        total_chars: output.render.total_chars,
        solutions: output.solutions,
        projects: output.projects,
        file_details: output.render.file_details,
    };

    let reporter = Reporter::new(ReportFormat::ConsoleTable);
    reporter.print_report(&scan_report);

    Ok(())
}
