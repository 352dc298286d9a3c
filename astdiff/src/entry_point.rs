use crate::cli::{Cli, WeightArgs};
use crate::config::Config;
use crate::detector::{
    AstDiffDetector, BatchOutcome, CancellationToken, DetectorOptions, FileRef, MemoryFile,
};
use crate::diff::ActionKind;
use crate::report::{MatchGroup, PostProcessor};
use crate::scoring::DEFAULT_PER_NODE_CEILING;
use crate::utils::{collect_source_files, merge_exclude_folders, normalize_display_path};
use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// JSON document written by `--json`.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    files: &'a [FileRef],
    groups: &'a [MatchGroup],
    failed: usize,
    degraded: usize,
    cancelled: bool,
}

/// Runs the comparison with the given arguments.
///
/// # Errors
///
/// Returns an error if the batch cannot start or output cannot be written.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run astdiff with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
/// Returns exit code 1 for invalid arguments, invalid settings, missing paths
/// or pairs that failed to compare, 0 otherwise.
///
/// # Errors
///
/// Returns an error if the batch cannot start or output cannot be written.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["astdiff".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(1);
            }
        },
    };

    crate::telemetry::init_tracing(cli_var.output.verbose);

    let paths = if cli_var.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli_var.paths.clone()
    };
    for path in &paths {
        if !path.exists() {
            eprintln!(
                "Error: The file or directory '{}' does not exist.",
                path.display()
            );
            return Ok(1);
        }
    }

    let config = Config::load_from_path(&paths[0]);
    let mut settings = config.astdiff.clone();
    if let Some(jobs) = cli_var.jobs {
        settings.jobs = Some(jobs);
    }
    if let Some(ceiling) = cli_var.per_node_ceiling {
        settings.per_node_ceiling = Some(ceiling);
    }
    apply_weight_overrides(&mut settings.weights, &cli_var.weights);
    if let Err(e) = settings.validate() {
        eprintln!("Error: {e}");
        return Ok(1);
    }

    let exclude_folders = merge_exclude_folders(
        settings
            .exclude_folders
            .iter()
            .flatten()
            .chain(&cli_var.exclude_folders)
            .cloned(),
    );

    let options = DetectorOptions {
        params: settings.weights,
        matcher: settings.matcher,
        per_node_ceiling: settings.per_node_ceiling.unwrap_or(DEFAULT_PER_NODE_CEILING),
        jobs: settings.jobs.unwrap_or(0),
    };

    if cli_var.output.verbose && !cli_var.output.json {
        eprintln!("[VERBOSE] astdiff v{}", env!("CARGO_PKG_VERSION"));
        if let Some(path) = &config.config_file_path {
            eprintln!("[VERBOSE] Config: {}", normalize_display_path(path));
        }
        eprintln!("[VERBOSE] Options: {options:?}");
        eprintln!("[VERBOSE] Excludes: {exclude_folders:?}");
        eprintln!();
    }

    let files = read_sources(
        &collect_source_files(&paths, &exclude_folders, cli_var.output.verbose),
        cli_var.output.verbose,
    );

    let mut detector = AstDiffDetector::new(options);
    let progress = (!cli_var.output.json).then(|| Arc::new(crate::output::create_progress_bar(0)));
    if let Some(pb) = &progress {
        detector = detector.with_progress_bar(Arc::clone(pb));
    }

    let outcome = detector.run(&files, &CancellationToken::new())?;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let groups = PostProcessor.process(&outcome);

    if cli_var.output.json {
        write_json(writer, &outcome, &groups)?;
    } else {
        crate::output::print_header(writer)?;
        crate::output::print_batch_stats(writer, &outcome)?;
        crate::output::print_match_groups(writer, &groups)?;
        if cli_var.output.details {
            crate::output::print_group_details(writer, &groups)?;
        }
    }
    writer.flush()?;

    Ok(i32::from(outcome.failed_count() > 0))
}

fn apply_weight_overrides(params: &mut crate::scoring::ComparisonParams, args: &WeightArgs) {
    let overrides = [
        (ActionKind::SingleInsert, args.weight_single_insert),
        (ActionKind::SingleDelete, args.weight_single_delete),
        (ActionKind::SingleUpdate, args.weight_single_update),
        (ActionKind::TreeMove, args.weight_tree_move),
        (ActionKind::TreeInsert, args.weight_tree_insert),
        (ActionKind::TreeDelete, args.weight_tree_delete),
    ];
    for (kind, weight) in overrides {
        if let Some(weight) = weight {
            params.set_weight(kind, weight);
        }
    }
}

/// Read every path into memory. Unreadable files are skipped with a warning.
fn read_sources(paths: &[PathBuf], verbose: bool) -> Vec<MemoryFile> {
    paths
        .iter()
        .filter_map(|path| match std::fs::read(path) {
            Ok(bytes) => Some((path, bytes)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                if verbose {
                    eprintln!("[VERBOSE] Skipping {}: {e}", path.display());
                }
                None
            }
        })
        .enumerate()
        .map(|(id, (path, bytes))| MemoryFile::new(id as u64, normalize_display_path(path), bytes))
        .collect()
}

fn write_json<W: std::io::Write>(
    writer: &mut W,
    outcome: &BatchOutcome,
    groups: &[MatchGroup],
) -> Result<()> {
    let report = JsonReport {
        files: &outcome.files,
        groups,
        failed: outcome.failed_count(),
        degraded: outcome.degraded_count(),
        cancelled: outcome.cancelled,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
