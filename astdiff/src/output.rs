use crate::detector::{BatchOutcome, PairStatus};
use crate::report::MatchGroup;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Create a progress bar counting file builds and pair comparisons.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_progress_bar(total_steps: u64) -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_steps), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} steps ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("comparing...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.tick();
    pb
}

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        "║  AST Structural Similarity             ║".cyan().bold()
    )?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print batch statistics (files, pairs, failures).
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_batch_stats(writer: &mut impl Write, outcome: &BatchOutcome) -> std::io::Result<()> {
    let total_lines: usize = outcome.files.iter().map(|f| f.total_lines).sum();
    writeln!(
        writer,
        "{}",
        format!(
            "Compared {} files ({} lines) in {} pairs",
            outcome.files.len().to_string().bold(),
            total_lines.to_string().bold(),
            outcome.pairs.len().to_string().bold()
        )
        .dimmed()
    )?;

    let failed = outcome.failed_count();
    let degraded = outcome.degraded_count();
    if failed > 0 || degraded > 0 {
        writeln!(
            writer,
            "Failed: {}  Degraded: {}",
            failed.to_string().red().bold(),
            degraded.to_string().yellow().bold()
        )?;
    }
    if outcome.cancelled {
        writeln!(writer, "{}", "[WARN] Comparison was cancelled".yellow())?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Helper to create a styled table
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

fn similarity_color(similarity: f64) -> Color {
    if similarity >= 0.8 {
        Color::Red
    } else if similarity >= 0.5 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn status_color(status: &PairStatus) -> Color {
    match status {
        PairStatus::Success => Color::Green,
        PairStatus::Degraded => Color::Yellow,
        PairStatus::Failed(_) => Color::Red,
    }
}

/// Print one row per match group, most similar pairs first.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_match_groups(writer: &mut impl Write, groups: &[MatchGroup]) -> std::io::Result<()> {
    if groups.is_empty() {
        writeln!(writer, "{}", "No pairs to compare.".dimmed())?;
        return Ok(());
    }

    writeln!(writer, "{}", "Pair Similarity".bold().underline())?;
    let mut table = create_table(vec![
        "First", "Second", "Similarity", "Score", "Actions", "Status",
    ]);

    let mut sorted: Vec<&MatchGroup> = groups.iter().collect();
    sorted.sort_by(|a, b| b.score.similarity.total_cmp(&a.score.similarity));

    for g in sorted {
        let similarity = g.score.similarity;
        table.add_row(vec![
            Cell::new(&g.entries[0].display_name),
            Cell::new(&g.entries[1].display_name),
            Cell::new(format!("{:.1}%", similarity * 100.0))
                .fg(similarity_color(similarity))
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{}/{}", g.score.score, g.score.max_score))
                .set_alignment(CellAlignment::Right),
            Cell::new(g.actions.len()).set_alignment(CellAlignment::Right),
            Cell::new(g.status.label()).fg(status_color(&g.status)),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the edit actions of every group.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_group_details(writer: &mut impl Write, groups: &[MatchGroup]) -> std::io::Result<()> {
    for g in groups {
        writeln!(
            writer,
            "\n{} {} {}",
            g.entries[0].display_name.bold(),
            "<->".dimmed(),
            g.entries[1].display_name.bold()
        )?;
        if let PairStatus::Failed(kind) = &g.status {
            writeln!(writer, "  {}", kind.to_string().red())?;
            continue;
        }
        if g.actions.is_empty() {
            writeln!(writer, "  {}", "identical".green())?;
            continue;
        }
        for action in &g.actions {
            writeln!(writer, "  {}", action.describe())?;
        }
    }
    Ok(())
}
