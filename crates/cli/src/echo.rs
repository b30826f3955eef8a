use owo_colors::OwoColorize;
use quire_core::{ArchiveSummary, ProgressState, PublicationConfig};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Quire".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Archive newsletter publications to HTML and plain text\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the resolved publication list to stdout
pub fn print_publications(configs: &[PublicationConfig]) {
    for config in configs {
        println!(
            "{}\t{}\t{}\tdetail_pages={}\tskip_existing={}",
            config.handle,
            config.base_url,
            config.output_directory.join(&config.handle).display(),
            config.detail_pages,
            config.skip_existing
        );
    }
}

/// Print one progress line per publication in flight
pub fn print_progress(entries: &[(String, ProgressState)]) {
    for (handle, state) in entries {
        let count = match state.total {
            Some(total) => format!("{}/{}", state.seen, total),
            None => state.seen.to_string(),
        };
        eprintln!("  {} {} {}", handle.bright_white(), state.phase.to_string().dimmed(), count.bright_cyan());
    }
}

/// Print the summary of one publication
pub fn print_summary(summary: &ArchiveSummary) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", summary.handle.bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Records:".dimmed(), summary.records.to_string().bright_white());
    eprintln!("  {} {}", "Downloaded:".dimmed(), summary.downloaded.to_string().bright_green());
    eprintln!("  {} {}", "Already archived:".dimmed(), summary.skipped_existing.to_string().bright_white());

    if summary.missing_body > 0 {
        eprintln!("  {} {}", "Missing body:".dimmed(), summary.missing_body.to_string().bright_yellow());
    }
    if summary.inaccessible > 0 {
        eprintln!("  {} {}", "Inaccessible:".dimmed(), summary.inaccessible.to_string().bright_yellow());
    }
    if summary.failed > 0 {
        eprintln!("  {} {}", "Failed:".dimmed(), summary.failed.to_string().bright_red());
    }
}

/// Print elapsed time with color coding
pub fn print_elapsed(duration: std::time::Duration) {
    let secs = duration.as_secs_f64();
    let label = format!("{:.1}s", secs);
    if secs < 60.0 {
        eprintln!("  {} {}", "Elapsed:".dimmed(), label.green());
    } else if secs < 600.0 {
        eprintln!("  {} {}", "Elapsed:".dimmed(), label.bright_yellow());
    } else {
        eprintln!("  {} {}", "Elapsed:".dimmed(), label.bright_red());
    }
}
