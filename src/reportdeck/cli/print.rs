use colored::*;
use reportdeck::model::{Report, ReportKind};
use reportdeck::upload::{StatusKind, StatusMessage};
use reportdeck::view::ReportView;
use std::io::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 80;
const KIND_WIDTH: usize = 10;
const SIZE_WIDTH: usize = 8;
const DATE_WIDTH: usize = 11;
const PROGRESS_WIDTH: usize = 30;

pub fn print_view(view: &ReportView) {
    if view.shows_loading() || view.is_initially_empty || view.is_search_with_no_results {
        println!("{}", view.status_line().dimmed());
        return;
    }

    for (i, report) in view.visible.iter().enumerate() {
        print_report_line(i + 1, report);
    }
    println!();
    println!("{}", view.status_line().dimmed());
}

fn print_report_line(position: usize, report: &Report) {
    let idx_str = format!("{:>3}. ", position);
    let fixed_width = idx_str.width() + KIND_WIDTH + SIZE_WIDTH + DATE_WIDTH;
    let available = LINE_WIDTH.saturating_sub(fixed_width);

    let name = truncate_to_width(&report.name, available);
    let padding = available.saturating_sub(name.width());

    let kind = format!("{:<width$}", report.kind.to_string(), width = KIND_WIDTH);
    let kind_colored = match report.kind {
        ReportKind::Vibration => kind.yellow(),
        ReportKind::Thermal => kind.red(),
    };

    println!(
        "{}{}{}{}{}{}",
        idx_str.dimmed(),
        name,
        " ".repeat(padding),
        kind_colored,
        format!("{:>width$}", report.size, width = SIZE_WIDTH),
        format!("{:>width$}", report.date, width = DATE_WIDTH).dimmed()
    );
}

pub fn print_status(status: &StatusMessage) {
    match status.kind {
        StatusKind::None => {}
        StatusKind::Info => println!("{}", status.text.dimmed()),
        StatusKind::Success => println!("{}", status.text.green()),
        StatusKind::Error => println!("{}", status.text.red()),
    }
}

/// Inline, dismissable store error.
pub fn print_error_notice(error: &str) {
    println!("{} {}", "!".red().bold(), error.red());
}

pub fn print_notice(text: &str) {
    println!("{}", text.green());
}

/// Redraws the progress bar in place on stderr.
pub fn draw_progress(progress: u8) {
    let filled = PROGRESS_WIDTH * usize::from(progress.min(100)) / 100;
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(PROGRESS_WIDTH - filled)
    );
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r  {} {:>3}%", bar.cyan(), progress);
    if progress == 100 {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}

/// Terminates a progress line that stopped short of 100.
pub fn end_progress() {
    let _ = writeln!(std::io::stderr());
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}
