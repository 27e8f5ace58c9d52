//! # Rendering
//!
//! Turns command results into terminal text. Every renderer returns a
//! `String`; printing is left to the handlers in `commands.rs`, which keeps
//! these functions testable with colors switched off.
//!
//! Layout math (widths, truncation, padding) runs on the plain text and
//! styles are applied afterwards, so ANSI codes never count toward a column.

use super::styles::DIARCH_THEME;
use chrono::{DateTime, NaiveDate, Utc};
use colored::Colorize;
use diarch::catalog::{category_label, CatalogStats, CatalogView, EmptyState, FilterOptions, Layout};
use diarch::commands::{CmdMessage, MessageLevel, StorageReport};
use diarch::index::DisplayRecord;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Outer width of one grid card, borders included.
pub const CARD_WIDTH: usize = 36;
const CARD_GAP: usize = 2;
/// Fallback when the terminal size is unknown.
pub const DEFAULT_WIDTH: usize = 100;
const TIME_WIDTH: usize = 16;
const BAR_CHAR: &str = "█";

pub fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
        }
    }
}

/// Same as [`print_messages`] but to stderr, for session notices.
pub fn eprint_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => eprintln!("{}", message.content.dimmed()),
            MessageLevel::Success => eprintln!("{}", message.content.green()),
            MessageLevel::Warning => eprintln!("{}", message.content.yellow()),
        }
    }
}

/// The catalog as cards or rows, followed by the filter options.
pub fn render_catalog(view: &CatalogView, width: usize) -> String {
    let mut out = String::new();

    match view.empty {
        Some(state) => out.push_str(&render_empty(state)),
        None => {
            let body = match view.layout {
                Layout::Grid => render_grid(&view.records, width),
                Layout::List => render_list(&view.records, width),
            };
            out.push_str(&body);
            if view.records.len() < view.total {
                out.push('\n');
                out.push_str(&format!(
                    "{}\n",
                    DIARCH_THEME.meta.apply_to(format!(
                        "Showing {} of {} diaries",
                        view.records.len(),
                        view.total
                    ))
                ));
            }
        }
    }

    if view.total > 0 {
        out.push('\n');
        out.push_str(&render_filter_options(&view.options));
    }
    out
}

pub fn render_empty(state: EmptyState) -> String {
    let (headline, hint) = match state {
        EmptyState::NoRecords => (
            "No diaries archived yet",
            "Start by uploading your first diary: diarch upload <FILE>",
        ),
        EmptyState::NoMatches => (
            "No diaries found",
            "Try adjusting the search filters",
        ),
    };
    format!(
        "{}\n{}\n",
        DIARCH_THEME.heading.apply_to(headline),
        DIARCH_THEME.empty.apply_to(hint)
    )
}

pub fn render_filter_options(options: &FilterOptions) -> String {
    let years = options
        .years
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let categories = options
        .categories
        .iter()
        .map(|c| category_label(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} {}\n{} {}\n",
        DIARCH_THEME.meta.apply_to("Years:"),
        years,
        DIARCH_THEME.meta.apply_to("Categories:"),
        categories
    )
}

/// Lines of a single card, each exactly `CARD_WIDTH` cells wide.
fn card_lines(dr: &DisplayRecord) -> Vec<String> {
    let inner = CARD_WIDTH - 4;
    let theme = &*DIARCH_THEME;
    let record = &dr.record;

    let index = format!("{}. ", dr.index);
    let title = truncate_to_width(&record.title, inner - index.width());
    let title_pad = inner - index.width() - title.width();

    let rows: Vec<(String, &console::Style)> = vec![
        (record.category.clone(), &theme.category),
        (format_date(record.date), &theme.date),
        (
            format!("{} · {}", record.file_name, human_size(record.file_size)),
            &theme.meta,
        ),
        (
            format!("Uploaded {}", format_time_ago(record.upload_timestamp)),
            &theme.meta,
        ),
    ];

    let border = |s: String| theme.border.apply_to(s).to_string();
    let side = border("│".to_string());

    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.push(border(format!("┌{}┐", "─".repeat(CARD_WIDTH - 2))));
    lines.push(format!(
        "{} {}{}{} {}",
        side,
        theme.index.apply_to(&index),
        theme.title.apply_to(&title),
        " ".repeat(title_pad),
        side
    ));
    for (text, style) in rows {
        let text = truncate_to_width(&text, inner);
        let pad = inner - text.width();
        lines.push(format!(
            "{} {}{} {}",
            side,
            style.apply_to(&text),
            " ".repeat(pad),
            side
        ));
    }
    lines.push(border(format!("└{}┘", "─".repeat(CARD_WIDTH - 2))));
    lines
}

/// Number of card columns that fit in `width`.
pub fn grid_columns(width: usize) -> usize {
    ((width + CARD_GAP) / (CARD_WIDTH + CARD_GAP)).max(1)
}

pub fn render_grid(records: &[DisplayRecord], width: usize) -> String {
    let columns = grid_columns(width);
    let gap = " ".repeat(CARD_GAP);
    let mut out = String::new();

    for (row_idx, row) in records.chunks(columns).enumerate() {
        if row_idx > 0 {
            out.push('\n');
        }
        let cards: Vec<Vec<String>> = row.iter().map(card_lines).collect();
        let height = cards.iter().map(Vec::len).max().unwrap_or(0);
        for line in 0..height {
            let joined = cards
                .iter()
                .map(|c| c.get(line).map(String::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join(&gap);
            out.push_str(&joined);
            out.push('\n');
        }
    }
    out
}

pub fn render_list(records: &[DisplayRecord], width: usize) -> String {
    let theme = &*DIARCH_THEME;
    let idx_width = records
        .iter()
        .map(|dr| format!("{}.", dr.index).width())
        .max()
        .unwrap_or(2);
    let category_width = records
        .iter()
        .map(|dr| dr.record.category.width())
        .max()
        .unwrap_or(0)
        .min(16);
    const DATE_WIDTH: usize = 10;

    // index, category, date and time columns plus single-space separators
    let fixed = idx_width + 1 + category_width + 2 + DATE_WIDTH + 2 + TIME_WIDTH;
    let title_width = width.saturating_sub(fixed + 2).max(10);

    let mut out = String::new();
    for dr in records {
        let record = &dr.record;
        let index = format!("{:>w$}", format!("{}.", dr.index), w = idx_width);
        let title = truncate_to_width(&record.title, title_width);
        let title_pad = title_width.saturating_sub(title.width());
        let category = truncate_to_width(&record.category, category_width);
        let category_pad = category_width.saturating_sub(category.width());

        out.push_str(&format!(
            "{} {}{}  {}{}  {}  {}\n",
            theme.index.apply_to(index),
            theme.title.apply_to(title),
            " ".repeat(title_pad),
            theme.category.apply_to(category),
            " ".repeat(category_pad),
            theme.date.apply_to(record.date.format("%Y-%m-%d").to_string()),
            theme.meta.apply_to(format!(
                "{:>w$}",
                format_time_ago(record.upload_timestamp),
                w = TIME_WIDTH
            )),
        ));
    }
    out
}

/// Totals followed by one horizontal bar per category.
pub fn render_stats(stats: &CatalogStats, chart_width: usize) -> String {
    let theme = &*DIARCH_THEME;
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}\n{} {}\n{} {}\n\n",
        theme.meta.apply_to("Total diaries:"),
        stats.total,
        theme.meta.apply_to("Categories:   "),
        stats.categories,
        theme.meta.apply_to("Years:        "),
        stats.years,
    ));

    let bars = stats.chart(chart_width);
    if bars.is_empty() {
        out.push_str(&format!("{}\n", theme.empty.apply_to("No data to display")));
        return out;
    }

    out.push_str(&format!("{}\n", theme.heading.apply_to("Diaries per category")));
    let labels: Vec<String> = bars.iter().map(|b| category_label(&b.label)).collect();
    let label_width = labels.iter().map(|l| l.width()).max().unwrap_or(0);
    for (bar, label) in bars.iter().zip(labels) {
        let pad = label_width - label.width();
        out.push_str(&format!(
            "{}{} {} {}\n",
            label,
            " ".repeat(pad),
            theme.bar.apply_to(BAR_CHAR.repeat(bar.len)),
            bar.count
        ));
    }
    out
}

/// Location and free space; the usage line itself comes as a message.
pub fn render_storage(report: &StorageReport) -> String {
    let theme = &*DIARCH_THEME;
    let mut out = format!(
        "{} {}\n",
        theme.meta.apply_to("Location: "),
        report.location.display()
    );
    if let Some(estimate) = &report.quota {
        out.push_str(&format!(
            "{} {}\n",
            theme.meta.apply_to("Available:"),
            human_size(estimate.available())
        ));
    }
    out
}

/// Single-line progress indicator for the upload pipeline.
pub fn render_progress(fraction: f64) -> String {
    const BAR: usize = 24;
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR as f64).round() as usize;
    format!(
        "Encoding [{}{}] {:>3}%",
        BAR_CHAR.repeat(filled),
        " ".repeat(BAR - filled),
        (fraction * 100.0).round() as u32
    )
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

pub fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = Formatter::new();
    formatter.convert(duration.to_std().unwrap_or_default())
}
