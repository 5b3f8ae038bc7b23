//! Pretty formatter for terminal output.
//!
//! Search results are grouped into one card section per kind with the
//! narrative summary last, where the eye settles.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use nexus_core::store::{BlogPost, SearchHistoryEntry, User};
use nexus_core::{AggregationResponse, Kind, SearchResult};
use owo_colors::OwoColorize;

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: usize = 6;

/// Longest description shown on a card
const MAX_SNIPPET_CHARS: usize = 280;

pub fn format_aggregation(response: &AggregationResponse) -> String {
    let width = terminal_width();
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!(
        "{} {}\n",
        "Results for".dimmed(),
        response.query.bold().cyan()
    ));

    if let Some(overview) = response.of_kind(Kind::Synthesized).next() {
        output.push('\n');
        output.push_str(&format_section_header("Overview", None, width));
        output.push('\n');
        output.push_str(&wrap_indented(&overview.description, width, 2));
    } else if let Some(explanation) = &response.term_explanation {
        output.push('\n');
        output.push_str(&format!("  {}\n", explanation.dimmed()));
    }

    for kind in Kind::source_kinds() {
        let records: Vec<&SearchResult> = response.of_kind(*kind).collect();
        if records.is_empty() {
            continue;
        }
        output.push('\n');
        output.push_str(&format_section_header(
            section_label(*kind),
            Some(records.len()),
            width,
        ));
        output.push('\n');
        for (i, record) in records.iter().enumerate() {
            output.push_str(&format_card(record, i + 1, width));
        }
    }

    if let Some(summary) = &response.narrative_summary {
        output.push('\n');
        output.push_str(&format_section_header("Summary", None, width));
        output.push('\n');
        output.push_str(&wrap_indented(summary, width, 2));
    }

    if let Some(ms) = response.duration_ms {
        output.push('\n');
        output.push_str(&format!(
            "{}\n",
            format!("{} sources in {} ms", response.source_count(), ms).dimmed()
        ));
    }

    output
}

/// A titled block of wrapped prose (explanations, generated text).
pub fn format_prose(title: &str, text: &str) -> String {
    let width = terminal_width();
    let mut output = String::new();
    output.push('\n');
    output.push_str(&format_section_header(title, None, width));
    output.push('\n');
    output.push_str(&wrap_indented(text, width, 2));
    output
}

pub fn format_blog_table(posts: &[BlogPost]) -> String {
    if posts.is_empty() {
        return format!("{}\n", "No posts found.".yellow());
    }

    let width = terminal_width();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width as u16)
        .set_header(vec!["Title", "Slug", "Status", "Views", "Updated"]);

    for post in posts {
        let status = if post.is_published {
            "published".green().to_string()
        } else {
            "draft".yellow().to_string()
        };
        table.add_row(vec![
            Cell::new(truncate_str(&post.title, 40)),
            Cell::new(&post.slug),
            Cell::new(status),
            Cell::new(post.view_count),
            Cell::new(post.updated_at.format("%Y-%m-%d").to_string()),
        ]);
    }

    format!("{}\n", table)
}

pub fn format_history(entries: &[SearchHistoryEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", "No searches yet.".yellow());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(terminal_width() as u16)
        .set_header(vec!["When", "Query", "Kinds", "Results"]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.created_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(truncate_str(&entry.query, 50)),
            Cell::new(&entry.search_type),
            Cell::new(entry.results_count),
        ]);
    }

    format!("{}\n", table)
}

pub fn format_blog(post: &BlogPost) -> String {
    let width = terminal_width();
    let mut output = String::new();
    output.push('\n');
    output.push_str(&format!("{}\n", post.title.bold()));

    let mut meta = vec![format!("{} min read", post.reading_time)];
    if let Some(published) = post.published_at {
        meta.push(published.format("%Y-%m-%d").to_string());
    }
    meta.push(format!("{} views", post.view_count));
    if !post.tags.is_empty() {
        meta.push(post.tags.join(", "));
    }
    output.push_str(&format!("{}\n\n", meta.join(" · ").dimmed()));
    output.push_str(&wrap_indented(&post.content, width, 0));
    output.push('\n');
    output.push_str(&format!("{}\n", post.path().blue()));
    output
}

pub fn format_user(user: &User, token: Option<&str>) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}: {}\n", "id".dimmed(), user.id));
    output.push_str(&format!("{}: {}\n", "email".dimmed(), user.email.bold()));
    if let Some(name) = &user.display_name {
        output.push_str(&format!("{}: {}\n", "name".dimmed(), name));
    }
    if let Some(username) = &user.username {
        output.push_str(&format!("{}: {}\n", "username".dimmed(), username));
    }
    if let Some(token) = token {
        output.push('\n');
        output.push_str(&format!("{}\n", "Session token".green().bold()));
        output.push_str(&format!("{}\n", token));
        output.push_str(&format!(
            "{}\n",
            "Export it as NEXUS_TOKEN or pass --token to commands that need a user.".dimmed()
        ));
    }
    output
}

// ============================================================================
// Cards
// ============================================================================

fn format_card(record: &SearchResult, index: usize, width: usize) -> String {
    let mut output = String::new();
    let content_width = width.saturating_sub(CARD_INDENT + 2).max(20);

    output.push_str(&format!(
        "{}{}\n",
        format!(" {:>3}. ", index).cyan().bold(),
        record.title.bold()
    ));

    if !record.url.is_empty() {
        let hyperlink = format_hyperlink(&record.url, &record.url);
        output.push_str(&format!("      {}\n", hyperlink.blue()));
    }

    let snippet = clean_snippet(&record.description);
    if !snippet.is_empty() {
        let snippet = truncate_str(&snippet, MAX_SNIPPET_CHARS);
        for line in textwrap::wrap(&snippet, content_width) {
            output.push_str(&format!("      {}\n", line.dimmed()));
        }
    }

    let mut meta = vec![record.source_label.clone()];
    if let Some(published) = record.published_at {
        meta.push(published.format("%Y-%m-%d").to_string());
    }
    if let Some(seconds) = record.duration_seconds {
        meta.push(format_duration(seconds));
    }
    output.push_str(&format!("      {}\n", meta.join(" · ").dimmed()));

    output
}

fn section_label(kind: Kind) -> &'static str {
    match kind {
        Kind::Synthesized => "Overview",
        Kind::Encyclopedia => "Encyclopedia",
        Kind::Web => "Web",
        Kind::Dictionary => "Dictionary",
        Kind::News => "News",
        Kind::Image => "Images",
        Kind::Video => "Videos",
        Kind::Music => "Music",
        Kind::Blog => "Blogs",
    }
}

// ============================================================================
// Section Headers
// ============================================================================

fn format_section_header(label: &str, count: Option<usize>, width: usize) -> String {
    let count_str = match count {
        Some(n) => format!(" ({} results)", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.len() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        "──".cyan(),
        header_text.green().bold(),
        line.cyan()
    )
}

// ============================================================================
// Utility Functions
// ============================================================================

fn wrap_indented(text: &str, width: usize, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let options = textwrap::Options::new(width.saturating_sub(indent).max(20))
        .initial_indent(&pad)
        .subsequent_indent(&pad);
    let mut output = String::new();
    for paragraph in text.trim().split("\n\n") {
        for line in textwrap::wrap(paragraph.trim(), &options) {
            output.push_str(&line);
            output.push('\n');
        }
        output.push('\n');
    }
    output
}

/// `m:ss`, or `h:mm:ss` past an hour.
fn format_duration(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    // Take first line only
    let first_line = s.lines().next().unwrap_or(s);

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

fn clean_snippet(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Format a URL as a clickable hyperlink using OSC 8 escape sequences.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    // OSC 8 format, BEL-terminated for broader compatibility
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}
