//! Terminal rendering of clients, tabs, panels, and diffs.

use colored::Colorize;
use serde_json::Value;

use crate::activity::ActivityEntry;
use crate::console::{Panel, Selection, Tab};
use crate::form::EditSession;
use crate::form::binding::color_rgb;
use crate::form::dirty::Change;
use crate::form::field::{FieldKind, Section};
use crate::model::{ClientConfig, ClientStats, LogEntry};

/// Width of the label column in field listings.
const LABEL_WIDTH: usize = 26;

// ---------------------------------------------------------------------------
// Client list
// ---------------------------------------------------------------------------

pub fn print_client_table(rows: &[(&str, &ClientConfig)], selected: Option<&str>) {
    println!(
        "  {:<2}{:<24} {:<12} {:<28} Model",
        "", "ID", "Status", "Company"
    );
    println!("  {}", "-".repeat(78));

    for (i, (id, client)) in rows.iter().enumerate() {
        let marker = if selected == Some(*id) { "▸" } else { " " };
        let line = format!(
            "  {:<2}{:<24} {:<12} {:<28} {}",
            marker,
            truncate(id, 24),
            colorize_status(client.status_label()),
            truncate(client.display_name(), 28),
            client.model.as_deref().unwrap_or("-"),
        );

        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

/// Colorize a client status.
pub fn colorize_status(status: &str) -> colored::ColoredString {
    match status {
        "active" => status.green(),
        "inactive" => status.red(),
        "maintenance" => status.yellow(),
        _ => status.normal(),
    }
}

// ---------------------------------------------------------------------------
// Selected client
// ---------------------------------------------------------------------------

pub fn print_header(selection: &Selection) {
    let dirty = if selection.form.is_dirty() {
        format!(" {}", "● unsaved changes".yellow())
    } else {
        String::new()
    };
    println!(
        "{}{}",
        format!("Client: {}", selection.client_id()).bold().cyan(),
        dirty
    );
    println!("{}", "=".repeat(60));
}

/// Render one tab of the selected client.
pub fn print_tab(selection: &Selection, tab: Tab, swatches: bool) {
    match tab {
        Tab::Stats => print_stats(&selection.stats),
        Tab::Logs => print_logs(&selection.logs),
        Tab::Preview => print_preview(&selection.preview_url),
        _ => {
            for section in tab.sections() {
                print_section(&selection.form, *section, swatches);
            }
        }
    }
}

pub fn print_section(form: &EditSession, section: Section, swatches: bool) {
    println!("{}", section.title().bold().cyan());

    for field in section.fields() {
        let view = form.view(field);
        let label = format!("{:<width$}", field.label, width = LABEL_WIDTH);

        let value = match field.kind {
            FieldKind::Color if swatches => match color_rgb(&view.text) {
                Some((r, g, b)) => format!("{} {}", "  ".on_truecolor(r, g, b), view.text),
                None => view.text.clone(),
            },
            FieldKind::Json if view.text.contains('\n') => {
                let pad = " ".repeat(LABEL_WIDTH + 3);
                view.text.replace('\n', &format!("\n{pad}"))
            }
            _ => view.text.clone(),
        };

        println!("  {} {}", label.bold(), value);
        if let Some(flag) = view.flag {
            println!(
                "  {:<width$} {} {} (input: {})",
                "",
                "✗".red().bold(),
                flag.reason.red(),
                truncate(&flag.input, 40),
                width = LABEL_WIDTH
            );
        }
    }
    println!();
}

pub fn print_stats(panel: &Panel<ClientStats>) {
    println!("{}", "Statistics".bold().cyan());
    match panel {
        Panel::Idle => println!("  {}", "not loaded".dimmed()),
        Panel::Failed(message) => println!("  {} {}", "✗".red().bold(), message.red()),
        Panel::Loaded(stats) => {
            let count = |n: Option<u64>| n.map(format_number).unwrap_or_else(|| "-".into());
            println!("  {} {}", "Conversations:     ".bold(), count(stats.conversations));
            println!("  {} {}", "User messages:     ".bold(), count(stats.messages_user));
            println!(
                "  {} {}",
                "Assistant messages:".bold(),
                count(stats.messages_assistant)
            );
            println!(
                "  {} {}",
                "Last activity:     ".bold(),
                stats.last_activity.as_deref().unwrap_or("-")
            );
        }
    }
}

pub fn print_logs(panel: &Panel<Vec<LogEntry>>) {
    println!("{}", "Conversation Logs".bold().cyan());
    match panel {
        Panel::Idle => println!("  {}", "not loaded".dimmed()),
        Panel::Failed(message) => println!("  {} {}", "✗".red().bold(), message.red()),
        Panel::Loaded(entries) if entries.is_empty() => {
            println!("  {}", "No messages yet.".dimmed());
        }
        Panel::Loaded(entries) => {
            for entry in entries {
                let role = match entry.role.as_str() {
                    "user" => entry.role.blue(),
                    "assistant" => entry.role.green(),
                    _ => entry.role.normal(),
                };
                println!(
                    "  {} {:<10} {}",
                    entry.created_at.as_deref().unwrap_or("").dimmed(),
                    role,
                    truncate(&entry.content.replace('\n', " "), 90)
                );
            }
        }
    }
}

pub fn print_preview(url: &str) {
    println!("{}", "Widget Preview".bold().cyan());
    println!("  {url}");
}

// ---------------------------------------------------------------------------
// Diffs and history
// ---------------------------------------------------------------------------

pub fn print_changes(changes: &[Change]) {
    if changes.is_empty() {
        println!("{}", "No unsaved changes.".dimmed());
        return;
    }
    for change in changes {
        println!(
            "  {} {}: {} → {}",
            "~".yellow().bold(),
            change.path.bold(),
            short_value(change.before.as_ref()).red(),
            short_value(change.after.as_ref()).green(),
        );
    }
}

fn short_value(value: Option<&Value>) -> String {
    match value {
        None => "(unset)".to_string(),
        Some(value) => truncate(&value.to_string(), 50),
    }
}

pub fn print_history(entries: &[ActivityEntry]) {
    println!("  {:<26} {:<10} {:<20} Detail", "Time", "Action", "Client");
    println!("  {}", "-".repeat(70));
    for entry in entries {
        let status = if entry.success {
            "✓".green().bold()
        } else {
            "✗".red().bold()
        };
        println!(
            "{} {:<26} {:<10} {:<20} {}",
            status,
            truncate(&entry.timestamp, 26),
            entry.action,
            entry.client_id.as_deref().unwrap_or("-"),
            entry.detail.as_deref().unwrap_or("").dimmed(),
        );
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
