//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `kontaktio login | logout | status`: session management
//! - `kontaktio list | show | stats | logs | preview`: browsing clients
//! - `kontaktio create | duplicate | set | delete | import | export`: one-shot edits
//! - `kontaktio edit`: interactive edit session
//! - `kontaktio history`: local activity log
//! - `kontaktio config show|init|set|reset`: configuration management

pub mod browser;
pub mod edit;
pub mod render;

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;

use crate::activity::ActivityLog;
use crate::api::{AdminApi, Backend};
use crate::config::{self, schema::AdminConfig};
use crate::console::{Console, SaveOutcome, Tab, View};
use crate::form::Commit;
use crate::session::SessionStore;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Console setup
// ---------------------------------------------------------------------------

/// Build a console over the live backend from the effective configuration.
fn connect(cfg: &AdminConfig, logs_limit: Option<u32>) -> Console<AdminApi> {
    let session = SessionStore::load(&cfg.session);
    let api = AdminApi::from_config(&cfg.api, session);
    let activity = ActivityLog::from_config(&cfg.logging);
    Console::new(api, activity, logs_limit.or(cfg.api.logs_limit()))
}

/// A console with the client list loaded, or an error asking to log in.
fn open_panel(cfg: &AdminConfig, logs_limit: Option<u32>) -> Result<Console<AdminApi>> {
    let mut console = connect(cfg, logs_limit);
    if console.resume()? == View::Login {
        bail!("not logged in (or the session expired); run `kontaktio login`");
    }
    Ok(console)
}

/// Select `id`, or the last selected client when none is given.
fn select_target<B: Backend>(console: &mut Console<B>, id: Option<&str>) -> Result<String> {
    let id = match id {
        Some(id) => id.to_string(),
        None => console
            .backend()
            .session()
            .last_client()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no client given and none selected before"))?,
    };
    console.select(&id, |_| true)?;
    Ok(id)
}

/// Ask on stdin.
fn confirm(prompt: &str) -> bool {
    edit::ask(&mut io::stdin().lock(), prompt)
}

// ---------------------------------------------------------------------------
// kontaktio login | logout | status
// ---------------------------------------------------------------------------

pub fn run_login(password: Option<String>) -> Result<()> {
    let cfg = config::load();
    let mut console = connect(&cfg, None);

    let password = match password {
        Some(password) => password,
        None => {
            print!("Password: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let count = console.login(&password)?;
    println!(
        "{} Logged in to {} ({} clients)",
        "✓".green().bold(),
        console.backend().base_url(),
        count
    );
    Ok(())
}

pub fn run_logout() -> Result<()> {
    let cfg = config::load();
    let mut console = connect(&cfg, None);
    console.logout();
    println!("{} Logged out", "✓".green().bold());
    Ok(())
}

/// Show session, backend, and configuration state.
pub fn run_status() -> Result<()> {
    let cfg = config::load();
    let mut console = connect(&cfg, None);

    println!("{}", "kontaktio Status".bold().cyan());
    println!("{}", "=".repeat(40));

    print_status_item("Backend", true, &cfg.api.base_url);

    let has_token = console.backend().session().token().is_some();
    let logged_in_at = console
        .backend()
        .session()
        .logged_in_at()
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string());
    if has_token {
        let (ok, detail) = match console.resume() {
            Ok(View::Panel) => (
                true,
                format!(
                    "logged in since {} ({} clients)",
                    logged_in_at.as_deref().unwrap_or("?"),
                    console.registry().len()
                ),
            ),
            Ok(View::Login) => (false, "token rejected; run `kontaktio login`".to_string()),
            Err(err) => (false, err.to_string()),
        };
        print_status_item("Session", ok, &detail);
    } else {
        print_status_item("Session", false, "not logged in (run `kontaktio login`)");
    }

    let last = console.backend().session().last_client().unwrap_or("none");
    print_status_item("Last client", true, last);

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_status_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.kontaktio/config.toml found"
        } else {
            "not found (run `kontaktio config init` to create)"
        },
    );

    let log = console.activity();
    let detail = match log.path() {
        Some(path) => format!("{} entries at {}", log.read_all().len(), path.display()),
        None => "disabled".to_string(),
    };
    print_status_item("Activity log", log.path().is_some(), &detail);
    Ok(())
}

fn print_status_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// kontaktio list | show | stats | logs | preview
// ---------------------------------------------------------------------------

pub fn run_list(filter: Option<&str>, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let console = open_panel(&cfg, None)?;
    let rows = console.clients(filter.unwrap_or(""));

    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = rows
                .iter()
                .map(|(id, client)| (id.to_string(), client.to_value()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No clients match.".yellow());
                return Ok(());
            }
            let last = console.backend().session().last_client();
            render::print_client_table(&rows, last);
            println!();
            println!(
                "  {}",
                format!("{} of {} clients", rows.len(), console.registry().len()).dimmed()
            );
        }
    }
    Ok(())
}

pub fn run_show(id: Option<&str>, tab: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    select_target(&mut console, id)?;
    let selection = console
        .selection()
        .ok_or_else(|| anyhow!("no client selected"))?;

    render::print_header(selection);
    match tab {
        Some(name) => {
            let tab: Tab = name.parse().map_err(|e: String| anyhow!(e))?;
            render::print_tab(selection, tab, cfg.display.swatches);
        }
        None => {
            for tab in Tab::ALL.iter().filter(|t| t.is_form()) {
                render::print_tab(selection, *tab, cfg.display.swatches);
            }
        }
    }
    Ok(())
}

pub fn run_stats(id: Option<&str>, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    select_target(&mut console, id)?;
    let selection = console
        .selection()
        .ok_or_else(|| anyhow!("no client selected"))?;

    match format {
        OutputFormat::Json => match selection.stats.loaded() {
            Some(stats) => println!("{}", serde_json::to_string_pretty(stats)?),
            None => render::print_stats(&selection.stats),
        },
        OutputFormat::Table => render::print_stats(&selection.stats),
    }
    Ok(())
}

pub fn run_logs(id: Option<&str>, limit: Option<u32>, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, limit)?;
    select_target(&mut console, id)?;
    let selection = console
        .selection()
        .ok_or_else(|| anyhow!("no client selected"))?;

    match format {
        OutputFormat::Json => match selection.logs.loaded() {
            Some(entries) => println!("{}", serde_json::to_string_pretty(entries)?),
            None => render::print_logs(&selection.logs),
        },
        OutputFormat::Table => render::print_logs(&selection.logs),
    }
    Ok(())
}

pub fn run_preview(id: Option<&str>, open: bool) -> Result<()> {
    let cfg = config::load();
    let mut console = connect(&cfg, None);
    let id = match id {
        Some(id) => id.to_string(),
        None => console
            .backend()
            .session()
            .last_client()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no client given and none selected before"))?,
    };
    let url = console.backend().preview_url(&id);
    console.backend_mut().session_mut().set_last_client(Some(&id));

    println!("{url}");
    if open {
        browser::open_browser(&url)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// kontaktio create | duplicate | set | delete
// ---------------------------------------------------------------------------

pub fn run_create(id: &str, from: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    console.create(id, from, |_| true)?;

    match from {
        Some(template) => println!(
            "{} Created {} from {}",
            "✓".green().bold(),
            id.bold(),
            template
        ),
        None => println!("{} Created {}", "✓".green().bold(), id.bold()),
    }
    Ok(())
}

pub fn run_duplicate(new_id: &str, from: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    let source = select_target(&mut console, from)?;
    console.duplicate(new_id, |_| true)?;
    println!(
        "{} Duplicated {} as {}",
        "✓".green().bold(),
        source,
        new_id.bold()
    );
    Ok(())
}

/// Split `[id] path=value...` into the optional id and the assignments.
fn split_assignments(args: &[String]) -> Result<(Option<&str>, Vec<(&str, &str)>)> {
    let (id, rest) = match args.split_first() {
        Some((first, rest)) if !first.contains('=') => (Some(first.as_str()), rest),
        _ => (None, args),
    };
    if rest.is_empty() {
        bail!("expected at least one <path=value> assignment");
    }
    let assignments = rest
        .iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(path, value)| (path.trim(), value))
                .ok_or_else(|| anyhow!("'{arg}' is not a <path=value> assignment"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((id, assignments))
}

/// Apply field assignments and save them. Any rejected value aborts the
/// whole batch before anything is sent.
pub fn run_set(args: &[String]) -> Result<()> {
    let (id, assignments) = split_assignments(args)?;
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    let id = select_target(&mut console, id)?;

    let mut rejected = 0;
    for (path, value) in &assignments {
        match console.set_field(path, value)? {
            Commit::Applied(stored) => {
                println!("  {} {} = {}", "✓".green().bold(), path.bold(), stored);
            }
            Commit::Flagged(reason) => {
                rejected += 1;
                println!("  {} {}: {}", "✗".red().bold(), path.bold(), reason.red());
            }
        }
    }
    if rejected > 0 {
        bail!("{rejected} value(s) rejected; nothing was saved");
    }

    match console.save()? {
        SaveOutcome::Unchanged => println!("{}", "No changes; nothing to save.".dimmed()),
        SaveOutcome::Saved(paths) => println!(
            "{} Saved {} ({})",
            "✓".green().bold(),
            id.bold(),
            paths.join(", ").dimmed()
        ),
    }
    Ok(())
}

pub fn run_delete(id: Option<&str>, yes: bool) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    let id = match id {
        Some(id) => id.to_string(),
        None => console
            .backend()
            .session()
            .last_client()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no client given and none selected before"))?,
    };

    console.delete(&id, |prompt| yes || confirm(prompt))?;
    println!("{} Deleted {}", "✓".green().bold(), id.bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// kontaktio export | import
// ---------------------------------------------------------------------------

pub fn run_export(id: Option<&str>, out: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    let id = select_target(&mut console, id)?;
    let json = console.export_json()?;

    match out {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {path}"))?;
            println!("{} Exported {} to {}", "✓".green().bold(), id.bold(), path);
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Import a JSON record into a client and save it.
pub fn run_import(args: &[String]) -> Result<()> {
    let (id, file) = match args {
        [file] => (None, file.as_str()),
        [id, file] => (Some(id.as_str()), file.as_str()),
        _ => bail!("usage: kontaktio import [id] <file>"),
    };
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;

    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    let id = select_target(&mut console, id)?;
    console.import_json(&text)?;

    match console.save()? {
        SaveOutcome::Unchanged => println!(
            "{}",
            format!("{file} matches {id}; nothing to save.").dimmed()
        ),
        SaveOutcome::Saved(paths) => println!(
            "{} Imported {} into {} ({} change(s))",
            "✓".green().bold(),
            file,
            id.bold(),
            paths.len()
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// kontaktio edit
// ---------------------------------------------------------------------------

pub fn run_edit(id: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let mut console = open_panel(&cfg, None)?;
    select_target(&mut console, id)?;
    edit::run_session(&mut console, &mut io::stdin().lock(), cfg.display.swatches)
}

// ---------------------------------------------------------------------------
// kontaktio history
// ---------------------------------------------------------------------------

pub fn run_history(limit: usize) -> Result<()> {
    let cfg = config::load();
    let log = ActivityLog::from_config(&cfg.logging);
    let entries = log.recent(limit);

    if entries.is_empty() {
        println!("{}", "No activity recorded yet.".yellow());
        return Ok(());
    }
    println!("{}", "Recent Admin Activity".bold().cyan());
    println!("{}", "=".repeat(72));
    render::print_history(&entries);
    Ok(())
}

// ---------------------------------------------------------------------------
// kontaktio config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective kontaktio Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.kontaktio/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.kontaktio/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".kontaktio.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".kontaktio.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "KONTAKTIO_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.kontaktio/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Table);
    }

    #[test]
    fn test_split_assignments_with_id() {
        let input = args(&["acme", "temperature=0.9", "company.name=Acme=Co"]);
        let (id, pairs) = split_assignments(&input).unwrap();
        assert_eq!(id, Some("acme"));
        assert_eq!(pairs, vec![("temperature", "0.9"), ("company.name", "Acme=Co")]);
    }

    #[test]
    fn test_split_assignments_without_id() {
        let input = args(&["status=inactive"]);
        let (id, pairs) = split_assignments(&input).unwrap();
        assert_eq!(id, None);
        assert_eq!(pairs, vec![("status", "inactive")]);
    }

    #[test]
    fn test_split_assignments_rejects_bare_words() {
        assert!(split_assignments(&args(&["acme"])).is_err());
        assert!(split_assignments(&args(&["acme", "temperature"])).is_err());
        assert!(split_assignments(&[]).is_err());
    }
}
