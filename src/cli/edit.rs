//! Interactive edit session (`kontaktio edit`).
//!
//! A line-oriented loop over the selected client: render tabs, set fields,
//! inspect the diff, and save. Leaving with unsaved changes asks first.

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use super::{browser, render};
use crate::api::Backend;
use crate::console::{Console, ConsoleError, SaveOutcome, Tab, View};
use crate::form::Commit;

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Show(Option<Tab>),
    Tab(Tab),
    Set { field: String, value: String },
    Diff,
    Revert,
    Save,
    Export(Option<String>),
    Import(String),
    Stats,
    Logs,
    Preview,
    Open(String),
    Delete,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<EditCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => EditCommand::Empty,
        "show" | "ls" => {
            if rest.is_empty() {
                EditCommand::Show(None)
            } else {
                EditCommand::Show(Some(rest.parse()?))
            }
        }
        "tab" => EditCommand::Tab(rest.parse()?),
        "set" => {
            // `set path value` or `set path=value`
            let (field, value) = match rest.split_once('=') {
                Some((field, value)) if !field.trim().contains(char::is_whitespace) => {
                    (field.trim(), value)
                }
                _ => rest
                    .split_once(char::is_whitespace)
                    .map(|(field, value)| (field, value.trim()))
                    .unwrap_or((rest, "")),
            };
            if field.is_empty() {
                return Err("usage: set <field> <value>".to_string());
            }
            EditCommand::Set {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "diff" => EditCommand::Diff,
        "revert" => EditCommand::Revert,
        "save" => EditCommand::Save,
        "export" => EditCommand::Export((!rest.is_empty()).then(|| rest.to_string())),
        "import" if rest.is_empty() => return Err("usage: import <file>".to_string()),
        "import" => EditCommand::Import(rest.to_string()),
        "stats" => EditCommand::Stats,
        "logs" => EditCommand::Logs,
        "preview" => EditCommand::Preview,
        "open" if rest.is_empty() => return Err("usage: open <client-id>".to_string()),
        "open" => EditCommand::Open(rest.to_string()),
        "delete" => EditCommand::Delete,
        "help" | "?" => EditCommand::Help,
        "quit" | "exit" | "q" => EditCommand::Quit,
        other => return Err(format!("unknown command '{other}' (type `help`)")),
    };
    Ok(command)
}

const HELP: &[(&str, &str)] = &[
    ("show [tab]", "render the current (or named) tab"),
    ("tab <name>", "switch tab"),
    ("set <field> <value>", "edit a field (path or key, e.g. theme.buttonBg)"),
    ("diff", "list unsaved changes"),
    ("revert", "discard unsaved changes"),
    ("save", "send changes to the server"),
    ("export [file]", "print or write the edit buffer as JSON"),
    ("import <file>", "load a JSON record into the edit buffer"),
    ("stats | logs", "refresh and show the read-only panels"),
    ("preview", "open the widget preview in a browser"),
    ("open <id>", "switch to another client"),
    ("delete", "delete this client"),
    ("quit", "leave the session"),
];

fn print_help() {
    println!("{}", "Commands".bold().cyan());
    for (usage, text) in HELP {
        println!("  {:<22} {}", usage.bold(), text.dimmed());
    }
    let tabs: Vec<&str> = Tab::ALL.iter().map(|t| t.name()).collect();
    println!("  {} {}", "Tabs:".dimmed(), tabs.join(", ").dimmed());
}

/// Ask a yes/no question on `input`. End of input answers no.
pub fn ask(input: &mut impl BufRead, prompt: &str) -> bool {
    print!("{} {} ", prompt.yellow(), "[y/N]".dimmed());
    let _ = io::stdout().flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => {
            println!();
            false
        }
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
    }
}

/// Run the edit loop until `quit`, end of input, or a lost session.
pub fn run_session<B: Backend>(
    console: &mut Console<B>,
    input: &mut impl BufRead,
    swatches: bool,
) -> Result<()> {
    if let Some(selection) = console.selection() {
        render::print_header(selection);
        render::print_tab(selection, console.tab(), swatches);
    }
    print_help();

    loop {
        let Some(id) = console.selected_id().map(str::to_string) else {
            println!("{}", "No client selected; leaving the editor.".dimmed());
            return Ok(());
        };
        let marker = if console.is_dirty() { "*" } else { "" };
        print!("{}{} {} ", id.cyan(), marker.yellow(), ">".bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!();
            if console.is_dirty() {
                println!(
                    "{} input ended; unsaved changes to '{}' were discarded",
                    "!".yellow().bold(),
                    id
                );
            }
            return Ok(());
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{} {}", "✗".red().bold(), message);
                continue;
            }
        };

        if command == EditCommand::Quit {
            if !console.is_dirty()
                || ask(input, &format!("Quit without saving changes to '{id}'?"))
            {
                return Ok(());
            }
            continue;
        }

        if let Err(err) = dispatch(console, command, input, swatches) {
            println!("{} {}", "✗".red().bold(), err);
            if console.view() == View::Login {
                println!(
                    "  {}",
                    "Session expired. Run `kontaktio login` to sign in again.".dimmed()
                );
                return Ok(());
            }
        }
    }
}

fn dispatch<B: Backend>(
    console: &mut Console<B>,
    command: EditCommand,
    input: &mut impl BufRead,
    swatches: bool,
) -> Result<(), ConsoleError> {
    match command {
        EditCommand::Empty | EditCommand::Quit => {}
        EditCommand::Help => print_help(),
        EditCommand::Show(tab) => {
            if let Some(tab) = tab {
                console.switch_tab(tab);
            }
            show(console, swatches);
        }
        EditCommand::Tab(tab) => {
            console.switch_tab(tab);
            show(console, swatches);
        }
        EditCommand::Set { field, value } => match console.set_field(&field, &value)? {
            Commit::Applied(stored) => println!("{} {} = {}", "✓".green().bold(), field.bold(), stored),
            Commit::Flagged(reason) => {
                println!("{} {}: {}", "✗".red().bold(), field.bold(), reason.red());
            }
        },
        EditCommand::Diff => {
            if let Some(selection) = console.selection() {
                render::print_changes(&selection.form.changes());
            }
        }
        EditCommand::Revert => {
            console.revert()?;
            println!("{} Changes discarded", "✓".green().bold());
        }
        EditCommand::Save => match console.save()? {
            SaveOutcome::Unchanged => println!("{}", "Nothing to save.".dimmed()),
            SaveOutcome::Saved(paths) => println!(
                "{} Saved {} change(s): {}",
                "✓".green().bold(),
                paths.len(),
                paths.join(", ").dimmed()
            ),
        },
        EditCommand::Export(path) => {
            let json = console.export_json()?;
            match path {
                Some(path) => match fs::write(&path, format!("{json}\n")) {
                    Ok(()) => println!("{} Exported to {}", "✓".green().bold(), path),
                    Err(e) => println!("{} cannot write {}: {}", "✗".red().bold(), path, e),
                },
                None => println!("{json}"),
            }
        }
        EditCommand::Import(path) => match fs::read_to_string(&path) {
            Ok(text) => {
                console.import_json(&text)?;
                println!(
                    "{} Imported {} (use `diff` to review, `save` to apply)",
                    "✓".green().bold(),
                    path
                );
            }
            Err(e) => println!("{} cannot read {}: {}", "✗".red().bold(), path, e),
        },
        EditCommand::Stats => refresh_and_show(console, Tab::Stats, swatches)?,
        EditCommand::Logs => refresh_and_show(console, Tab::Logs, swatches)?,
        EditCommand::Preview => {
            if let Some(selection) = console.selection() {
                render::print_preview(&selection.preview_url);
                if let Err(e) = browser::open_browser(&selection.preview_url) {
                    println!("  {}", e.to_string().dimmed());
                }
            }
        }
        EditCommand::Open(id) => {
            console.select(&id, |prompt| ask(input, prompt))?;
            show(console, swatches);
        }
        EditCommand::Delete => {
            if let Some(id) = console.selected_id().map(str::to_string) {
                console.delete(&id, |prompt| ask(input, prompt))?;
                println!("{} Deleted {}", "✓".green().bold(), id);
            }
        }
    }
    Ok(())
}

fn refresh_and_show<B: Backend>(
    console: &mut Console<B>,
    tab: Tab,
    swatches: bool,
) -> Result<(), ConsoleError> {
    console.refresh_panels()?;
    console.switch_tab(tab);
    show(console, swatches);
    Ok(())
}

fn show<B: Backend>(console: &Console<B>, swatches: bool) {
    if let Some(selection) = console.selection() {
        render::print_header(selection);
        render::print_tab(selection, console.tab(), swatches);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::{Cursor, Read};

    use crate::activity::ActivityLog;
    use crate::api::ApiError;
    use crate::model::{ClientConfig, ClientStats, LogEntry};
    use crate::session::SessionStore;

    #[test]
    fn parses_set_forms() {
        assert_eq!(
            parse_command("set temperature 0.9"),
            Ok(EditCommand::Set {
                field: "temperature".into(),
                value: "0.9".into()
            })
        );
        assert_eq!(
            parse_command("set company.name=Acme Sp. z o.o."),
            Ok(EditCommand::Set {
                field: "company.name".into(),
                value: "Acme Sp. z o.o.".into()
            })
        );
        assert_eq!(
            parse_command("set welcome_message Hi = hello"),
            Ok(EditCommand::Set {
                field: "welcome_message".into(),
                value: "Hi = hello".into()
            })
        );
        assert_eq!(
            parse_command("set status"),
            Ok(EditCommand::Set {
                field: "status".into(),
                value: String::new()
            })
        );
        assert!(parse_command("set").is_err());
    }

    #[test]
    fn parses_tabs_and_simple_commands() {
        assert_eq!(parse_command("tab theme"), Ok(EditCommand::Tab(Tab::Theme)));
        assert_eq!(parse_command("show"), Ok(EditCommand::Show(None)));
        assert_eq!(parse_command("show logs"), Ok(EditCommand::Show(Some(Tab::Logs))));
        assert!(parse_command("tab nowhere").is_err());
        assert_eq!(parse_command("  SAVE "), Ok(EditCommand::Save));
        assert_eq!(parse_command(""), Ok(EditCommand::Empty));
        assert_eq!(parse_command("q"), Ok(EditCommand::Quit));
        assert_eq!(parse_command("export"), Ok(EditCommand::Export(None)));
        assert_eq!(
            parse_command("export acme.json"),
            Ok(EditCommand::Export(Some("acme.json".into())))
        );
        assert!(parse_command("import").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn ask_accepts_yes_only() {
        assert!(ask(&mut Cursor::new("y\n"), "ok?"));
        assert!(ask(&mut Cursor::new("YES\n"), "ok?"));
        assert!(!ask(&mut Cursor::new("n\n"), "ok?"));
        assert!(!ask(&mut Cursor::new("\n"), "ok?"));
        assert!(!ask(&mut Cursor::new(""), "ok?"));
    }

    // -----------------------------------------------------------------------
    // Edit loop
    // -----------------------------------------------------------------------

    /// Backend holding one client. Saves succeed unless `reject_saves` is set,
    /// in which case they answer 401 like an expired token.
    struct LoopBackend {
        session: SessionStore,
        saves: usize,
        reject_saves: bool,
    }

    impl Backend for LoopBackend {
        fn session(&self) -> &SessionStore {
            &self.session
        }
        fn session_mut(&mut self) -> &mut SessionStore {
            &mut self.session
        }
        fn login(&mut self, _password: &str) -> Result<String, ApiError> {
            Err(ApiError::LoginRejected("invalid password".into()))
        }
        fn list_clients(&mut self) -> Result<BTreeMap<String, ClientConfig>, ApiError> {
            Ok(BTreeMap::from([("acme".to_string(), ClientConfig::new("acme"))]))
        }
        fn create_client(&mut self, id: &str) -> Result<ClientConfig, ApiError> {
            Ok(ClientConfig::new(id))
        }
        fn update_client(
            &mut self,
            _id: &str,
            config: &ClientConfig,
        ) -> Result<ClientConfig, ApiError> {
            if self.reject_saves {
                self.session.clear_token();
                return Err(ApiError::Unauthorized);
            }
            self.saves += 1;
            Ok(config.clone())
        }
        fn delete_client(&mut self, _id: &str) -> Result<(), ApiError> {
            Ok(())
        }
        fn stats(&mut self, _id: &str) -> Result<ClientStats, ApiError> {
            Ok(ClientStats::default())
        }
        fn logs(&mut self, _id: &str, _limit: Option<u32>) -> Result<Vec<LogEntry>, ApiError> {
            Ok(Vec::new())
        }
        fn preview_url(&self, id: &str) -> String {
            format!("http://stub/admin/preview.html?client={id}")
        }
    }

    fn editing_acme(reject_saves: bool) -> Console<LoopBackend> {
        let mut session = SessionStore::in_memory();
        session.set_token(Some("t0k".into()));
        let backend = LoopBackend {
            session,
            saves: 0,
            reject_saves,
        };
        let mut console = Console::new(backend, ActivityLog::disabled(), None);
        console.resume().unwrap();
        console.select("acme", |_| true).unwrap();
        console
    }

    fn unread(input: &mut Cursor<&str>) -> String {
        let mut rest = String::new();
        input.read_to_string(&mut rest).unwrap();
        rest
    }

    #[test]
    fn declined_quit_keeps_editing() {
        let mut console = editing_acme(false);
        let mut input = Cursor::new("set temperature 0.9\nquit\nn\nsave\nquit\n");

        run_session(&mut console, &mut input, false).unwrap();

        assert_eq!(console.backend().saves, 1);
        assert!(!console.is_dirty());
    }

    #[test]
    fn confirmed_quit_leaves_edits_unsaved() {
        let mut console = editing_acme(false);
        let mut input = Cursor::new("set temperature 0.9\nquit\ny\nsave\n");

        run_session(&mut console, &mut input, false).unwrap();

        assert_eq!(console.backend().saves, 0);
        assert!(console.is_dirty());
        assert_eq!(unread(&mut input), "save\n");
    }

    #[test]
    fn clean_quit_does_not_ask() {
        let mut console = editing_acme(false);
        let mut input = Cursor::new("quit\ny\n");

        run_session(&mut console, &mut input, false).unwrap();

        assert_eq!(unread(&mut input), "y\n");
    }

    #[test]
    fn end_of_input_discards_edits() {
        let mut console = editing_acme(false);
        let mut input = Cursor::new("set temperature 0.9\n");

        run_session(&mut console, &mut input, false).unwrap();

        assert_eq!(console.backend().saves, 0);
        assert!(console.is_dirty());
    }

    #[test]
    fn expired_session_ends_the_loop() {
        let mut console = editing_acme(true);
        let mut input = Cursor::new("set temperature 0.9\nsave\nset temperature 0.1\n");

        run_session(&mut console, &mut input, false).unwrap();

        assert_eq!(console.view(), View::Login);
        assert!(console.backend().session().token().is_none());
        assert_eq!(unread(&mut input), "set temperature 0.1\n");
    }
}
