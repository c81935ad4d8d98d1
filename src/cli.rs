// File: ./src/cli.rs
//! Shared command-line interface logic: argument parsing and help text.

use crate::config::TimeUnit;
use crate::model::TaskInput;
use crate::model::matcher::unescape_html;
use crate::store::SortKey;
use anyhow::{Result, anyhow, bail};
use crossterm::style::Attribute;
use std::path::PathBuf;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List {
        search: Option<String>,
        case_sensitive: bool,
        sort: Option<SortKey>,
    },
    Add(TaskInput),
    Edit {
        id: String,
        changes: TaskEdits,
    },
    Delete(String),
    Check(String),
    Search,
    Examples,
    Stats,
    Import(PathBuf),
    Export,
    Settings {
        cap: Option<f64>,
        unit: Option<String>,
    },
    Clear,
    Help,
}

/// Field overrides for `edit`; unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdits {
    pub title: Option<String>,
    pub date: Option<String>,
    pub duration: Option<String>,
    pub tag: Option<String>,
    pub notes: Option<String>,
}

impl TaskEdits {
    pub fn apply(self, mut base: TaskInput) -> TaskInput {
        if let Some(v) = self.title {
            base.title = v;
        }
        if let Some(v) = self.date {
            base.date = v;
        }
        if let Some(v) = self.duration {
            base.duration = v;
        }
        if let Some(v) = self.tag {
            base.tag = v;
        }
        if let Some(v) = self.notes {
            base.notes = Some(v);
        }
        base
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub root: Option<PathBuf>,
    pub command: Command,
}

fn take_value<'a, I>(flag: &str, it: &mut I) -> Result<String>
where
    I: Iterator<Item = &'a String>,
{
    it.next()
        .cloned()
        .ok_or_else(|| anyhow!("Missing value for {}", flag))
}

fn parse_edits<'a, I>(it: &mut I) -> Result<TaskEdits>
where
    I: Iterator<Item = &'a String>,
{
    let mut edits = TaskEdits::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--title" => edits.title = Some(take_value(arg, it)?),
            "--date" => edits.date = Some(take_value(arg, it)?),
            "--duration" => edits.duration = Some(take_value(arg, it)?),
            "--tag" => edits.tag = Some(take_value(arg, it)?),
            "--notes" => edits.notes = Some(take_value(arg, it)?),
            other => bail!("Unknown option: {}", other),
        }
    }
    Ok(edits)
}

/// Parses the arguments that follow the binary name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut root = None;
    let mut rest = Vec::new();

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-r" | "--root" => root = Some(PathBuf::from(take_value(arg, &mut it)?)),
            _ => rest.push(arg.clone()),
        }
    }

    let mut it = rest.iter();
    let command = match it.next().map(String::as_str) {
        None | Some("list") => {
            let mut search = None;
            let mut case_sensitive = false;
            let mut sort = None;
            while let Some(arg) = it.next() {
                match arg.as_str() {
                    "-s" | "--search" => search = Some(take_value(arg, &mut it)?),
                    "-c" | "--case-sensitive" => case_sensitive = true,
                    "--sort" => {
                        let key = take_value(arg, &mut it)?;
                        sort = Some(
                            key.parse::<SortKey>()
                                .map_err(|_| anyhow!("Unknown sort key: {}", key))?,
                        );
                    }
                    other => bail!("Unknown option: {}", other),
                }
            }
            Command::List {
                search,
                case_sensitive,
                sort,
            }
        }
        Some("add") => {
            let edits = parse_edits(&mut it)?;
            Command::Add(edits.apply(TaskInput::default()))
        }
        Some("edit") => {
            let id = take_value("edit", &mut it)?;
            Command::Edit {
                id,
                changes: parse_edits(&mut it)?,
            }
        }
        Some("delete") => Command::Delete(take_value("delete", &mut it)?),
        Some("check") => Command::Check(take_value("check", &mut it)?),
        Some("search") => Command::Search,
        Some("examples") => Command::Examples,
        Some("stats") => Command::Stats,
        Some("import") => Command::Import(PathBuf::from(take_value("import", &mut it)?)),
        Some("export") => Command::Export,
        Some("settings") => {
            let mut cap = None;
            let mut unit = None;
            while let Some(arg) = it.next() {
                match arg.as_str() {
                    "--cap" => {
                        let value = take_value(arg, &mut it)?;
                        cap = Some(
                            value
                                .parse::<f64>()
                                .map_err(|_| anyhow!("Invalid weekly cap: {}", value))?,
                        );
                    }
                    "--unit" => unit = Some(take_value(arg, &mut it)?),
                    other => bail!("Unknown option: {}", other),
                }
            }
            Command::Settings { cap, unit }
        }
        Some("clear") => Command::Clear,
        Some("-h") | Some("--help") | Some("help") => Command::Help,
        Some(other) => bail!("Unknown command: {}", other),
    };

    Ok(Invocation { root, command })
}

fn joined<I: Iterator<Item = T>, T: ToString>(items: I, sep: &str) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(sep)
}

/// Converts highlight markup for a terminal. Marked runs are shown in
/// reverse video when `styled`, bare otherwise; entities are decoded.
pub fn markup_to_terminal(markup: &str, styled: bool) -> String {
    let (open, close) = if styled {
        (Attribute::Reverse.to_string(), Attribute::Reset.to_string())
    } else {
        (String::new(), String::new())
    };
    unescape_html(&markup.replace("<mark>", &open).replace("</mark>", &close))
}

pub fn print_help(binary_name: &str) {
    println!(
        "Campus Planner v{} - local task planner with regex search",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] <command> [options]", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    list [--search <regex>] [--case-sensitive] [--sort <key>]");
    println!("                          List tasks, highlighting matches");
    println!("    add --title <t> --date <YYYY-MM-DD> --duration <min> --tag <tag> [--notes <n>]");
    println!("    edit <id> [--title ..] [--date ..] [--duration ..] [--tag ..] [--notes ..]");
    println!("    delete <id>           Remove a task");
    println!("    check <regex>         Check that a search pattern compiles");
    println!("    search                Interactive search: one pattern per line");
    println!("    examples              Show example search patterns");
    println!("    stats                 Totals, top tag and weekly budget");
    println!("    import <file.json>    Replace all tasks with an exported file");
    println!("    export                Print all tasks as JSON");
    println!(
        "    settings [--cap <hours>] [--unit {}]",
        joined(TimeUnit::iter(), "|")
    );
    println!("    clear                 Delete all tasks and settings");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("SORT KEYS:");
    println!("    {}", joined(SortKey::iter(), ", "));
    println!();
    println!("LOGGING:");
    println!("    Set CAMPUS_PLANNER_LOG=debug|info|warn|error (default: warn).");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_is_list() {
        let inv = parse_args(&[]).unwrap();
        assert_eq!(
            inv.command,
            Command::List {
                search: None,
                case_sensitive: false,
                sort: None
            }
        );
        assert!(inv.root.is_none());
    }

    #[test]
    fn test_list_with_options_and_root_anywhere() {
        let inv = parse_args(&args(&[
            "list",
            "--search",
            "exam|quiz",
            "--root",
            "/tmp/p",
            "-c",
            "--sort",
            "title-asc",
        ]))
        .unwrap();
        assert_eq!(inv.root, Some(PathBuf::from("/tmp/p")));
        assert_eq!(
            inv.command,
            Command::List {
                search: Some("exam|quiz".to_string()),
                case_sensitive: true,
                sort: Some(SortKey::TitleAsc)
            }
        );
    }

    #[test]
    fn test_add_collects_fields() {
        let inv = parse_args(&args(&[
            "add",
            "--title",
            "Lab report",
            "--date",
            "2024-04-02",
            "--duration",
            "90",
            "--tag",
            "chem",
        ]))
        .unwrap();
        let Command::Add(input) = inv.command else {
            panic!("expected add");
        };
        assert_eq!(input.title, "Lab report");
        assert_eq!(input.duration, "90");
        assert!(input.notes.is_none());
    }

    #[test]
    fn test_edit_keeps_unset_fields() {
        let inv = parse_args(&args(&["edit", "task_1", "--tag", "bio"])).unwrap();
        let Command::Edit { id, changes } = inv.command else {
            panic!("expected edit");
        };
        assert_eq!(id, "task_1");
        let base = TaskInput {
            title: "Old".to_string(),
            date: "2024-01-01".to_string(),
            duration: "5".to_string(),
            tag: "chem".to_string(),
            notes: None,
        };
        let merged = changes.apply(base);
        assert_eq!(merged.title, "Old");
        assert_eq!(merged.tag, "bio");
    }

    #[test]
    fn test_markup_to_terminal() {
        let markup = "&lt;b&gt; <mark>exam</mark> &amp;amp; Q&amp;A";
        assert_eq!(markup_to_terminal(markup, false), "<b> exam &amp; Q&A");
        assert_eq!(
            markup_to_terminal(markup, true),
            "<b> \x1b[7mexam\x1b[0m &amp; Q&A"
        );
    }

    #[test]
    fn test_help_lists_every_sort_key() {
        let keys = joined(SortKey::iter(), ", ");
        assert!(keys.starts_with("date-asc, date-desc"));
        assert!(keys.ends_with("duration-desc"));
        assert_eq!(joined(TimeUnit::iter(), "|"), "minutes|hours");
    }

    #[test]
    fn test_errors() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["list", "--sort", "size"])).is_err());
        assert!(parse_args(&args(&["list", "--search"])).is_err());
        assert!(parse_args(&args(&["settings", "--cap", "many"])).is_err());
    }
}
