use anyhow::{Result, bail};
use campus_planner::cli::{self, Command};
use campus_planner::config::{Config, TimeUnit};
use campus_planner::context::{AppContext, StandardContext};
use campus_planner::debounce::Debouncer;
use campus_planner::model::matcher::{
    CompiledMatcher, SEARCH_EXAMPLES, compile, compile_query, highlight,
};
use campus_planner::model::validator::{FormValidationResult, validate_all};
use campus_planner::model::{Task, TaskInput};
use campus_planner::storage::LocalStorage;
use campus_planner::store::{FilterOptions, SortKey, TaskStore};
use crossterm::tty::IsTty;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Duration;

fn init_logging() {
    let level = env::var("CAMPUS_PLANNER_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

struct ListStyle {
    unit: TimeUnit,
    /// Reverse-video highlights; off when stdout is not a terminal.
    styled: bool,
}

fn format_task(task: &Task, matcher: Option<&CompiledMatcher>, style: &ListStyle) -> String {
    let field = |text: &str| cli::markup_to_terminal(&highlight(matcher, text), style.styled);
    let mut line = format!(
        "{}  {}  {:>9}  [{}]  {}",
        task.id,
        field(&task.due_date),
        style.unit.format(task.duration),
        field(&task.tag),
        field(&task.title),
    );
    if !task.notes.is_empty() {
        line.push_str(&format!("\n    {}", field(&task.notes)));
    }
    line
}

fn print_list(store: &TaskStore, matcher: Option<&CompiledMatcher>, sort: SortKey) {
    let style = ListStyle {
        unit: store.settings.time_unit,
        styled: std::io::stdout().is_tty(),
    };
    let tasks = store.filter(&FilterOptions { matcher, sort });
    for task in &tasks {
        println!("{}", format_task(task, matcher, &style));
    }
    println!("{} of {} task(s)", tasks.len(), store.tasks.len());
}

fn report_invalid(result: &FormValidationResult) -> Result<()> {
    for (field, message) in &result.errors {
        eprintln!("{}: {}", field, message);
    }
    bail!("Task not saved: {} invalid field(s)", result.errors.len())
}

fn validated(input: &TaskInput) -> Result<()> {
    let result = validate_all(input);
    if result.valid {
        Ok(())
    } else {
        report_invalid(&result)
    }
}

async fn interactive_search(store: TaskStore, case_sensitive: bool, sort: SortKey) -> Result<()> {
    let store = Arc::new(store);
    let mut debouncer =
        Debouncer::new(Duration::from_millis(store.settings.search_debounce_ms));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!(
        "Type a pattern per line (empty line lists everything, Ctrl-D quits). \
         Results show {} ms after the last line.",
        debouncer.delay().as_millis()
    );
    while let Some(pattern) = lines.next_line().await? {
        let store = store.clone();
        debouncer.schedule(async move {
            match compile_query(&pattern, case_sensitive) {
                Ok(matcher) => print_list(&store, matcher.as_ref(), sort),
                Err(e) => log::warn!("{}", e),
            }
        });
    }
    debouncer.flush().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = cli::parse_args(&args)?;

    if invocation.command == Command::Help {
        cli::print_help("campus-planner");
        return Ok(());
    }

    let ctx = StandardContext::new(invocation.root);
    let config = Config::load_or_default(&ctx)?;
    let tasks = LocalStorage::load(&ctx)?;
    let mut store = TaskStore::new(tasks, config);

    match invocation.command {
        Command::List {
            search,
            case_sensitive,
            sort,
        } => {
            let case_sensitive = case_sensitive || store.settings.case_sensitive_search;
            let matcher = compile_query(search.as_deref().unwrap_or(""), case_sensitive)?;
            let sort = sort.unwrap_or(store.settings.default_sort);
            print_list(&store, matcher.as_ref(), sort);
        }
        Command::Add(input) => {
            validated(&input)?;
            let task = store.add_task(&input);
            LocalStorage::save(&ctx, &store.tasks)?;
            println!("Added {}", task.id);
        }
        Command::Edit { id, changes } => {
            let Some(existing) = store.get_task(&id) else {
                bail!("No task with id {}", id);
            };
            let input = changes.apply(existing.to_input());
            validated(&input)?;
            store.update_task(&id, &input);
            LocalStorage::save(&ctx, &store.tasks)?;
            println!("Updated {}", id);
        }
        Command::Delete(id) => {
            if !store.delete_task(&id) {
                bail!("No task with id {}", id);
            }
            LocalStorage::save(&ctx, &store.tasks)?;
            println!("Deleted {}", id);
        }
        Command::Check(pattern) => {
            let matcher = compile(&pattern, store.settings.case_sensitive_search)?;
            println!("Pattern /{}/ is valid", matcher.as_str());
        }
        Command::Search => {
            let case_sensitive = store.settings.case_sensitive_search;
            let sort = store.settings.default_sort;
            interactive_search(store, case_sensitive, sort).await?;
        }
        Command::Examples => {
            for example in SEARCH_EXAMPLES {
                println!("{:<28} {}", example.pattern, example.description);
            }
        }
        Command::Stats => {
            let stats = store.stats();
            println!("Total tasks:   {}", stats.total_tasks);
            println!("Total hours:   {:.1}", stats.total_hours);
            println!("Top tag:       {}", stats.top_tag);
            println!("Recent tasks:  {}", stats.recent_tasks);
            println!(
                "This week:     {:.1} h of {} h ({:.0}%)",
                stats.weekly_hours, stats.cap_target, stats.cap_percentage
            );
            let today = chrono::Local::now().date_naive();
            for day in store.activity_at(today) {
                println!("  {}  {}", day.day, "#".repeat(day.count));
            }
        }
        Command::Import(path) => {
            let count = LocalStorage::import_file(&ctx, &path)?;
            println!("Imported {} task(s)", count);
        }
        Command::Export => {
            println!("{}", store.export_tasks()?);
        }
        Command::Settings { cap, unit } => {
            if let Some(cap) = cap {
                if cap < 0.0 {
                    bail!("Weekly cap cannot be negative");
                }
                store.settings.weekly_cap = cap;
            }
            if let Some(unit) = unit {
                store.settings.time_unit = unit
                    .parse::<TimeUnit>()
                    .map_err(|_| anyhow::anyhow!("Unknown time unit: {}", unit))?;
            }
            store.settings.save(&ctx)?;
            println!("{}", toml::to_string_pretty(&store.settings)?);
            log::info!(
                "Settings saved to {}",
                ctx.get_config_file_path()?.display()
            );
        }
        Command::Clear => {
            LocalStorage::clear_all(&ctx)?;
            store.clear();
            println!("All tasks and settings removed");
        }
        Command::Help => unreachable!("handled above"),
    }

    Ok(())
}
