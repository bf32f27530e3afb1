// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::info;

// Use library instead of local modules
use life_tracker::export::{self, ExportFormat};
use life_tracker::forms::{self, FormSchema, FormState, InputType, DATE_FIELD};
use life_tracker::logging::{enable_logging, CLI_PREFIX};
use life_tracker::summary::{history_rows, SummaryView};
use life_tracker::{
    Config, DeleteOutcome, KeyValueStorage, NavTag, RecordType, StorageArgs, Tracker, View,
};

#[derive(Parser, Debug)]
#[command(name = "life-tracker", version, long_about = None)]
#[command(about = "Track expenses, activity, health habits and work/study time")]
struct Args {
    #[command(flatten)]
    storage: StorageArgs,

    #[arg(long, help = "Also print logs to stderr (debug level)")]
    log: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Open the terminal UI (default)")]
    Ui,

    #[command(about = "Add a record, e.g. `add expense -f amount=20 -f category=Food ...`")]
    Add {
        #[arg(help = "expense, activity, habit or work")]
        record_type: RecordType,

        #[arg(
            short,
            long = "field",
            value_parser = parse_field,
            help = "Field value as name=value (repeatable)"
        )]
        fields: Vec<(String, String)>,

        #[arg(long, help = "Date as YYYY-MM-DD [default: today]")]
        date: Option<String>,
    },

    #[command(about = "Show the fields a record type's form takes")]
    Fields {
        record_type: RecordType,
    },

    #[command(about = "List the record history")]
    List {
        #[arg(long = "type", help = "Only show one record type")]
        record_type: Option<RecordType>,
    },

    #[command(about = "Show counts, total spent and history")]
    Summary,

    #[command(about = "Delete a record by its row number (# column)")]
    Remove {
        row: usize,

        #[arg(short, long, help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "Export the history")]
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        #[arg(short, long, help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Ui);

    let config = Config::resolve(&args.storage)?;
    let ui_mode = matches!(command, Commands::Ui);
    enable_logging(
        CLI_PREFIX,
        &config.log_dir(),
        args.log.then_some(LevelFilter::DEBUG),
        args.log && !ui_mode,
    )?;
    info!("Using {:?} (key {:?})", config.db_path(), config.storage_key);

    let tracker = Tracker::new(config.open_store()?);

    match command {
        Commands::Ui => run_ui_mode(tracker),
        Commands::Add {
            record_type,
            fields,
            date,
        } => run_add(tracker, record_type, fields, date),
        Commands::Fields { record_type } => run_fields(&record_type),
        Commands::List { record_type } => run_list(&tracker, record_type.as_ref()),
        Commands::Summary => run_summary(&tracker),
        Commands::Remove { row, yes } => run_remove(tracker, row, yes),
        Commands::Export { format, output } => run_export(&tracker, format, output),
    }
}

fn run_add<S: KeyValueStorage>(
    mut tracker: Tracker<S>,
    record_type: RecordType,
    fields: Vec<(String, String)>,
    date: Option<String>,
) -> Result<()> {
    tracker.navigate(View::Form(record_type).tag());

    let mut state = FormState::from_pairs(fields);
    if let Some(date) = date {
        state.set(DATE_FIELD, date);
    }

    let record = tracker.submit(&mut state, forms::today())?;
    println!("✓ Record saved! {} ({})", record.primary_info(), record.date);
    Ok(())
}

fn run_fields(record_type: &RecordType) -> Result<()> {
    let schema = FormSchema::for_type(record_type)
        .with_context(|| format!("No form for {record_type}"))?;

    println!("{}", schema.title);
    for field in &schema.fields {
        let kind = match field.input_type {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Date => "date",
        };
        let required = if field.required { "required" } else { "optional" };
        println!("  {:<10} {:<7} {:<9} {}", field.name, kind, required, field.label);
    }
    Ok(())
}

fn run_list<S: KeyValueStorage>(tracker: &Tracker<S>, only: Option<&RecordType>) -> Result<()> {
    // Row numbers stay the store positions so `remove` can use them
    let rows: Vec<_> = history_rows(tracker.store().records())
        .into_iter()
        .filter(|row| only.map_or(true, |t| row.record_type == t.as_str()))
        .collect();

    if rows.is_empty() {
        println!("No history yet.");
        return Ok(());
    }

    println!("{:>4}  {:<9} {:<40} {}", "#", "Type", "Main Info", "Date");
    for row in rows {
        println!(
            "{:>4}  {:<9} {:<40} {}",
            row.number, row.record_type, row.primary_info, row.date
        );
    }
    Ok(())
}

fn run_summary<S: KeyValueStorage>(tracker: &Tracker<S>) -> Result<()> {
    let summary = SummaryView::build(tracker.store().records());

    println!("{}", summary.title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for card in &summary.cards {
        println!("  {:<14} {}", card.label, card.value);
    }

    println!("\n{}", summary.history_title);
    if let Some(message) = summary.empty_message {
        println!("  {message}");
    }
    for row in &summary.history {
        println!(
            "{:>4}  {:<9} {:<40} {}",
            row.number, row.record_type, row.primary_info, row.date
        );
    }
    Ok(())
}

fn run_remove<S: KeyValueStorage>(mut tracker: Tracker<S>, row: usize, yes: bool) -> Result<()> {
    if row == 0 {
        bail!("Row numbers start at 1");
    }

    tracker.navigate(NavTag::Summary);
    let pending = tracker.request_delete(&(row - 1).to_string())?;
    println!("#{row} {} {}", pending.record.record_type, pending.record.primary_info());
    let prompt = pending.prompt;

    let confirmed = yes || ask(prompt)?;

    match tracker.resolve_delete(confirmed)? {
        DeleteOutcome::Deleted(_) => println!("✓ Deleted row {row}"),
        DeleteOutcome::Cancelled => println!("Cancelled"),
    }
    Ok(())
}

fn ask(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn run_export<S: KeyValueStorage>(
    tracker: &Tracker<S>,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let records = tracker.store().records();

    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {path:?}"))?;
            export::export(records, format, io::BufWriter::new(file))?;
            eprintln!("✓ Exported {} records to {:?}", records.len(), path);
        }
        None => export::export(records, format, io::stdout().lock())?,
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode<S: KeyValueStorage>(tracker: Tracker<S>) -> Result<()> {
    let mut app = ui::App::new(tracker);
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode<S: KeyValueStorage>(_tracker: Tracker<S>) -> Result<()> {
    bail!("TUI mode not available. Rebuild with `--features tui`, or use the add/list/summary commands")
}
