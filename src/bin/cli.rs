use std::collections::BTreeSet;
use std::io::{self, Write};

use chrono::NaiveDate;
use log::LevelFilter;
use polars::prelude::{AnyValue, DataFrame};

#[cfg(feature = "sqlite")]
use cadence_tool::{LedgerStore, SqliteLedgerStore};
use cadence_tool::{
    Ledger, LoadEstimator, RecurrenceRule, RuleSpec, TransactionKind, TransactionProfile,
    WeekSampler, load_ledger_from_csv, load_ledger_from_json, save_ledger_to_csv,
    save_ledger_to_json,
};

/// Logs to stderr and nothing else; filtering happens through the global
/// max level.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

fn init_logger() {
    let level = std::env::var("CADENCE_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Off);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn parse_days_list(s: &str) -> BTreeSet<u32> {
    s.split(',')
        .filter_map(|p| p.trim().parse::<u32>().ok())
        .collect()
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    // Compute column widths
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for (ci, col) in columns.iter().enumerate() {
        for row_idx in 0..df.height() {
            if let Ok(ref av) = col.get(row_idx) {
                let s = render_any_value(av);
                if s.len() > widths[ci] {
                    widths[ci] = s.len();
                }
            }
        }
    }

    // Build horizontal separator
    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    // Build output
    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    // Header
    out.push('|');
    for (i, name) in col_names.iter().enumerate() {
        out.push(' ');
        out.push_str(name);
        let pad = widths[i] - name.len();
        if pad > 0 { out.push_str(&" ".repeat(pad)); }
        out.push(' ');
        out.push('|');
    }
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');

    // Rows
    for row_idx in 0..df.height() {
        out.push('|');
        for (ci, col) in columns.iter().enumerate() {
            let mut s = String::new();
            if let Ok(ref av) = col.get(row_idx) {
                s = render_any_value(av);
            }
            out.push(' ');
            out.push_str(&s);
            let pad = widths[ci].saturating_sub(s.len());
            if pad > 0 { out.push_str(&" ".repeat(pad)); }
            out.push(' ');
            out.push('|');
        }
        out.push('\n');
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_any_value(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => v.to_string(),
        AnyValue::Boolean(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn show_ledger(ledger: &Ledger) {
    match ledger.to_dataframe() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show the rule ledger\n  weekly  <name> <YYYY-MM-DD> [interval] [days_csv]\n                                     Add a weekly rule (days like 0,2 with Monday=0)\n  monthly <name> <YYYY-MM-DD> <days_csv> [clamp]\n                                     Add a monthly rule ('clamp' pins overflow days to month end)\n  end     <id> <YYYY-MM-DD>          Set a rule's end date\n  delete  <id>                       Remove a rule\n  occurs  <id> <YYYY-MM-DD>          Check a single date against a rule\n  between <id> <YYYY-MM-DD> <YYYY-MM-DD>\n                                     List occurrences inside a window\n  weeks   <id> [limit]               Sample representative week starts\n  preview <id> [limit]               Estimate weekly load against the other rules\n  txn     <id> <kind> <amount> <owner...>\n                                     Attach an income|expense|savings payload\n  untxn   <id>                       Detach the payload\n  save    <json|csv> <path>          Write the ledger to a file\n  load    <json|csv> <path>          Read the ledger from a file\n  db      <save|load> <path>         Persist to or from a SQLite database\n  quit|exit                          Exit"
    );
}

fn main() {
    init_logger();

    let mut ledger = Ledger::new();

    println!("Cadence Tool (CLI) - type 'help' for commands\n");
    show_ledger(&ledger);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        if stdin.read_line(&mut line).is_err() {
            break;
        }
        let input = line.trim();
        if input.is_empty() { continue; }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => {
                print_help();
            }
            "quit" | "exit" => break,
            "show" => {
                show_ledger(&ledger);
            }
            "weekly" => {
                let name_s = parts.next();
                let start_s = parts.next();
                let interval_s = parts.next();
                let days_s = parts.next();
                match (name_s, start_s) {
                    (Some(name), Some(start_s)) => {
                        let start = match NaiveDate::parse_from_str(start_s, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                        let mut spec = RuleSpec::weekly(name, start);
                        if let Some(interval_s) = interval_s {
                            spec.interval = match interval_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid interval"); continue; } };
                        }
                        if let Some(days_s) = days_s {
                            spec.days = Some(parse_days_list(days_s));
                        }
                        match spec.build() {
                            Ok(rule) => {
                                let id = ledger.add(rule);
                                println!("Rule added with id={}", id);
                                show_ledger(&ledger);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: weekly <name> <YYYY-MM-DD> [interval] [days_csv]"),
                }
            }
            "monthly" => {
                let name_s = parts.next();
                let start_s = parts.next();
                let days_s = parts.next();
                let clamp_s = parts.next();
                match (name_s, start_s, days_s) {
                    (Some(name), Some(start_s), Some(days_s)) => {
                        let start = match NaiveDate::parse_from_str(start_s, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                        let mut spec = RuleSpec::monthly(name, start);
                        spec.days = Some(parse_days_list(days_s));
                        spec.clamp_to_month_end = matches!(clamp_s, Some("clamp"));
                        match spec.build() {
                            Ok(rule) => {
                                let id = ledger.add(rule);
                                println!("Rule added with id={}", id);
                                show_ledger(&ledger);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: monthly <name> <YYYY-MM-DD> <days_csv> [clamp]"),
                }
            }
            "end" => {
                let id_s = parts.next();
                let date_s = parts.next();
                match (id_s, date_s) {
                    (Some(id_s), Some(date_s)) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let date = match NaiveDate::parse_from_str(date_s, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                        let Some(entry) = ledger.get(id) else {
                            println!("No rule with id={}", id);
                            continue;
                        };
                        let mut spec = entry.rule.to_spec();
                        spec.end_date = Some(date);
                        match spec.build() {
                            Ok(rule) => {
                                ledger.replace_rule(id, rule);
                                println!("End date set.");
                                show_ledger(&ledger);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: end <id> <YYYY-MM-DD>"),
                }
            }
            "delete" => {
                match parts.next() {
                    Some(id_s) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        if ledger.remove(id) {
                            println!("Rule {} removed.", id);
                        } else {
                            println!("No rule with id={}", id);
                        }
                    }
                    None => println!("Usage: delete <id>"),
                }
            }
            "occurs" => {
                let id_s = parts.next();
                let date_s = parts.next();
                match (id_s, date_s) {
                    (Some(id_s), Some(date_s)) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let date = match NaiveDate::parse_from_str(date_s, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                        match ledger.get(id) {
                            Some(entry) => {
                                if entry.rule.occurs_on(date) {
                                    println!("{}: occurs", date);
                                } else {
                                    println!("{}: no occurrence", date);
                                }
                            }
                            None => println!("No rule with id={}", id),
                        }
                    }
                    _ => println!("Usage: occurs <id> <YYYY-MM-DD>"),
                }
            }
            "between" => {
                let id_s = parts.next();
                let start_s = parts.next();
                let end_s = parts.next();
                match (id_s, start_s, end_s) {
                    (Some(id_s), Some(start_s), Some(end_s)) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let start = match NaiveDate::parse_from_str(start_s, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                        let end = match NaiveDate::parse_from_str(end_s, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                        let Some(entry) = ledger.get(id) else {
                            println!("No rule with id={}", id);
                            continue;
                        };
                        let dates = entry.rule.occurrences_between(start, end);
                        for date in &dates {
                            println!("{}", date);
                        }
                        println!("{} occurrence(s)", dates.len());
                    }
                    _ => println!("Usage: between <id> <YYYY-MM-DD> <YYYY-MM-DD>"),
                }
            }
            "weeks" => {
                let id_s = parts.next();
                let limit_s = parts.next();
                match id_s {
                    Some(id_s) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let Some(entry) = ledger.get(id) else {
                            println!("No rule with id={}", id);
                            continue;
                        };
                        let mut sampler = WeekSampler::new(&entry.rule);
                        if let Some(limit_s) = limit_s {
                            let limit: usize = match limit_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid limit"); continue; } };
                            sampler = sampler.with_week_limit(limit);
                        }
                        match sampler.sample() {
                            Ok(weeks) => {
                                for week in &weeks {
                                    println!("{}", week);
                                }
                                println!("{} week(s) sampled", weeks.len());
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    None => println!("Usage: weeks <id> [limit]"),
                }
            }
            "preview" => {
                let id_s = parts.next();
                let limit_s = parts.next();
                match id_s {
                    Some(id_s) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let Some(entry) = ledger.get(id) else {
                            println!("No rule with id={}", id);
                            continue;
                        };
                        let existing: Vec<RecurrenceRule> = ledger
                            .entries()
                            .iter()
                            .filter(|e| e.id != id)
                            .map(|e| e.rule.clone())
                            .collect();
                        let mut estimator = LoadEstimator::new(&entry.rule, &existing);
                        if let Some(limit_s) = limit_s {
                            let limit: usize = match limit_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid limit"); continue; } };
                            estimator = estimator.with_week_limit(limit);
                        }
                        match estimator.estimate() {
                            Ok(report) => {
                                println!("{}", report.summary());
                                match report.to_dataframe() {
                                    Ok(df) => println!("{}", render_df_as_text_table(&df)),
                                    Err(e) => println!("Error: {}", e),
                                }
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    None => println!("Usage: preview <id> [limit]"),
                }
            }
            "txn" => {
                let id_s = parts.next();
                let kind_s = parts.next();
                let amount_s = parts.next();
                let owner: Vec<&str> = parts.collect();
                match (id_s, kind_s, amount_s, !owner.is_empty()) {
                    (Some(id_s), Some(kind_s), Some(amount_s), true) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let kind: TransactionKind = match kind_s.parse() { Ok(v) => v, Err(e) => { println!("Error: {}", e); continue; } };
                        let amount: f64 = match amount_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid amount"); continue; } };
                        match TransactionProfile::new(amount, kind, owner.join(" ")) {
                            Ok(payload) => {
                                if ledger.set_payload(id, payload) {
                                    println!("Payload set.");
                                    show_ledger(&ledger);
                                } else {
                                    println!("No rule with id={}", id);
                                }
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: txn <id> <income|expense|savings> <amount> <owner...>"),
                }
            }
            "untxn" => {
                match parts.next() {
                    Some(id_s) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        if ledger.clear_payload(id) {
                            println!("Payload cleared.");
                        } else {
                            println!("No payload on id={}", id);
                        }
                    }
                    None => println!("Usage: untxn <id>"),
                }
            }
            "save" | "load" => {
                let format_s = parts.next();
                let path_s = parts.next();
                match (format_s, path_s) {
                    (Some(format), Some(path)) => {
                        let result = match (cmd, format) {
                            ("save", "json") => save_ledger_to_json(&ledger, path),
                            ("save", "csv") => save_ledger_to_csv(&ledger, path),
                            ("load", "json") => load_ledger_from_json(path).map(|loaded| ledger = loaded),
                            ("load", "csv") => load_ledger_from_csv(path).map(|loaded| ledger = loaded),
                            _ => {
                                println!("Unknown format '{}'. Use json or csv.", format);
                                continue;
                            }
                        };
                        match result {
                            Ok(()) if cmd == "save" => println!("Saved to {}.", path),
                            Ok(()) => {
                                println!("Loaded from {}.", path);
                                show_ledger(&ledger);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: {} <json|csv> <path>", cmd),
                }
            }
            #[cfg(feature = "sqlite")]
            "db" => {
                let action_s = parts.next();
                let path_s = parts.next();
                match (action_s, path_s) {
                    (Some(action), Some(path)) => {
                        let store = match SqliteLedgerStore::new(path) { Ok(s) => s, Err(e) => { println!("Error: {}", e); continue; } };
                        match action {
                            "save" => match store.replace_ledger(&ledger) {
                                Ok(()) => println!("Saved to {}.", path),
                                Err(e) => println!("Error: {}", e),
                            },
                            "load" => match store.load_ledger() {
                                Ok(loaded) => {
                                    ledger = loaded;
                                    println!("Loaded from {}.", path);
                                    show_ledger(&ledger);
                                }
                                Err(e) => println!("Error: {}", e),
                            },
                            _ => println!("Usage: db <save|load> <path>"),
                        }
                    }
                    _ => println!("Usage: db <save|load> <path>"),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
