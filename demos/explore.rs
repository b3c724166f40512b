//! Loads a JSONL file, prints progress and schema, then runs one query.
//!
//! cargo run --example explore -- <file.jsonl[.gz]> [pattern] [field] [--regex] [--all]
//!
//! Set RUST_LOG=linescope=debug to see progress publications.

use std::sync::Arc;
use linescope::core::config::{Config, LineCap};
use linescope::core::explorer::Explorer;
use linescope::query::types::QuerySpec;
use linescope::writer::observer::{ChannelObserver, IngestEvent};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linescope=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> linescope::Result<()> {
    init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let regex = take_flag(&mut args, "--regex");
    let unbounded = take_flag(&mut args, "--all");
    let Some(path) = args.first().cloned() else {
        eprintln!("usage: explore <file.jsonl[.gz]> [pattern] [field] [--regex] [--all]");
        std::process::exit(2);
    };
    let pattern = args.get(1).cloned().unwrap_or_default();
    let field = args.get(2).cloned();

    let mut config = Config::default().with_nested_flattening(true);
    if unbounded {
        config = config.with_line_cap(LineCap::Unbounded);
    }

    let (observer, events) = ChannelObserver::new();
    let mut explorer = Explorer::with_observer(config, Arc::new(observer));
    explorer.open(&path)?;

    for event in events.iter() {
        match event {
            IngestEvent::Progress(p) => match p.percent {
                Some(percent) => println!("loaded {:>9} records, {:>6} errors ({:.1}%)", p.records_loaded, p.errors_count, percent),
                None => println!("loaded {:>9} records, {:>6} errors", p.records_loaded, p.errors_count),
            },
            IngestEvent::Completed(c) => {
                if let Some(failure) = &c.failure {
                    eprintln!("load failed: {}", failure);
                }
                break;
            }
        }
    }
    explorer.wait()?;

    if let Some(stats) = explorer.stats() {
        println!("\n{}", stats);
    }

    let mut spec = if regex { QuerySpec::regex(pattern) } else { QuerySpec::substring(pattern) };
    if let Some(field) = field {
        spec = spec.in_field(field);
    }

    let matches = explorer.query_all(&spec)?;
    println!("{} matching records", matches.len());
    for &index in matches.iter().take(20) {
        if let Some(record) = explorer.get(index) {
            println!("  line {:>7}: {}", record.line_number, record.preview(120));
        }
    }

    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}
