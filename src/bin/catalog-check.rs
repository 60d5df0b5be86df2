/// Check the event catalog for gaps the site would silently render as blanks.
///
/// Usage: catalog-check [--group KEY]
///   --group KEY : also print what that group sees, resolved

use std::process::ExitCode;

use clap::Parser;
use wedding_api::{models::group::AccessGroup, services::catalog};

#[derive(Parser)]
#[command(name = "catalog-check", about = "Validate the wedding event catalog")]
struct Args {
    /// Group whose resolved events should be listed
    #[arg(long)]
    group: Option<AccessGroup>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let events = catalog::events();

    if let Some(group) = args.group {
        let mut visible = catalog::filter_events(events, group);
        catalog::sort_by_date(&mut visible);
        println!("{} sees {} events:", group.label(), visible.len());
        for event in visible {
            let view = catalog::event_view(event, group);
            println!("  {} {:<16} {} @ {}", view.date, view.time, view.title, view.location);
        }
    }

    let issues = catalog::validate_catalog(events);
    if issues.is_empty() {
        tracing::info!("Catalog OK: {} events checked", events.len());
        return ExitCode::SUCCESS;
    }

    for issue in &issues {
        match issue.group {
            Some(group) => tracing::error!("{} [{}]: {}", issue.event_id, group, issue.problem),
            None => tracing::error!("{}: {}", issue.event_id, issue.problem),
        }
    }
    tracing::error!("Catalog has {} problem(s)", issues.len());
    ExitCode::FAILURE
}
