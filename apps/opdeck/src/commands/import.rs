//! `import` command.

use anyhow::Context;

use crate::anilist::UserRef;
use crate::config::AppConfig;
use crate::import::{CancelHandle, ImportEvent, ImportOutcome};
use crate::state::AppState;

use super::build_coordinator;

/// Import a user's openings. Ctrl-C stops the run after the current show.
pub async fn import(config: &AppConfig, state: &mut AppState, user: &str) -> anyhow::Result<()> {
    let user = UserRef::parse(user).context("user id or name must not be empty")?;
    let coordinator = build_coordinator(config)?;

    let cancel = CancelHandle::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping after the current show");
                cancel.cancel();
            }
        })
    };

    let result = coordinator.run(&user, state, &cancel, print_event).await;
    interrupt.abort();

    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_empty_outcome() => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_event(event: &ImportEvent) {
    match event {
        ImportEvent::Started { total } => println!("Importing openings from {total} shows..."),
        ImportEvent::Progress(p) => {
            println!("[{}/{}] {} cards added", p.processed, p.total, p.cards_added)
        }
        ImportEvent::Finished(report) => {
            let verb = match report.outcome {
                ImportOutcome::Completed => "Finished",
                ImportOutcome::Cancelled => "Cancelled",
            };
            println!(
                "{verb}: {} of {} shows processed, {} cards added, {} cards in deck.",
                report.processed, report.total, report.cards_added, report.stored_cards
            );
            if report.failed > 0 {
                println!("{} shows could not be looked up.", report.failed);
            }
        }
        ImportEvent::Failed { error } => eprintln!("Import failed: {error}"),
    }
}
