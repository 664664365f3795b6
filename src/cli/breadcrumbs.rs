use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::debug;
use webstate_breadcrumbs::{
    crash_report, load_previous_events, BreadcrumbLog, ObserverId, PersistentStore,
    SharedBreadcrumbLog,
};

use crate::config::AppConfig;

#[derive(Args, Clone, Debug)]
pub struct BreadcrumbsArgs {
    #[command(subcommand)]
    pub command: BreadcrumbsCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum BreadcrumbsCommand {
    /// Print stored breadcrumbs, oldest first
    Show(ShowArgs),
    /// Append one breadcrumb to the store
    Add(AddArgs),
    /// Print the size-limited crash report value
    CrashReport(CrashReportArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ShowArgs {
    /// Only the most recent N events (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

#[derive(Args, Clone, Debug)]
pub struct AddArgs {
    /// Event text; must be a single line
    pub text: String,
}

#[derive(Args, Clone, Debug)]
pub struct CrashReportArgs {
    #[arg(long, default_value_t = crash_report::CRASH_KEY_MAX_BYTES)]
    pub max_bytes: usize,
}

/// A breadcrumb log seeded from, and mirrored into, the configured store.
/// The store observer is detached on drop.
pub struct StoredLog {
    log: SharedBreadcrumbLog,
    store: Arc<PersistentStore>,
    observer: ObserverId,
}

impl StoredLog {
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = PersistentStore::open(
            &config.breadcrumb_store,
            config.breadcrumbs.persist_max_lines,
        )
        .with_context(|| {
            format!(
                "Failed to open breadcrumb store {}",
                config.breadcrumb_store.display()
            )
        })?;
        let mut log = BreadcrumbLog::new(config.breadcrumbs.clone());
        log.set_previous_events(&store.lines());
        let observer = log.add_observer(store.clone());
        Ok(Self {
            log: log.shared(),
            store,
            observer,
        })
    }

    pub fn log(&self) -> SharedBreadcrumbLog {
        Arc::clone(&self.log)
    }

    pub fn persist(&self) -> Result<()> {
        self.store.flush().context("Failed to persist breadcrumbs")
    }
}

impl Drop for StoredLog {
    fn drop(&mut self) {
        self.log.lock().remove_observer(self.observer);
    }
}

pub async fn cmd_breadcrumbs(args: BreadcrumbsArgs, config: &AppConfig) -> Result<()> {
    match args.command {
        BreadcrumbsCommand::Show(show) => {
            for event in previous_log(config)?.events(show.limit) {
                println!("{event}");
            }
        }
        BreadcrumbsCommand::Add(add) => {
            let stored = StoredLog::open(config)?;
            stored
                .log()
                .lock()
                .add_event(&add.text)
                .context("Failed to add breadcrumb")?;
            stored.persist()?;
            debug!(store = %config.breadcrumb_store.display(), "breadcrumb stored");
        }
        BreadcrumbsCommand::CrashReport(report) => {
            let events = previous_log(config)?.events(0);
            println!("{}", crash_report::render(&events, report.max_bytes));
        }
    }
    Ok(())
}

fn previous_log(config: &AppConfig) -> Result<BreadcrumbLog> {
    let previous = load_previous_events(
        &config.breadcrumb_store,
        config.breadcrumbs.persist_max_lines,
    )
    .with_context(|| {
        format!(
            "Failed to read breadcrumb store {}",
            config.breadcrumb_store.display()
        )
    })?;
    let mut log = BreadcrumbLog::new(config.breadcrumbs.clone());
    log.set_previous_events(&previous);
    Ok(log)
}
