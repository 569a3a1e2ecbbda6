use std::sync::Arc;

mod cli;

use clap::Parser;

use cli::Cli;
use quill::config::QuillConfig;
use quill::store::OrgStore;
use quill::widget::StampNotifier;

/// Log to the systemd user journal (`journalctl --user -t quill -f`).
/// Quill targets log at info (debug when enabled), everything else at warn.
fn init_logging(config: &QuillConfig) {
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("quill") {
                let max = if quill::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    quill::set_debug_logging(config.debug_logging);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("quill".to_string()),
        Err(e) => {
            eprintln!("quill: journal logging unavailable: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so quill debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, config_error) = match QuillConfig::default_path().map(|path| QuillConfig::load(&path)) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (QuillConfig::default(), Some(e)),
        None => (QuillConfig::default(), None),
    };
    init_logging(&config);
    if let Some(e) = config_error {
        log::warn!("Using default settings: {}", e);
        eprintln!("quill: using default settings: {}", e);
    }

    config.ensure_files()?;
    let store = Arc::new(OrgStore::open(&config).await?);
    let notifier = Arc::new(StampNotifier::new(config.widgets_dir()));

    cli::run(cli.command, store, notifier).await
}
