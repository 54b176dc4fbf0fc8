//! CLI runner - executes the selected mode

use crate::catalog::{Catalog, Selection};
use crate::cli::commands::{Cli, Mode};
use crate::config::TapConfig;
use crate::engine::{JsonLinesWriter, MessageWriter, SyncStats};
use crate::error::Result;
use crate::state::StateManager;
use crate::tap::TapTalkable;
use serde_json::Value;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.mode() {
            Mode::About => {
                Self::output_document(&TapTalkable::about());
                Ok(())
            }
            Mode::Discover => {
                let tap = self.load_tap()?;
                Self::output_document(&tap.discover().to_value());
                Ok(())
            }
            Mode::Sync => {
                let tap = self.load_tap()?;
                self.sync(&tap, JsonLinesWriter::stdout()).await?;
                Ok(())
            }
        }
    }

    /// Sync every selected stream into `writer`
    pub async fn sync<W: MessageWriter>(&self, tap: &TapTalkable, writer: W) -> Result<SyncStats> {
        let state = self.load_state()?;
        let selection = self.load_selection()?;
        let client = tap.http_client()?;

        info!(
            "Syncing site {} from {}",
            tap.config().site_slug,
            tap.settings().start_date
        );
        let mut engine = tap.engine(client, state, selection, writer);
        engine.sync_all().await
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        TapConfig::from_files(&self.cli.config)
    }

    fn load_tap(&self) -> Result<TapTalkable> {
        Ok(TapTalkable::new(self.load_config()?))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    fn load_selection(&self) -> Result<Selection> {
        match &self.cli.catalog {
            Some(path) => Ok(Selection::Catalog(Catalog::from_file(path)?)),
            None => Ok(Selection::All),
        }
    }

    fn output_document(doc: &Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(doc).unwrap_or_default()
        );
    }
}
