//! `folio sync` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::CliSettings;
use folio_search::{JsonDirClient, SyncOptions, all_document_records, sync};

use super::{ContentArgs, load_local};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sync command.
#[derive(Args)]
pub(crate) struct SyncArgs {
    #[command(flatten)]
    pub(crate) content: ContentArgs,

    /// Directory receiving `<index>.json` (default: .folio/search).
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl SyncArgs {
    /// Replace the search index with the records of the local content.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load_config(CliSettings::default())?;
        let loaded = load_local(&config, &output)?;

        let out = self.out.unwrap_or_else(|| PathBuf::from(".folio/search"));
        let documents = all_document_records(&loaded, config.search.tag.as_deref());
        let options = SyncOptions::new(documents).with_index(config.search.index.clone());

        let count = sync(&JsonDirClient::new(&out), &options)?;
        output.success(&format!(
            "Synced {count} records into index '{}' ({})",
            options.document,
            out.display()
        ));
        Ok(())
    }
}
