//! `folio records` command implementation.

use clap::{Args, ValueEnum};
use folio_config::CliSettings;
use folio_search::{
    advanced_indexes, all_document_records, per_language, simple_indexes, to_index_records,
};

use super::{ContentArgs, load_local};
use crate::error::CliError;
use crate::output::{Output, print_json};

/// Shape of the printed index.
#[derive(Clone, Copy, Default, ValueEnum)]
enum Format {
    /// Records as pushed by `folio sync`.
    #[default]
    Records,
    /// Title, content and URL per page, grouped by locale.
    Simple,
    /// Structured data per page, grouped by locale.
    Advanced,
}

/// Arguments for the records command.
#[derive(Args)]
pub(crate) struct RecordsArgs {
    #[command(flatten)]
    pub(crate) content: ContentArgs,

    /// Index shape.
    #[arg(long, value_enum, default_value_t)]
    format: Format,
}

impl RecordsArgs {
    /// Print search records for the local content directory.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load_config(CliSettings::default())?;
        let loaded = load_local(&config, &output)?;

        match self.format {
            Format::Records => {
                let documents = all_document_records(&loaded, config.search.tag.as_deref());
                print_json(&to_index_records(&documents))
            }
            Format::Simple => print_json(&per_language(&loaded, simple_indexes)),
            Format::Advanced => print_json(&per_language(&loaded, advanced_indexes)),
        }
    }
}
