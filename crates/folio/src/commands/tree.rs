//! `folio tree` command implementation.

use clap::Args;
use folio_config::CliSettings;

use super::{ContentArgs, load_local};
use crate::error::CliError;
use crate::output::{Output, print_json};

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    #[command(flatten)]
    pub(crate) content: ContentArgs,

    /// Only print the tree of this locale.
    #[arg(long)]
    lang: Option<String>,
}

impl TreeArgs {
    /// Print the page tree of the local content directory.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load_config(CliSettings::default())?;
        let loaded = load_local(&config, &output)?;

        match self.lang.as_deref() {
            Some(lang) => {
                let root = loaded.page_tree(lang).ok_or_else(|| {
                    CliError::Validation(format!("No page tree for locale '{lang}'"))
                })?;
                print_json(root)
            }
            None => print_json(loaded.page_trees()),
        }
    }
}
