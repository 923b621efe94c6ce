//! CLI command implementations.

pub(crate) mod diff;
pub(crate) mod records;
pub(crate) mod serve;
pub(crate) mod sync;
pub(crate) mod tree;

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_source::{LocalSource, Loader, LoaderOptions, LoaderOutput};

pub(crate) use diff::DiffArgs;
pub(crate) use records::RecordsArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use sync::SyncArgs;
pub(crate) use tree::TreeArgs;

use crate::error::CliError;
use crate::output::Output;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct ContentArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local content directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// URL prefix of page URLs (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ContentArgs {
    /// Load configuration with these overrides merged into `settings`.
    pub(crate) fn load_config(&self, settings: CliSettings) -> Result<Config, CliError> {
        let settings = CliSettings {
            source_dir: self.source_dir.clone(),
            base_url: self.base_url.clone(),
            ..settings
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

/// Loader options for the `[source]` section.
pub(crate) fn loader_options(config: &Config) -> LoaderOptions {
    let options = LoaderOptions::new(config.source.base_url.clone())
        .with_root_dir(config.source.root_dir.clone());
    match &config.source.languages {
        Some(languages) => options.with_languages(languages.clone()),
        None => options,
    }
}

/// Load the local content directory, reporting build warnings.
pub(crate) fn load_local(config: &Config, output: &Output) -> Result<LoaderOutput, CliError> {
    let source = LocalSource::new(&config.source.dir, &config.source.include)?;
    let files = source.files()?;
    tracing::info!(dir = %source.dir().display(), files = files.len(), "Collected content files");
    if files.is_empty() {
        output.warning(&format!(
            "No content files found in {}",
            source.dir().display()
        ));
    }
    let loaded = Loader::new(loader_options(config)).load(files)?;
    output.warnings(loaded.warnings());
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_loader_options_from_config() {
        let mut config = Config::default();
        config.source.base_url = "/handbook".to_owned();
        config.source.languages = Some(vec!["en".to_owned(), "cn".to_owned()]);

        let options = loader_options(&config);

        assert_eq!(options.base_url, "/handbook");
        assert_eq!(options.languages, Some(vec!["en".to_owned(), "cn".to_owned()]));
    }

    #[test]
    fn test_load_local() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("index.mdx"), "---\ntitle: Home\n---\n").unwrap();
        let mut config = Config::default();
        config.source.dir = temp.path().to_path_buf();

        let loaded = load_local(&config, &Output::new()).unwrap();

        assert_eq!(loaded.get_pages(None).len(), 1);
        assert_eq!(loaded.get_pages(None)[0].url, "/docs");
    }
}
