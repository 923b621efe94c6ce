//! `folio serve` command implementation.

use std::sync::Arc;

use clap::Args;
use folio_config::CliSettings;
use folio_remote::{GitHost, GithubClient, RemoteSite, RemoteSiteOptions};
use folio_server::{run_server, server_config_from_config};

use super::{ContentArgs, loader_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub(crate) content: ContentArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Open the remote site and serve webhooks until Ctrl-C.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load_config(CliSettings {
            host: self.host,
            port: self.port,
            ..CliSettings::default()
        })?;
        let github = config.require_github()?;

        output.info(&format!(
            "Content: {}/{} branch {} directory {}",
            github.owner, github.repo, github.branch, github.directory
        ));
        output.info(&format!(
            "Cache file: {}",
            config.cache.save_file.display()
        ));

        let host: Box<dyn GitHost> = Box::new(GithubClient::new(
            &github.owner,
            &github.repo,
            github.access_token.clone(),
        ));
        let options = RemoteSiteOptions {
            directory: github.directory.clone(),
            branch: github.branch.clone(),
            save_file: Some(config.cache.save_file.clone()),
            include: config.source.include.clone(),
            cache_outputs: config.cache.outputs,
        };
        let site = RemoteSite::open(host, options, loader_options(&config))?;
        output.info(&format!("Content tree: {}", site.sha()));

        let server_config = server_config_from_config(&config);
        output.highlight(&format!(
            "Listening on {}:{}",
            server_config.host, server_config.port
        ));
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(run_server(server_config, Arc::new(site)))?;
        Ok(())
    }
}
