//! `oauth1 serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use oauth1_config::{CliSettings, Config};
use oauth1_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover oauth1.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Externally visible base URL used for signature checks (overrides config).
    #[arg(long)]
    public_url: Option<String>,

    /// Enable verbose output (log every accepted and rejected request).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            public_url: self.public_url,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        // CLI overrides bypass load-time validation
        config.validate()?;

        if config.clients.is_empty() {
            return Err(CliError::Validation(
                "No clients configured; add [[clients]] entries to oauth1.toml".to_owned(),
            ));
        }

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!("Endpoint: {}", config.server.endpoint));
        match &config.server.public_url {
            Some(url) => output.info(&format!("Public URL: {url}")),
            None => output.info("Public URL: derived from Host header"),
        }
        output.info(&format!(
            "Signature methods: {}",
            config.policy.signature_methods.join(", ")
        ));
        output.info(&format!("Clients: {}", config.clients.len()));

        let server_config = server_config_from_config(&config)?;
        run_server(server_config).await?;

        Ok(())
    }
}
