//! `oauth1 sign` command implementation.
//!
//! Client-side helper that signs a temporary credential request, for
//! exercising a running server with curl.

use std::path::PathBuf;

use clap::Args;
use oauth1_signature::SignatureMethod;
use oauth1_signature::key::load_private_key_from_file;
use oauth1_signature::sign::{RequestSigner, authorization_header, form_body};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sign command.
#[derive(Args)]
pub(crate) struct SignArgs {
    /// Endpoint URL exactly as the server sees it.
    #[arg(long)]
    url: String,

    /// Client identifier.
    #[arg(long)]
    consumer_key: String,

    /// Shared secret (PLAINTEXT and HMAC-SHA1).
    #[arg(long, env = "OAUTH1_CLIENT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// PEM file with the RSA private key (RSA-SHA1).
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Signature method.
    #[arg(long, default_value = "HMAC-SHA1", value_parser = parse_method)]
    method: SignatureMethod,

    /// Callback URI, or `oob`.
    #[arg(long, default_value = "oob")]
    callback: String,

    /// Realm to include in the Authorization header.
    #[arg(long)]
    realm: Option<String>,

    /// Print a form-encoded body instead of an Authorization header.
    #[arg(long)]
    form: bool,
}

fn parse_method(name: &str) -> Result<SignatureMethod, String> {
    SignatureMethod::from_name(name).ok_or_else(|| {
        let known: Vec<_> = SignatureMethod::ALL.iter().map(|m| m.name()).collect();
        format!("expected one of {}", known.join(", "))
    })
}

impl SignArgs {
    /// Execute the sign command.
    ///
    /// # Errors
    ///
    /// Returns an error if key material is missing or unreadable, or the URL
    /// is invalid.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let line = self.render()?;
        if self.form {
            output.highlight("Request body:");
        } else {
            output.highlight("Authorization header:");
        }
        output.result(&line);
        Ok(())
    }

    fn render(&self) -> Result<String, CliError> {
        let private_key = match (&self.private_key, self.method) {
            (Some(path), _) => Some(load_private_key_from_file(path)?),
            (None, SignatureMethod::RsaSha1) => {
                return Err(CliError::Validation(
                    "--private-key is required for RSA-SHA1".to_owned(),
                ));
            }
            (None, _) => None,
        };
        if self.secret.is_none() && self.method != SignatureMethod::RsaSha1 {
            return Err(CliError::Validation(format!(
                "--secret is required for {}",
                self.method
            )));
        }

        let mut signer =
            RequestSigner::new(&self.consumer_key, self.method).with_callback(&self.callback);
        if let Some(secret) = &self.secret {
            signer = signer.with_secret(secret);
        }
        if let Some(key) = &private_key {
            signer = signer.with_private_key(key);
        }

        let params = signer.sign("POST", &self.url, &[])?;
        Ok(if self.form {
            form_body(&params, &[])
        } else {
            authorization_header(&params, self.realm.as_deref())
        })
    }
}
