//! `${VAR}` and `${VAR:-default}` references in configuration values.
//!
//! Bare `$VAR` is left alone so secrets containing `$` survive unchanged.

use std::borrow::Cow;

use crate::ConfigError;

/// Variable named in a reference but absent from the environment.
struct UnsetVar(String);

/// Expand references in `value`, naming `field` in the error.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| {
        std::env::var(name)
            .map(Some)
            .map_err(|_| UnsetVar(name.to_owned()))
    })
    .map(Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional value in place.
pub(crate) fn expand_optional(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(raw) = value.as_deref() {
        *value = Some(expand_env(raw, field)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_secret_from_env() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("OAUTH1_EXPAND_SECRET", "kd94hf93k423kf44");
        }
        let secret = expand_env("${OAUTH1_EXPAND_SECRET}", "clients.app.secret").unwrap();
        assert_eq!(secret, "kd94hf93k423kf44");
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("OAUTH1_EXPAND_UNSET");
        }
        let host = expand_env("${OAUTH1_EXPAND_UNSET:-0.0.0.0}", "server.host").unwrap();
        assert_eq!(host, "0.0.0.0");
    }

    #[test]
    fn test_unset_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("OAUTH1_EXPAND_MISSING");
        }
        let err = expand_env("${OAUTH1_EXPAND_MISSING}", "clients.app.secret").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "clients.app.secret"));
        assert!(err.to_string().contains("OAUTH1_EXPAND_MISSING"));
    }

    #[test]
    fn test_dollar_in_secret_kept() {
        assert_eq!(expand_env("pa$$word", "clients.app.secret").unwrap(), "pa$$word");
        assert_eq!(expand_env("$HOME", "clients.app.secret").unwrap(), "$HOME");
    }

    #[test]
    fn test_expand_optional() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("OAUTH1_EXPAND_DOMAIN", "auth.example.com");
        }
        let mut url = Some("https://${OAUTH1_EXPAND_DOMAIN}".to_owned());
        expand_optional(&mut url, "server.public_url").unwrap();
        assert_eq!(url.as_deref(), Some("https://auth.example.com"));

        let mut absent = None;
        expand_optional(&mut absent, "server.public_url").unwrap();
        assert_eq!(absent, None);
    }
}
