// Construction-time configuration checks.
//
// Validators never fail themselves: they report a verdict plus a message
// that the caller turns into an error of its own choosing.

use secrecy::ExposeSecret;

use crate::client::ClientConfig;

/// Where every configuration failure points the reader.
pub const DOCS_URL: &str = "https://docs.init.ai";

/// Outcome of a configuration check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid { message: String },
}

impl Validation {
    /// Build a failed verdict. The documentation link is appended here so
    /// every validator reports the same way.
    pub fn invalid(reason: &str) -> Self {
        Self::Invalid {
            message: format!("{reason}\n\n  See: {DOCS_URL}"),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The failure message, `None` when valid.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message } => Some(message),
        }
    }
}

/// Check an API client configuration before a client is built from it.
///
/// `None` stands for "no configuration supplied at all".
pub fn validate_client_config(config: Option<&ClientConfig>) -> Validation {
    let Some(config) = config else {
        return Validation::invalid("A valid configuration object is required.");
    };

    if config.token.expose_secret().is_empty() {
        return Validation::invalid("A valid `token` string is required.");
    }

    Validation::Valid
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_invalid() {
        let verdict = validate_client_config(None);
        assert!(!verdict.is_valid());
        assert!(
            verdict
                .message()
                .is_some_and(|m| m.starts_with("A valid configuration object is required."))
        );
    }

    #[test]
    fn empty_token_is_invalid() {
        let config = ClientConfig::new("");
        let verdict = validate_client_config(Some(&config));
        assert_eq!(
            verdict.message(),
            Some("A valid `token` string is required.\n\n  See: https://docs.init.ai")
        );
    }

    #[test]
    fn non_empty_token_is_valid() {
        let config = ClientConfig::new("abc");
        assert_eq!(validate_client_config(Some(&config)), Validation::Valid);
        assert!(Validation::Valid.message().is_none());
    }
}
