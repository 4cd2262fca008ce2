use serde::{Deserialize, Serialize};

/// Which Init.ai deployment a client talks to.
///
/// Determines the default REST base URL and the realtime app key. Either
/// value can still be overridden individually.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApiProfile {
    /// Staging environment -- `s-api.init.ai`.
    #[default]
    Staging,
    /// Production environment -- `api.init.ai`.
    Production,
}

impl ApiProfile {
    /// The REST API root for this deployment (no trailing slash).
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Staging => "https://s-api.init.ai",
            Self::Production => "https://api.init.ai",
        }
    }

    /// The app key of the realtime push service for this deployment.
    pub fn pusher_app_key(self) -> &'static str {
        match self {
            Self::Staging => "ce5c19b1b1625e9abace",
            Self::Production => "2364df9cc5d7b637fb5d",
        }
    }
}
