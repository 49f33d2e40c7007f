use config::{Config, Environment};
use serde::Deserialize;

use crate::Error;

const ENVIRONMENT_PREFIX: &str = "USERS";

#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
pub struct Settings {
    pub broker: BrokerSettings,
}

/// The topics on which user notifications are published.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct BrokerSettings {
    pub user_create_topic: String,
    pub user_update_topic: String,
    pub user_delete_topic: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            user_create_topic: "user-create".into(),
            user_update_topic: "user-update".into(),
            user_delete_topic: "user-delete".into(),
        }
    }
}

impl Settings {
    /// Loads the settings from the environment, e.g. `USERS__BROKER__USER_CREATE_TOPIC`. Missing
    /// values fall back to the defaults.
    pub fn load() -> Result<Self, Error> {
        Self::from_environment(Environment::with_prefix(ENVIRONMENT_PREFIX).separator("__"))
    }

    fn from_environment(environment: Environment) -> Result<Self, Error> {
        let defaults = BrokerSettings::default();
        Ok(Config::builder()
            .set_default("broker.user_create_topic", defaults.user_create_topic)?
            .set_default("broker.user_update_topic", defaults.user_update_topic)?
            .set_default("broker.user_delete_topic", defaults.user_delete_topic)?
            .add_source(environment)
            .build()?
            .try_deserialize()?)
    }

    /// All the configured topics.
    pub fn topics(&self) -> [&str; 3] {
        [
            &self.broker.user_create_topic,
            &self.broker.user_update_topic,
            &self.broker.user_delete_topic,
        ]
    }
}
