// Configuration: where the API lives, which credential to send, and the
// assistant defaults used when a caller does not override them.
//
// Everything here is an immutable value handed to `ApiClient::new`; there
// is no global default state.

use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.moltphone.xyz";
pub const API_KEY_VAR: &str = "MOLTPHONE_API_KEY";
pub const BASE_URL_VAR: &str = "MOLTPHONE_API_BASE";

/// Connection settings for the MoltPhone API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Timeout for call placement requests.
    pub call_timeout: Duration,
    /// Timeout for reads and the health check.
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            call_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Build a config from `MOLTPHONE_API_KEY` and `MOLTPHONE_API_BASE`.
    /// An empty key is treated the same as a missing one.
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_VAR).ok();
        let base_url = std::env::var(BASE_URL_VAR).ok();
        Self::default().with_api_key(api_key).with_base_url(base_url)
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Replace the base URL when one is given; trailing slashes are dropped.
    pub fn with_base_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}

/// Assistant configuration sent with an authenticated call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantConfig {
    pub system_prompt: String,
    pub first_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Partial assistant configuration. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantOverrides {
    pub system_prompt: Option<String>,
    pub first_message: Option<String>,
    pub error_message: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
}

impl AssistantConfig {
    /// Field-by-field merge: every present override replaces its default.
    pub fn merged(&self, overrides: &AssistantOverrides) -> AssistantConfig {
        AssistantConfig {
            system_prompt: overrides
                .system_prompt
                .clone()
                .unwrap_or_else(|| self.system_prompt.clone()),
            first_message: overrides
                .first_message
                .clone()
                .unwrap_or_else(|| self.first_message.clone()),
            error_message: overrides
                .error_message
                .clone()
                .or_else(|| self.error_message.clone()),
            model: overrides.model.clone().unwrap_or_else(|| self.model.clone()),
            voice: overrides.voice.clone().or_else(|| self.voice.clone()),
        }
    }
}

/// Defaults for both call modes.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDefaults {
    pub assistant: AssistantConfig,
    /// Task sent in webapp mode when the caller gives none.
    pub task: String,
    pub agent_name: String,
}

impl Default for CallDefaults {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig {
                system_prompt: concat!(
                    "You are a personal assistant, calling a taxi company in Gibraltar.\n",
                    "Your goal and task is to order the taxi from Nimbus house, Tradewinds ",
                    "to the airport. 2 adults and 1 child.",
                    "Do not present yourself as AI, you are Dave Smith.\n",
                    "Once the booking is confirmed and you have all the details, ",
                    "say goodbye politely and end your final message with [END_CALL]"
                )
                .to_string(),
                first_message: "Hi, I would like to order a taxi from Nimbus house, \
                                Tradewinds to the airport. 2 adults and 1 child."
                    .to_string(),
                error_message: Some("Sorry, I didn't catch that. Could you repeat?".to_string()),
                model: "gpt-5.1".to_string(),
                voice: Some("alice".to_string()),
            },
            task: "Introduce yourself politely, find out how the person is doing, \
                   and end the call courteously."
                .to_string(),
            agent_name: "MoltPhone CLI".to_string(),
        }
    }
}
