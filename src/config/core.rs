use serde::{Deserialize, Serialize};

use crate::bucketing::{TopNConfig, DEFAULT_OTHER_LABEL};
use crate::errors::Result;
use crate::store::LoadOptions;

/// Root configuration structure, read from `.procsum.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcsumConfig {
    /// Top-N bucketing defaults
    #[serde(default)]
    pub top_n: TopNSettings,

    /// Dataset loading and normalization
    #[serde(default)]
    pub dataset: LoadOptions,

    /// Number and currency rendering
    #[serde(default)]
    pub format: FormatSettings,
}

/// Raw Top-N settings as written in the config file.
///
/// Kept unvalidated so a bad value is reported when it is used, with the
/// same error a programmatic caller would get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopNSettings {
    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<String>,

    #[serde(default = "default_other_label")]
    pub other_label: String,
}

fn default_k() -> usize {
    10
}

fn default_other_label() -> String {
    DEFAULT_OTHER_LABEL.to_string()
}

impl Default for TopNSettings {
    fn default() -> Self {
        Self {
            k: default_k(),
            pinned: None,
            other_label: default_other_label(),
        }
    }
}

impl TopNSettings {
    pub fn to_config(&self) -> Result<TopNConfig> {
        let config = TopNConfig::new(self.k)?.with_other_label(self.other_label.clone())?;
        match &self.pinned {
            Some(pinned) => config.with_pinned(pinned.clone()),
            None => Ok(config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSettings {
    #[serde(default = "default_percent_decimals")]
    pub percent_decimals: usize,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_percent_decimals() -> usize {
    2
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            percent_decimals: default_percent_decimals(),
            currency_symbol: default_currency_symbol(),
        }
    }
}
