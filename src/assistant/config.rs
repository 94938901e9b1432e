use super::composer::ComposerConfig;
use super::ranker::RankerConfig;
use super::strategy::StrategyKind;
use serde::{Deserialize, Serialize};

/// `[assistant]` configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Most recent conversation messages kept per request
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default)]
    pub ranker: RankerConfig,

    #[serde(default)]
    pub composer: ComposerConfig,
}

fn default_history_window() -> usize {
    8
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            history_window: default_history_window(),
            ranker: RankerConfig::default(),
            composer: ComposerConfig::default(),
        }
    }
}
