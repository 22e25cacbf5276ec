//! 游戏配置，可由前端以 JSON 传入。

use std::ops::RangeInclusive;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{DEFAULT_MISMATCH_DELAY_MS, DEFAULT_WIN_DELAY_MS};

pub const DEFAULT_BEST_SCORE: u32 = 1000;
pub const DEFAULT_STORAGE_KEY: &str = "topscore";
/// 单局可配置的最大对数；更大的牌桌在浏览器里无法流畅渲染。
pub const MAX_BOARD_PAIRS: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum ConfigError {
    #[error("invalid config json: {message}")]
    Parse { message: String },
    #[error("min_pairs {min} exceeds max_pairs {max}")]
    InvalidPairRange { min: usize, max: usize },
    #[error("min_pairs must be at least 1, an empty board can never be won")]
    EmptyBoard,
    #[error("max_pairs {max} exceeds the board limit of {limit}")]
    TooManyPairs { max: usize, limit: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub min_pairs: usize,
    pub max_pairs: usize,
    pub mismatch_delay_ms: u32,
    pub win_delay_ms: u32,
    pub default_best_score: u32,
    pub storage_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_pairs: 1,
            max_pairs: 15,
            mismatch_delay_ms: DEFAULT_MISMATCH_DELAY_MS,
            win_delay_ms: DEFAULT_WIN_DELAY_MS,
            default_best_score: DEFAULT_BEST_SCORE,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: Option<&str>) -> Result<Self, ConfigError> {
        let config = match json {
            Some(json) if !json.trim().is_empty() => {
                serde_json::from_str(json).map_err(|error| ConfigError::Parse {
                    message: error.to_string(),
                })?
            }
            _ => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_pair_range(mut self, min: usize, max: usize) -> Self {
        self.min_pairs = min;
        self.max_pairs = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_pairs == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if self.min_pairs > self.max_pairs {
            return Err(ConfigError::InvalidPairRange {
                min: self.min_pairs,
                max: self.max_pairs,
            });
        }
        if self.max_pairs > MAX_BOARD_PAIRS {
            return Err(ConfigError::TooManyPairs {
                max: self.max_pairs,
                limit: MAX_BOARD_PAIRS,
            });
        }
        Ok(())
    }

    pub fn pair_range(&self) -> RangeInclusive<usize> {
        self.min_pairs..=self.max_pairs
    }

    /// 无法识别的级别回退到 `Info`。
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
