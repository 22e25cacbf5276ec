//! 最佳成绩的持久化。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_STORAGE_KEY;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum StoreError {
    #[error("best score storage is unavailable")]
    Unavailable,
    #[error("stored best score {raw:?} is not a number")]
    Malformed { raw: String },
    #[error("failed to write best score: {reason}")]
    Write { reason: String },
}

/// 进程外持久的最佳成绩存储。
pub trait BestScoreStore {
    /// 尚未保存时返回 `Ok(None)`。
    fn load(&self) -> Result<Option<u32>, StoreError>;
    fn save(&mut self, score: u32) -> Result<(), StoreError>;
}

pub fn parse_best_score(raw: &str) -> Result<u32, StoreError> {
    raw.trim().parse().map_err(|_| StoreError::Malformed {
        raw: raw.to_string(),
    })
}

/// 内存存储，保存原始字符串以模拟浏览器存储。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    raw: Option<String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u32) -> Self {
        Self::with_raw(score.to_string())
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            writes: 0,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl BestScoreStore for MemoryStore {
    fn load(&self) -> Result<Option<u32>, StoreError> {
        self.raw.as_deref().map(parse_best_score).transpose()
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.raw = Some(score.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// 基于 `window.localStorage` 的存储。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStorageStore {
    key: String,
}

impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or(StoreError::Unavailable)?
            .local_storage()
            .map_err(|_| StoreError::Unavailable)?
            .ok_or(StoreError::Unavailable)
    }
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_KEY)
    }
}

impl BestScoreStore for LocalStorageStore {
    fn load(&self) -> Result<Option<u32>, StoreError> {
        let raw = Self::storage()?
            .get_item(&self.key)
            .map_err(|_| StoreError::Unavailable)?;
        raw.as_deref().map(parse_best_score).transpose()
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(&self.key, &score.to_string())
            .map_err(|error| StoreError::Write {
                reason: error
                    .as_string()
                    .unwrap_or_else(|| "localStorage rejected the value".to_string()),
            })
    }
}
