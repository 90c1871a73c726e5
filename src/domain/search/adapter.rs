// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::video::VideoResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Upstream returned status {0}")]
    Upstream(u16),
    #[error("Timeout after {0} ms")]
    Timeout(u64),
    #[error("Adapter unavailable")]
    Unavailable,
    #[error("Adapter panicked: {0}")]
    Panicked(String),
}

/// Optional capabilities an adapter may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterFeature {
    Pagination,
    Sorting,
    Filtering,
    ThumbnailPreview,
}

impl AdapterFeature {
    pub const ALL: [AdapterFeature; 4] = [
        AdapterFeature::Pagination,
        AdapterFeature::Sorting,
        AdapterFeature::Filtering,
        AdapterFeature::ThumbnailPreview,
    ];
}

/// Contract every content source implements.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Stable machine name, used for bangs, cache keys and breaker lookup
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// 1 (major) .. 5 (new/minor)
    fn tier(&self) -> u8;

    fn is_available(&self) -> bool {
        true
    }

    /// Perform a search for one page of results
    async fn search(&self, query: &str, page: u32) -> Result<Vec<VideoResult>, AdapterError>;

    fn supports_feature(&self, _feature: AdapterFeature) -> bool {
        false
    }
}
