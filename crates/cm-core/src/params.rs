//! List query parameters for collection endpoints

use serde::{Deserialize, Serialize};

/// Offset/limit paging plus an optional name search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Clamp the limit into `1..=max`
    pub fn clamped(mut self, max: u32) -> Self {
        if let Some(limit) = self.limit {
            self.limit = Some(limit.clamp(1, max));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.limit.is_none() && self.search.is_none()
    }

    /// Key/value pairs for the request query string
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(skip) = self.skip {
            query.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(ref search) = self.search {
            if !search.trim().is_empty() {
                query.push(("search".to_string(), search.trim().to_string()));
            }
        }
        query
    }
}
