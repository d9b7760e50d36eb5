//! Shared type definitions for the Panzer CLI.
//!
//! The models in this crate are direct deserializations of the platform's v3
//! REST API. They are read-only snapshots: nothing here is ever sent back to
//! the API. Fields the reports never look at are left out so that schema
//! additions upstream do not break decoding.

pub mod resources;

pub use resources::*;

use serde::{Deserialize, Serialize};

/// A hyperlink object as it appears in `links` and `pagination` blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Cursor-style pagination metadata attached to every collection response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub first: Option<Link>,
    #[serde(default)]
    pub last: Option<Link>,
    /// Absolute URL of the next page, `None` on the last page.
    #[serde(default)]
    pub next: Option<Link>,
    #[serde(default)]
    pub previous: Option<Link>,
}

impl Pagination {
    /// Returns the URL of the following page when there is one.
    pub fn next_href(&self) -> Option<&str> {
        self.next.as_ref().map(|link| link.href.as_str()).filter(|href| !href.is_empty())
    }
}

/// Envelope shared by all list endpoints: a page of `resources` plus pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            pagination: None,
            resources: Vec::new(),
        }
    }
}

impl<T> ListResponse<T> {
    pub fn next_href(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(Pagination::next_href)
    }

    pub fn total_results(&self) -> u64 {
        self.pagination
            .as_ref()
            .map(|pagination| pagination.total_results)
            .unwrap_or(self.resources.len() as u64)
    }
}
