//! Typed endpoints of the archive backend

pub mod auth;
pub mod document;
pub mod employee;

use serde::{Deserialize, Serialize};

/// Envelope wrapping most backend responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    /// Take the payload, treating a missing one as an invalid response
    pub fn into_data(self) -> crate::Result<T> {
        self.data.ok_or_else(|| {
            crate::ClientError::InvalidResponse(format!("response has no data: {}", self.message))
        })
    }
}

/// Pagination metadata of list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Push `key=value` when the value is set and not blank
pub(crate) fn push_param(
    params: &mut Vec<(String, String)>,
    key: &str,
    value: Option<impl ToString>,
) {
    if let Some(value) = value.map(|v| v.to_string()).filter(|v| !v.trim().is_empty()) {
        params.push((key.to_string(), value));
    }
}
