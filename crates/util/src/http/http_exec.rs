//! HTTP execution helpers shared by the reports.
//!
//! Every request the CLI makes is a GET against the v3 API. This module
//! centralizes sending those requests through a [`CfClient`], mapping failure
//! statuses to [`HttpError`] and decoding the body into typed models. List
//! endpoints are walked page by page by following `pagination.next.href`.

use std::collections::HashSet;
use std::time::Instant;

use anyhow::Result;
use panzer_api::CfClient;
use panzer_types::ListResponse;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::parser::{HttpError, parse_response_strict, status_error_message, truncate_response_preview};

/// Page size requested from list endpoints when the caller does not set one.
pub const LIST_PAGE_SIZE: u32 = 1000;

const ERROR_PREVIEW_LIMIT: usize = 300;

/// Query parameters as `(key, value)` pairs.
pub type Query<'a> = [(&'a str, String)];

/// GET `path_or_url` and decode the JSON body into `T`.
///
/// `query` is appended to the URL; pass an empty slice when following a
/// pagination link, which already carries its query string.
pub async fn get_json<T: DeserializeOwned>(client: &CfClient, path_or_url: &str, query: &Query<'_>) -> Result<T> {
    let mut builder = client.request(Method::GET, path_or_url)?;
    if !query.is_empty() {
        builder = builder.query(query);
    }

    let started = Instant::now();
    let response = builder.send().await.map_err(|source| HttpError::Transport {
        url: path_or_url.to_string(),
        source,
    })?;
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await.map_err(|source| HttpError::Transport {
        url: url.clone(),
        source,
    })?;
    let duration_ms = started.elapsed().as_millis() as u64;

    if !status.is_success() {
        warn!(%url, status = status.as_u16(), duration_ms, "request failed");
        return Err(HttpError::Status {
            url,
            status: status.as_u16(),
            hint: status_error_message(status.as_u16()),
            body_preview: truncate_response_preview(&text, ERROR_PREVIEW_LIMIT),
        }
        .into());
    }

    debug!(%url, status = status.as_u16(), duration_ms, bytes = text.len(), "request complete");
    let decoded = parse_response_strict::<T>(&text, Some(status)).map_err(|source| HttpError::Decode { url, source })?;
    Ok(decoded)
}

/// Fetch every resource of a list endpoint, following pagination links
/// until the last page.
///
/// A `per_page` entry in `query` is kept, otherwise [`LIST_PAGE_SIZE`] is used.
pub async fn list_all<T: DeserializeOwned>(client: &CfClient, path: &str, query: &Query<'_>) -> Result<Vec<T>> {
    let first_page_query = if query.iter().any(|(key, _)| *key == "per_page") {
        query.to_vec()
    } else {
        with_page_size(query, LIST_PAGE_SIZE)
    };
    let mut page: ListResponse<T> = get_json(client, path, &first_page_query).await?;
    let mut resources = Vec::new();
    let mut visited = HashSet::new();
    let mut pages = 1usize;

    loop {
        let next = page.next_href().map(str::to_string);
        resources.append(&mut page.resources);

        let Some(next) = next else { break };
        if !visited.insert(next.clone()) {
            warn!(path, next = %next, "pagination link repeated, stopping");
            break;
        }
        page = get_json(client, &next, &[]).await?;
        pages += 1;
    }

    debug!(path, pages, count = resources.len(), "listed resources");
    Ok(resources)
}

/// Return `total_results` of a list endpoint, downloading a single item.
pub async fn count_resources<T: DeserializeOwned>(client: &CfClient, path: &str, query: &Query<'_>) -> Result<u64> {
    let page_query = with_page_size(query, 1);
    let page: ListResponse<T> = get_json(client, path, &page_query).await?;
    Ok(page.total_results())
}

/// GET a single resource, `/v3/{collection}/{guid}`.
pub async fn get_resource<T: DeserializeOwned>(client: &CfClient, collection: &str, guid: &str) -> Result<T> {
    get_json(client, &resource_path(collection, guid), &[]).await
}

/// Path of a single resource within a v3 collection.
pub fn resource_path(collection: &str, guid: &str) -> String {
    format!("/v3/{}/{}", collection.trim_matches('/'), guid)
}

/// Copy of `query` with `per_page` set, replacing a caller-provided value.
pub fn with_page_size<'a>(query: &Query<'a>, per_page: u32) -> Vec<(&'a str, String)> {
    let mut merged: Vec<(&str, String)> = query.iter().filter(|(key, _)| *key != "per_page").cloned().collect();
    merged.push(("per_page", per_page.to_string()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_appended() {
        let query = [("names", "web".to_string())];
        let merged = with_page_size(&query, LIST_PAGE_SIZE);
        assert_eq!(merged, vec![("names", "web".to_string()), ("per_page", "1000".to_string())]);
    }

    #[test]
    fn page_size_replaces_existing_value() {
        let query = [("per_page", "50".to_string()), ("order_by", "-created_at".to_string())];
        let merged = with_page_size(&query, 1);
        assert_eq!(merged, vec![("order_by", "-created_at".to_string()), ("per_page", "1".to_string())]);
    }

    #[test]
    fn resource_paths_are_normalized() {
        assert_eq!(resource_path("spaces", "abc"), "/v3/spaces/abc");
        assert_eq!(resource_path("/space_quotas/", "q1"), "/v3/space_quotas/q1");
    }
}
