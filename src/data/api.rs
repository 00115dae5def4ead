//! Kaisen API client
//!
//! Bearer-token login and resilient paginated fetching. A failed login is
//! fatal; a failed page or detail lookup is logged and skipped so a partial
//! dataset is still assembled.

use crate::{KaisenError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Blocking client for the Kaisen service
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("kaisen-analytics/0.1")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Exchange credentials for a bearer token. Any failure here is fatal to
    /// an acquisition run.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(KaisenError::Auth(
                "invalid credentials (401) - check username and password".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(KaisenError::Auth(format!(
                "login returned {}: {}",
                status, body
            )));
        }

        let body: LoginResponse = response.json()?;
        match body.access_token {
            Some(token) => {
                log::info!("Authenticated against {}", self.base_url);
                self.token = Some(token);
                Ok(())
            }
            None => Err(KaisenError::Auth(
                "login response carried no access_token".to_string(),
            )),
        }
    }

    /// Single GET returning parsed JSON. Transport errors, non-success
    /// statuses and malformed bodies are logged and mapped to None.
    fn get_json(&self, url: &str) -> Option<Json> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        match request.send() {
            Ok(resp) if resp.status().is_success() => match resp.json::<Json>() {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Malformed JSON from {}: {}", url, e);
                    None
                }
            },
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => {
                log::warn!("Resource not found at {}", url);
                None
            }
            Ok(resp) => {
                log::warn!("{} returned {}", url, resp.status());
                None
            }
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }

    /// Fetch every item of a paginated resource. Never errors: a malformed
    /// first page yields an empty list, later bad pages are skipped.
    pub fn fetch_paginated(&self, path: &str, data_key: &str) -> Vec<Json> {
        let pages = ResourcePages {
            client: self,
            url: format!("{}{}", self.base_url, path),
        };
        fetch_all_pages(&pages, data_key)
    }

    /// Fetch a single (non-paginated) detail record.
    pub fn fetch_detail(&self, path: &str) -> Option<Json> {
        self.get_json(&format!("{}{}", self.base_url, path))
    }
}

/// One page of a paged resource. Seam between the pagination algorithm and
/// the transport.
pub trait PageSource {
    /// Fetch the given page (1-based), or None on any failure.
    fn fetch_page(&self, page: u32) -> Option<Json>;
}

struct ResourcePages<'a> {
    client: &'a ApiClient,
    url: String,
}

impl PageSource for ResourcePages<'_> {
    fn fetch_page(&self, page: u32) -> Option<Json> {
        if page == 1 {
            self.client.get_json(&self.url)
        } else {
            self.client.get_json(&format!("{}?page={}", self.url, page))
        }
    }
}

/// Accumulate all items of a paged resource in arrival order.
///
/// Page 1 supplies the pagination metadata; `ceil(total / per_page)` gives the
/// page count. Missing or zero metadata degrades to whatever page 1 returned,
/// and a page that fails mid-run is skipped rather than aborting the fetch.
pub fn fetch_all_pages<S: PageSource>(source: &S, data_key: &str) -> Vec<Json> {
    let first = match source.fetch_page(1) {
        Some(envelope) => envelope,
        None => {
            log::error!("First page fetch failed; no '{}' items available", data_key);
            return Vec::new();
        }
    };

    let mut items: Vec<Json> = match first.get(data_key).and_then(Json::as_array) {
        Some(list) => list.clone(),
        None => {
            log::error!(
                "Envelope is missing the expected '{}' key; returning no items",
                data_key
            );
            return Vec::new();
        }
    };

    let total = first.get("total").and_then(Json::as_u64).unwrap_or(0);
    let per_page = first.get("per_page").and_then(Json::as_u64).unwrap_or(0);
    if total == 0 || per_page == 0 {
        log::warn!(
            "Pagination metadata missing for '{}'; assuming a single page",
            data_key
        );
        return items;
    }

    let page_count = total.div_ceil(per_page);
    log::info!(
        "{} '{}' items across {} pages",
        total,
        data_key,
        page_count
    );

    for page in 2..=page_count {
        let page = page as u32;
        let page_items = source
            .fetch_page(page)
            .and_then(|envelope| envelope.get(data_key).and_then(Json::as_array).cloned());
        match page_items {
            Some(list) => items.extend(list),
            None => log::warn!("Skipping page {} of '{}'", page, data_key),
        }
    }

    log::info!("Fetched {} '{}' items in total", items.len(), data_key);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// In-memory paged resource that records which pages were requested.
    struct FakeSource {
        pages: Vec<Option<Json>>,
        requested: RefCell<Vec<u32>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Option<Json>>) -> Self {
            FakeSource {
                pages,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for FakeSource {
        fn fetch_page(&self, page: u32) -> Option<Json> {
            self.requested.borrow_mut().push(page);
            self.pages.get(page as usize - 1).cloned().flatten()
        }
    }

    fn envelope(items: &[i64], total: u64, per_page: u64) -> Json {
        json!({"pokemons": items, "total": total, "per_page": per_page})
    }

    #[test]
    fn test_all_pages_accumulated_in_order() {
        let source = FakeSource::new(vec![
            Some(envelope(&[1, 2], 5, 2)),
            Some(envelope(&[3, 4], 5, 2)),
            Some(envelope(&[5], 5, 2)),
        ]);

        let items = fetch_all_pages(&source, "pokemons");
        let ids: Vec<i64> = items.iter().map(|v| v.as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(*source.requested.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_metadata_degrades_to_single_page() {
        let source = FakeSource::new(vec![
            Some(json!({"pokemons": [1, 2, 3]})),
            Some(envelope(&[4], 4, 1)),
        ]);

        let items = fetch_all_pages(&source, "pokemons");
        assert_eq!(items.len(), 3);
        // page 2 must never be requested
        assert_eq!(*source.requested.borrow(), vec![1]);
    }

    #[test]
    fn test_zero_per_page_degrades_to_single_page() {
        let source = FakeSource::new(vec![Some(json!({
            "pokemons": [1],
            "total": 10,
            "per_page": 0
        }))]);

        let items = fetch_all_pages(&source, "pokemons");
        assert_eq!(items.len(), 1);
        assert_eq!(*source.requested.borrow(), vec![1]);
    }

    #[test]
    fn test_failing_page_is_skipped() {
        let source = FakeSource::new(vec![
            Some(envelope(&[1, 2], 6, 2)),
            None, // simulated 500
            Some(envelope(&[5, 6], 6, 2)),
        ]);

        let items = fetch_all_pages(&source, "pokemons");
        let ids: Vec<i64> = items.iter().map(|v| v.as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 5, 6]);
        assert_eq!(*source.requested.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_malformed_first_page_yields_empty() {
        let source = FakeSource::new(vec![Some(json!({"combats": [1]}))]);
        assert!(fetch_all_pages(&source, "pokemons").is_empty());
    }

    #[test]
    fn test_unreachable_first_page_yields_empty() {
        let source = FakeSource::new(vec![None]);
        assert!(fetch_all_pages(&source, "pokemons").is_empty());
    }
}
