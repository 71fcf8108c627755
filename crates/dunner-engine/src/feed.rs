// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice feed implementations.
//!
//! `HttpInvoiceFeed` pulls from the order-of-record REST API with
//! pagination. `StaticInvoiceFeed` is an in-memory double for tests and
//! offline previews.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use dunner_config::FeedConfig;
use dunner_core::error::DunnerError;
use dunner_core::traits::InvoiceFeed;
use dunner_core::types::Invoice;

/// One page of the outstanding-invoices listing.
#[derive(Debug, Deserialize)]
struct InvoicePage {
    invoices: Vec<Invoice>,
    has_more: bool,
}

/// REST client for the external invoice system.
pub struct HttpInvoiceFeed {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    page_size: u32,
}

impl HttpInvoiceFeed {
    /// Build a feed client from config. Errors when no base URL is
    /// configured; callers that can work without a feed should check
    /// `config.base_url` first.
    pub fn from_config(config: &FeedConfig) -> Result<Self, DunnerError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| DunnerError::Config("feed.base_url is not configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DunnerError::Feed {
                message: "failed to build http client".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            page_size: config.page_size,
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl InvoiceFeed for HttpInvoiceFeed {
    async fn outstanding_invoices(&self) -> Result<Vec<Invoice>, DunnerError> {
        let mut invoices = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/invoices/outstanding?page={}&page_size={}",
                self.base_url, page, self.page_size
            );
            let response = self.get(url).send().await.map_err(|e| DunnerError::Feed {
                message: format!("snapshot page {page} request failed"),
                source: Some(Box::new(e)),
            })?;

            if !response.status().is_success() {
                return Err(DunnerError::feed(format!(
                    "snapshot page {page} returned {}",
                    response.status()
                )));
            }

            let body: InvoicePage =
                response.json().await.map_err(|e| DunnerError::Feed {
                    message: format!("snapshot page {page} is malformed"),
                    source: Some(Box::new(e)),
                })?;

            debug!(page, count = body.invoices.len(), "fetched snapshot page");
            invoices.extend(body.invoices);

            if !body.has_more {
                break;
            }
            page += 1;
        }

        Ok(invoices)
    }

    async fn invoice(&self, id: i64) -> Result<Option<Invoice>, DunnerError> {
        let url = format!("{}/invoices/{id}", self.base_url);
        let response = self.get(url).send().await.map_err(|e| DunnerError::Feed {
            message: format!("invoice {id} lookup failed"),
            source: Some(Box::new(e)),
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DunnerError::feed(format!(
                "invoice {id} lookup returned {}",
                response.status()
            )));
        }

        let invoice: Invoice = response.json().await.map_err(|e| DunnerError::Feed {
            message: format!("invoice {id} payload is malformed"),
            source: Some(Box::new(e)),
        })?;
        Ok(Some(invoice))
    }
}

/// In-memory feed for tests and offline previews.
#[derive(Debug, Default)]
pub struct StaticInvoiceFeed {
    invoices: std::sync::Mutex<HashMap<i64, Invoice>>,
}

impl StaticInvoiceFeed {
    pub fn new(invoices: Vec<Invoice>) -> Self {
        Self {
            invoices: std::sync::Mutex::new(
                invoices.into_iter().map(|i| (i.id, i)).collect(),
            ),
        }
    }

    /// Replace or insert one invoice, simulating a payment landing
    /// between snapshot and dispatch.
    pub fn update(&self, invoice: Invoice) {
        self.invoices.lock().unwrap().insert(invoice.id, invoice);
    }

    /// Remove an invoice from the source entirely.
    pub fn remove(&self, id: i64) {
        self.invoices.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl InvoiceFeed for StaticInvoiceFeed {
    async fn outstanding_invoices(&self) -> Result<Vec<Invoice>, DunnerError> {
        let mut invoices: Vec<Invoice> =
            self.invoices.lock().unwrap().values().cloned().collect();
        invoices.sort_by_key(|i| i.id);
        Ok(invoices)
    }

    async fn invoice(&self, id: i64) -> Result<Option<Invoice>, DunnerError> {
        Ok(self.invoices.lock().unwrap().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed_config(server: &MockServer) -> FeedConfig {
        FeedConfig {
            base_url: Some(server.uri()),
            api_token: Some("feed-token".to_string()),
            page_size: 2,
            request_timeout_secs: 5,
        }
    }

    fn invoice_json(id: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "customer_email": format!("c{id}@example.com"),
            "total_amount": 100.0,
            "amount_due": 100.0,
            "days_outstanding": 40,
            "payment_status": "unpaid"
        })
    }

    #[tokio::test]
    async fn snapshot_walks_pages_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invoices/outstanding"))
            .and(query_param("page", "1"))
            .and(header("authorization", "Bearer feed-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "invoices": [invoice_json(1), invoice_json(2)],
                "has_more": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/invoices/outstanding"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "invoices": [invoice_json(3)],
                "has_more": false
            })))
            .mount(&server)
            .await;

        let feed = HttpInvoiceFeed::from_config(&feed_config(&server)).unwrap();
        let invoices = feed.outstanding_invoices().await.unwrap();
        assert_eq!(
            invoices.iter().map(|i| i.id).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[tokio::test]
    async fn server_error_aborts_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invoices/outstanding"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let feed = HttpInvoiceFeed::from_config(&feed_config(&server)).unwrap();
        let err = feed.outstanding_invoices().await.unwrap_err();
        assert!(matches!(err, DunnerError::Feed { .. }));
    }

    #[tokio::test]
    async fn missing_invoice_maps_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invoices/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoice_json(42)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/invoices/43"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let feed = HttpInvoiceFeed::from_config(&feed_config(&server)).unwrap();
        assert_eq!(feed.invoice(42).await.unwrap().unwrap().id, 42);
        assert!(feed.invoice(43).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_feed_reflects_updates() {
        let feed = StaticInvoiceFeed::new(vec![]);
        assert!(feed.invoice(1).await.unwrap().is_none());

        let invoice: Invoice = serde_json::from_value(invoice_json(1)).unwrap();
        feed.update(invoice);
        assert!(feed.invoice(1).await.unwrap().is_some());

        feed.remove(1);
        assert!(feed.outstanding_invoices().await.unwrap().is_empty());
    }
}
