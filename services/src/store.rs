//! # Document Store
//!
//! Managed collection-oriented database holding the `Users` and
//! `Formularios` collections.
//!
//! ## Surface used
//!
//! - Collection scan, optionally ordered by one field descending. No
//!   pagination: every caller here wants the whole collection.
//! - Single-document get by id.
//! - Insert with a store-assigned id.
//! - Merge (upsert): provided fields overwrite, everything else is kept.
//! - Delete by id.
//!
//! Documents are plain JSON objects, so schema-flexible records like form
//! submissions come through without a fixed struct.

use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store error {status}: {message}")]
    Service { status: u16, message: String },
}

/// One stored document: the store-assigned id plus the field map.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct StoreClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl StoreClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Full collection read, one bulk request.
    pub async fn scan(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let request = self.http.get(self.documents_url(collection));

        let scanned: ScanResponse = self.send(request).await?;

        #[cfg(feature = "verbose")]
        println!("Scanned {}: {} documents", collection, scanned.documents.len());

        Ok(scanned.documents)
    }

    /// Full collection read ordered by `field`, newest first.
    pub async fn scan_desc(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let request = self
            .http
            .get(self.documents_url(collection))
            .query(&[("order_by", field), ("direction", "desc")]);

        let scanned: ScanResponse = self.send(request).await?;

        Ok(scanned.documents)
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let request = self
            .http
            .get(format!("{}/{id}", self.documents_url(collection)));

        self.send(request).await
    }

    /// Inserts a new document and returns the store-assigned id.
    pub async fn insert(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<String, StoreError> {
        let request = self
            .http
            .post(self.documents_url(collection))
            .json(&serde_json::json!({ "fields": fields }));

        let inserted: InsertResponse = self.send(request).await?;

        Ok(inserted.id)
    }

    /// Upsert: writes the given fields under `id`, keeping any others.
    pub async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let request = self
            .http
            .patch(format!("{}/{id}", self.documents_url(collection)))
            .json(&serde_json::json!({ "fields": fields }));

        self.send_unit(request).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .delete(format!("{}/{id}", self.documents_url(collection)));

        self.send_unit(request).await
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/v1/collections/{collection}/documents", self.base_url)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }

        Err(Self::rejection(response).await)
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<(), StoreError> {
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::rejection(response).await)
    }

    async fn rejection(response: reqwest::Response) -> StoreError {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return StoreError::NotFound;
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();

        StoreError::Service {
            status: status.as_u16(),
            message: body.message,
        }
    }
}
