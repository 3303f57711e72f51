//! Cloud Firestore backend over the v1 REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};

use super::record::{sort_records, PhotoRecord, RecordUpdate};
use super::CollectionStore;
use crate::error::{Error, Result};

/// Environment variable holding the OAuth bearer token.
pub const FIRESTORE_TOKEN_ENV: &str = "PYXPIC_FIRESTORE_TOKEN";

/// Default REST root.
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "pyxpic";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Documents requested per listing page.
const PAGE_SIZE: u32 = 300;

/// Records stored as documents of one Firestore collection.
pub struct FirestoreStore {
    base_url: String,
    project_id: String,
    collection: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl FirestoreStore {
    /// Create a store reading the bearer token from `PYXPIC_FIRESTORE_TOKEN`.
    ///
    /// A missing token is allowed (the local emulator accepts anonymous
    /// requests); a real project will answer with 401/403, surfaced as
    /// `StoreUnavailable`.
    pub fn new(project_id: String, collection: String) -> Result<Self> {
        let token = std::env::var(FIRESTORE_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::with_base_url(FIRESTORE_BASE_URL.to_string(), project_id, collection, token)
    }

    /// Create a store against a custom REST root.
    ///
    /// Useful for the emulator and for testing against a mock server.
    pub fn with_base_url(
        base_url: String,
        project_id: String,
        collection: String,
        token: Option<String>,
    ) -> Result<Self> {
        if project_id.is_empty() {
            return Err(Error::unavailable("Firestore project id is not configured"));
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            collection,
            token,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// `…/projects/{p}/databases/(default)/documents`
    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.documents_root(), self.collection)
    }

    /// URL of the document for `id`, or `None` if `id` would not name a
    /// document of this collection once the URL is parsed.
    fn document_url(&self, id: &str) -> Option<String> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\', '?', '#', '%']);
        valid.then(|| format!("{}/{}", self.collection_url(), id))
    }

    fn invalid_id(id: &str) -> Error {
        Error::Codec {
            id: id.to_string(),
            message: "identifier is not a valid document name".to_string(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Fail with `StoreUnavailable` unless the response is a success.
    async fn expect_success(response: Response, action: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::error!("Firestore {} failed ({}): {}", action, status, body);
        Err(Error::unavailable(format!(
            "Firestore {} failed ({}): {}",
            action, status, body
        )))
    }

    async fn json(response: Response) -> Result<Value> {
        response
            .json::<Value>()
            .await
            .map_err(|e| Error::unavailable(format!("invalid Firestore response: {}", e)))
    }

    async fn run_query(&self, structured_query: Value) -> Result<Vec<PhotoRecord>> {
        let url = format!("{}:runQuery", self.documents_root());
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "structuredQuery": structured_query }))
            .send()
            .await?;
        let body = Self::json(Self::expect_success(response, "query").await?).await?;

        let mut records = Vec::new();
        for entry in body.as_array().into_iter().flatten() {
            // Entries without a document only carry progress information
            if let Some(document) = entry.get("document") {
                records.push(decode_document(document)?);
            }
        }
        sort_records(&mut records);
        Ok(records)
    }
}

#[async_trait]
impl CollectionStore for FirestoreStore {
    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>> {
        let Some(url) = self.document_url(id) else {
            return Ok(None);
        };
        let response = self
            .request(Method::GET, &url)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = Self::json(Self::expect_success(response, "get").await?).await?;
        decode_document(&document).map(Some)
    }

    async fn create(&self, record: &PhotoRecord) -> Result<()> {
        if self.document_url(&record.id).is_none() {
            return Err(Self::invalid_id(&record.id));
        }
        let response = self
            .request(Method::POST, &self.collection_url())
            .query(&[("documentId", record.id.as_str())])
            .json(&encode_document(record))
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(Error::AlreadyExists {
                id: record.id.clone(),
            });
        }
        Self::expect_success(response, "create").await?;
        Ok(())
    }

    async fn set(&self, record: &PhotoRecord) -> Result<()> {
        let url = self
            .document_url(&record.id)
            .ok_or_else(|| Self::invalid_id(&record.id))?;
        let response = self
            .request(Method::PATCH, &url)
            .json(&encode_document(record))
            .send()
            .await?;
        Self::expect_success(response, "set").await?;
        Ok(())
    }

    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<()> {
        let url = self.document_url(id).ok_or_else(|| Error::not_found(id))?;
        if update.is_empty() {
            // Nothing to write, but the target must still exist
            return match self.get(id).await? {
                Some(_) => Ok(()),
                None => Err(Error::not_found(id)),
            };
        }

        let mut params: Vec<(&str, &str)> = update
            .field_paths()
            .into_iter()
            .map(|path| ("updateMask.fieldPaths", path))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let mut fields = Map::new();
        if let Some(owner_id) = &update.owner_id {
            fields.insert("owner_id".to_string(), string_value(owner_id));
        }
        if let Some(raw_image) = &update.raw_image {
            fields.insert("raw_image".to_string(), encode_rows(raw_image));
        }

        let response = self
            .request(Method::PATCH, &url)
            .query(&params)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(id));
        }
        Self::expect_success(response, "update").await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.document_url(id).ok_or_else(|| Error::not_found(id))?;
        let response = self
            .request(Method::DELETE, &url)
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(id));
        }
        Self::expect_success(response, "delete").await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let url = format!("{}:runAggregationQuery", self.documents_root());
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": { "from": [{ "collectionId": self.collection }] },
                "aggregations": [{ "alias": "total", "count": {} }],
            }
        });
        let response = self.request(Method::POST, &url).json(&body).send().await?;
        let result = Self::json(Self::expect_success(response, "count").await?).await?;

        result
            .as_array()
            .into_iter()
            .flatten()
            .find_map(|entry| entry.pointer("/result/aggregateFields/total/integerValue"))
            .and_then(integer_of)
            .ok_or_else(|| Error::unavailable("Firestore count response has no total"))
    }

    async fn list_all(&self) -> Result<Vec<PhotoRecord>> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        let page_size = PAGE_SIZE.to_string();

        loop {
            let mut params = vec![("pageSize", page_size.as_str())];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.as_str()));
            }

            let response = self
                .request(Method::GET, &self.collection_url())
                .query(&params)
                .send()
                .await?;
            let page = Self::json(Self::expect_success(response, "list").await?).await?;

            for document in page["documents"].as_array().into_iter().flatten() {
                records.push(decode_document(document)?);
            }

            match page["nextPageToken"].as_str() {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        sort_records(&mut records);
        Ok(records)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<PhotoRecord>> {
        self.run_query(json!({
            "from": [{ "collectionId": self.collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "owner_id" },
                    "op": "EQUAL",
                    "value": string_value(owner_id),
                }
            }
        }))
        .await
    }
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

/// Rows as a map keyed by row index; Firestore forbids arrays of arrays.
fn encode_rows(rows: &[Vec<String>]) -> Value {
    let fields: Map<String, Value> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let values: Vec<Value> = row.iter().map(|t| string_value(t)).collect();
            (i.to_string(), json!({ "arrayValue": { "values": values } }))
        })
        .collect();
    json!({ "mapValue": { "fields": fields } })
}

/// Request body for a whole record.
pub(crate) fn encode_document(record: &PhotoRecord) -> Value {
    json!({
        "fields": {
            "owner_id": string_value(&record.owner_id),
            "raw_image": encode_rows(&record.raw_image),
            "order_number": { "integerValue": record.order_number.to_string() },
            "date": { "timestampValue": record.created_at.to_rfc3339() },
        }
    })
}

/// Firestore encodes 64-bit integers as strings; accept plain numbers too.
fn integer_of(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Parse a Firestore document into a record.
pub(crate) fn decode_document(document: &Value) -> Result<PhotoRecord> {
    let name = document["name"].as_str().unwrap_or_default();
    let id = name.rsplit('/').next().unwrap_or_default().to_string();
    let codec = |message: &str| Error::Codec {
        id: id.clone(),
        message: message.to_string(),
    };

    let fields = &document["fields"];

    let owner_id = fields["owner_id"]["stringValue"]
        .as_str()
        .ok_or_else(|| codec("missing owner_id"))?
        .to_string();

    let order_number = integer_of(&fields["order_number"]["integerValue"])
        .ok_or_else(|| codec("missing order_number"))?;

    let created_at = fields["date"]["timestampValue"]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .ok_or_else(|| codec("missing or malformed date"))?;

    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    if let Some(map) = fields["raw_image"]["mapValue"]["fields"].as_object() {
        for (key, row) in map {
            let index: usize = key
                .parse()
                .map_err(|_| codec("raw_image row key is not an index"))?;
            // Empty arrays come back without a "values" member
            let cells = row["arrayValue"]["values"]
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .map(|v| v["stringValue"].as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                })
                .unwrap_or(Some(Vec::new()))
                .ok_or_else(|| codec("raw_image cell is not a string"))?;
            rows.push((index, cells));
        }
    }
    rows.sort_by_key(|(i, _)| *i);

    Ok(PhotoRecord {
        id,
        owner_id,
        raw_image: rows.into_iter().map(|(_, row)| row).collect(),
        order_number,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> PhotoRecord {
        PhotoRecord {
            id: "doc-1".to_string(),
            owner_id: "abc".to_string(),
            raw_image: vec![vec!["@".to_string(), " ".to_string()], vec![]],
            order_number: 7,
            created_at: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_with_base_url_requires_project() {
        let result = FirestoreStore::with_base_url(
            "http://localhost".to_string(),
            String::new(),
            DEFAULT_COLLECTION.to_string(),
            None,
        );
        assert!(matches!(result, Err(Error::StoreUnavailable { .. })));
    }

    #[test]
    fn test_urls() {
        let store = FirestoreStore::with_base_url(
            "http://localhost:8080/v1/".to_string(),
            "demo".to_string(),
            "pyxpic".to_string(),
            None,
        )
        .unwrap();
        assert_eq!(store.base_url(), "http://localhost:8080/v1");
        assert_eq!(
            store.document_url("x").as_deref(),
            Some("http://localhost:8080/v1/projects/demo/databases/(default)/documents/pyxpic/x")
        );
        for id in ["", ".", "..", "../users/alice", "a/b", "a?b", "a#b", "a%2Fb"] {
            assert!(store.document_url(id).is_none(), "{:?} accepted", id);
        }
    }

    #[test]
    fn test_encode_document_layout() {
        let doc = encode_document(&sample_record());
        assert_eq!(doc["fields"]["owner_id"]["stringValue"], "abc");
        assert_eq!(doc["fields"]["order_number"]["integerValue"], "7");
        assert_eq!(
            doc["fields"]["raw_image"]["mapValue"]["fields"]["0"]["arrayValue"]["values"][0]
                ["stringValue"],
            "@"
        );
        assert!(doc["fields"]["date"]["timestampValue"]
            .as_str()
            .unwrap()
            .starts_with("2023-05-01T12:00:00"));
    }

    #[test]
    fn test_decode_document_handles_empty_rows_and_name() {
        let mut doc = encode_document(&sample_record());
        doc["name"] = json!("projects/demo/databases/(default)/documents/pyxpic/doc-1");
        // Firestore drops "values" for empty arrays
        doc["fields"]["raw_image"]["mapValue"]["fields"]["1"] = json!({ "arrayValue": {} });

        let record = decode_document(&doc).unwrap();
        assert_eq!(record, sample_record());
    }

    #[test]
    fn test_decode_document_missing_owner() {
        let doc = json!({ "name": "a/b/c", "fields": {} });
        assert!(matches!(
            decode_document(&doc),
            Err(Error::Codec { .. })
        ));
    }
}
