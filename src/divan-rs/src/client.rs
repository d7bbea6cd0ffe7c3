use std::fmt;
use std::sync::Arc;

use divan_core::url::{self, document_url};
use divan_core::{
    AllDocsResponse, AllDocsRow, Config, CreateResponse, DatabaseInfo, JsonMap, UpdateResponse,
    ViewResponse, ID_FIELD, REV_FIELD,
};
use serde::Serialize;
use serde_json::Value;

use crate::document::{Document, DocumentRef};
use crate::transport::{default_transport, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::view::{ReturnMode, ViewResult};
use crate::{ClientError, Result};

/// Handle bound to one database.
///
/// Holds only the validated base URL and a shared transport; cloning is cheap
/// and every operation is a single request/response round trip.
#[derive(Clone)]
pub struct Connector {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Error for any status the caller did not anticipate
pub(crate) fn unexpected(response: &HttpResponse) -> ClientError {
    tracing::warn!(
        status = response.status,
        message = %response.message,
        "Unexpected response from server"
    );
    ClientError::UnexpectedResponse {
        status: response.status,
        message: response.message.clone(),
    }
}

impl Connector {
    /// Connect to database `name` on `host:port` (port `0` selects the default)
    pub fn new(name: &str, host: &str, port: i64) -> Result<Self> {
        Self::with_transport(name, host, port, default_transport())
    }

    /// Connect to database `name` on the local server
    pub fn local(name: &str) -> Result<Self> {
        Self::new(name, url::DEFAULT_HOST, 0)
    }

    pub fn with_transport(
        name: &str,
        host: &str,
        port: i64,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let base_url = url::make_database_url(name, host, port)?;
        Ok(Self::from_url(base_url, transport))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::from_config(config)?);
        let base_url = config.database_url()?;
        Ok(Self::from_url(base_url, transport))
    }

    /// `base_url` must come from `make_database_url`
    pub(crate) fn from_url(base_url: String, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    /// Base URL of this database, always ending with `/`
    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// URL of document `id`; an empty id would address the database itself
    fn doc_url(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(ClientError::InvalidArgument(
                "document id must not be empty".to_string(),
            ));
        }
        Ok(document_url(&self.base_url, id))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");
        let response = self.transport.send(request).await?;
        tracing::debug!(status = response.status, "Received response");
        Ok(response)
    }

    /// Get info about this database
    #[tracing::instrument(skip(self), fields(db = %self.base_url))]
    pub async fn get_info(&self) -> Result<DatabaseInfo> {
        let response = self.send(HttpRequest::get(&self.base_url)).await?;

        if !response.is_success() {
            return Err(match response.status {
                404 => ClientError::NotFound(format!("Database {}", self.base_url)),
                _ => unexpected(&response),
            });
        }

        response.json()
    }

    /// List the documents of this database in key order
    #[tracing::instrument(skip(self), fields(db = %self.base_url))]
    pub async fn get_all_documents(
        &self,
        start_key: Option<&str>,
        limit: Option<u64>,
        descending: bool,
    ) -> Result<Vec<AllDocsRow>> {
        let mut request = HttpRequest::get(format!("{}_all_docs", self.base_url));

        if let Some(key) = start_key {
            request.add_query_param("startkey", key);
        }
        if let Some(limit) = limit {
            request.add_query_param("limit", limit.to_string());
        }
        if descending {
            request.add_query_param("descending", "true");
        }

        let response = self.send(request).await?;

        if !response.is_success() {
            return Err(match response.status {
                404 => ClientError::NotFound(format!("Database {}", self.base_url)),
                _ => unexpected(&response),
            });
        }

        let all: AllDocsResponse = response.json()?;
        Ok(all.rows)
    }

    /// Retrieve a document.
    ///
    /// Returns `Ok(None)` when the server has no such document.
    #[tracing::instrument(skip(self), fields(db = %self.base_url))]
    pub async fn retrieve<D: Document>(
        &self,
        id: &str,
        revision: Option<&str>,
        full: bool,
    ) -> Result<Option<D>> {
        let url = self.doc_url(id)?;
        let mut request = HttpRequest::get(url.clone());

        if let Some(rev) = revision {
            request.add_query_param("rev", rev);
        }
        if full {
            request.add_query_param("full", "true");
        }

        let response = self.send(request).await?;

        match response.status {
            200 => {
                let content: JsonMap = response.json()?;
                D::from_parts(content, url, self).map(Some)
            }
            404 => Ok(None),
            _ => Err(unexpected(&response)),
        }
    }

    /// Shorthand for `retrieve::<DocumentRef>(id, None, false)`
    pub async fn get(&self, id: &str) -> Result<Option<DocumentRef>> {
        self.retrieve(id, None, false).await
    }

    /// Create a document. Without `id` the server assigns one.
    #[tracing::instrument(skip(self, content), fields(db = %self.base_url))]
    pub async fn create<T: Serialize + ?Sized>(
        &self,
        content: &T,
        id: Option<&str>,
    ) -> Result<DocumentRef> {
        let mut data = match serde_json::to_value(content)? {
            Value::Object(map) => map,
            other => {
                return Err(ClientError::InvalidArgument(format!(
                    "document content must be a JSON object, got {}",
                    other
                )))
            }
        };
        let body = serde_json::to_string(&data)?;

        let request = match id {
            Some(id) => HttpRequest::put(self.doc_url(id)?),
            None => HttpRequest::post(&self.base_url),
        };
        let response = self.send(request.with_body(body)).await?;

        match response.status {
            201 => {
                let created: CreateResponse = response.json()?;
                let url = document_url(&self.base_url, &created.id);
                tracing::debug!(id = %created.id, rev = %created.rev, "Document created");

                data.insert(ID_FIELD.to_string(), Value::String(created.id));
                data.insert(REV_FIELD.to_string(), Value::String(created.rev));
                DocumentRef::from_parts(data, url, self)
            }
            _ => Err(unexpected(&response)),
        }
    }

    /// Update a document at its revision; returns the new revision.
    ///
    /// The URL is `url` when given, otherwise the document's own.
    #[tracing::instrument(skip(self, doc), fields(db = %self.base_url, doc_url = %doc.url()))]
    pub async fn update<D: Document>(&self, doc: &D, url: Option<&str>) -> Result<String> {
        let url = match (url, doc.id()) {
            (Some(url), _) => url.to_string(),
            (None, Some(id)) if !id.is_empty() => doc.url().to_string(),
            _ => {
                return Err(ClientError::InvalidArgument(
                    "Unable to update a document without a known URL".to_string(),
                ))
            }
        };
        let data = doc.to_map(true)?;
        self.put_revision(url, &data).await
    }

    /// Update from a raw content map.
    ///
    /// The URL is `url` when given, otherwise derived from the map's `_id`.
    /// The map must carry `_rev`.
    #[tracing::instrument(skip(self, content), fields(db = %self.base_url))]
    pub async fn update_content(&self, content: &JsonMap, url: Option<&str>) -> Result<String> {
        let url = match (url, content.get(ID_FIELD).and_then(Value::as_str)) {
            (Some(url), _) => url.to_string(),
            (None, Some(id)) => self.doc_url(id)?,
            (None, None) => {
                return Err(ClientError::InvalidArgument(
                    "Unable to update a document without a known URL".to_string(),
                ))
            }
        };
        self.put_revision(url, content).await
    }

    async fn put_revision(&self, url: String, data: &JsonMap) -> Result<String> {
        if !data.get(REV_FIELD).is_some_and(Value::is_string) {
            return Err(ClientError::InvalidArgument(
                "Unable to update a document without a known revision".to_string(),
            ));
        }

        let request = HttpRequest::put(url).with_body(serde_json::to_string(data)?);
        let response = self.send(request).await?;

        match response.status {
            201 => {
                let updated: UpdateResponse = response.json()?;
                Ok(updated.rev)
            }
            409 => {
                tracing::warn!("Revision conflict");
                Err(ClientError::RevisionConflict { status: 409 })
            }
            _ => Err(unexpected(&response)),
        }
    }

    /// Delete a document at `revision`.
    ///
    /// Returns `false` when the server has no such document.
    #[tracing::instrument(skip(self), fields(db = %self.base_url))]
    pub async fn delete(&self, id: &str, revision: &str) -> Result<bool> {
        let request = HttpRequest::delete(self.doc_url(id)?).with_query_param("rev", revision);
        let response = self.send(request).await?;

        match response.status {
            202 => Ok(true),
            404 => Ok(false),
            _ => Err(unexpected(&response)),
        }
    }

    /// Call a view.
    ///
    /// Every parameter value is JSON-encoded on its own, strings included.
    #[tracing::instrument(skip(self, params), fields(db = %self.base_url))]
    pub async fn view(
        &self,
        view_name: &str,
        params: &[(&str, Value)],
        mode: ReturnMode,
    ) -> Result<ViewResult> {
        let mut request = HttpRequest::get(format!("{}_view/{}", self.base_url, view_name));
        for (key, value) in params {
            request.add_query_param(*key, serde_json::to_string(value)?);
        }

        let response = self.send(request).await?;

        match response.status {
            200 => {
                let raw: ViewResponse = response.json()?;
                ViewResult::from_response(raw, mode, self)
            }
            500 => {
                tracing::warn!(view = view_name, "View does not exist");
                Err(ClientError::ViewNotFound(view_name.to_string()))
            }
            _ => Err(unexpected(&response)),
        }
    }
}
