use divan_core::url::document_url;
use divan_core::{JsonMap, ID_FIELD, REV_FIELD};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::Connector;
use crate::{ClientError, Result};

/// Capability every document value must provide.
///
/// `Connector::retrieve` and `Connector::update` are generic over it, so any
/// type implementing it can stand in for [`DocumentRef`].
pub trait Document: Sized + Send + Sync {
    /// Build a document from a decoded body, its URL and the connector it came from
    fn from_parts(content: JsonMap, url: String, db: &Connector) -> Result<Self>;

    fn id(&self) -> Option<&str>;

    fn revision(&self) -> Option<&str>;

    fn url(&self) -> &str;

    /// Serialize back to a plain map; `include_meta` adds `_id` and `_rev`
    fn to_map(&self, include_meta: bool) -> Result<JsonMap>;

    fn content(&self) -> Result<JsonMap> {
        self.to_map(false)
    }
}

/// Pull `_id` and `_rev` out of a decoded body
fn split_meta(mut content: JsonMap) -> Result<(Option<String>, Option<String>, JsonMap)> {
    let id = take_string(&mut content, ID_FIELD)?;
    let revision = take_string(&mut content, REV_FIELD)?;
    Ok((id, revision, content))
}

fn take_string(content: &mut JsonMap, field: &str) -> Result<Option<String>> {
    match content.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ClientError::InvalidResponse(format!(
            "expected string for '{}', got {}",
            field, other
        ))),
    }
}

fn put_meta(map: &mut JsonMap, id: Option<&str>, revision: Option<&str>) {
    if let Some(id) = id {
        map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }
    if let Some(rev) = revision {
        map.insert(REV_FIELD.to_string(), Value::String(rev.to_string()));
    }
}

/// A document addressed in one database: id, revision, URL and content fields
#[derive(Debug, Clone)]
pub struct DocumentRef {
    id: Option<String>,
    revision: Option<String>,
    url: String,
    fields: JsonMap,
    db: Connector,
}

impl DocumentRef {
    /// Build from an object whose `_id`, if any, determines the URL
    pub(crate) fn from_object(content: JsonMap, db: &Connector) -> Result<Self> {
        let url = match content.get(ID_FIELD).and_then(Value::as_str) {
            Some(id) => document_url(db.url(), id),
            None => db.url().to_string(),
        };
        Self::from_parts(content, url, db)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> &JsonMap {
        &self.fields
    }

    pub fn connector(&self) -> &Connector {
        &self.db
    }

    /// Store local changes and adopt the new revision
    pub async fn save(&mut self) -> Result<&str> {
        let rev = self.db.update(&*self, None).await?;
        Ok(self.revision.insert(rev).as_str())
    }

    /// Delete this document at its current revision.
    ///
    /// Returns `false` when the server no longer has it.
    pub async fn delete(self) -> Result<bool> {
        let (Some(id), Some(rev)) = (self.id.as_deref(), self.revision.as_deref()) else {
            return Err(ClientError::InvalidArgument(
                "Unable to delete a document without a known id and revision".to_string(),
            ));
        };
        self.db.delete(id, rev).await
    }
}

impl Document for DocumentRef {
    fn from_parts(content: JsonMap, url: String, db: &Connector) -> Result<Self> {
        let (id, revision, fields) = split_meta(content)?;
        Ok(Self {
            id,
            revision,
            url,
            fields,
            db: db.clone(),
        })
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn to_map(&self, include_meta: bool) -> Result<JsonMap> {
        let mut map = self.fields.clone();
        if include_meta {
            put_meta(&mut map, self.id(), self.revision());
        }
        Ok(map)
    }
}

/// A document whose content is a caller-defined type
#[derive(Debug, Clone)]
pub struct Typed<T> {
    id: Option<String>,
    revision: Option<String>,
    url: String,
    pub data: T,
}

impl<T> Typed<T> {
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> Document for Typed<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn from_parts(content: JsonMap, url: String, _db: &Connector) -> Result<Self> {
        let (id, revision, fields) = split_meta(content)?;
        let data = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            ClientError::TypeMismatch(format!(
                "document does not fit {}: {}",
                std::any::type_name::<T>(),
                e
            ))
        })?;

        Ok(Self {
            id,
            revision,
            url,
            data,
        })
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn to_map(&self, include_meta: bool) -> Result<JsonMap> {
        let mut map = match serde_json::to_value(&self.data)? {
            Value::Object(map) => map,
            other => {
                return Err(ClientError::TypeMismatch(format!(
                    "{} does not serialize to an object: {}",
                    std::any::type_name::<T>(),
                    other
                )))
            }
        };
        if include_meta {
            put_meta(&mut map, self.id(), self.revision());
        }
        Ok(map)
    }
}
