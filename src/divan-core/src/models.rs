use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved member carrying a document's id
pub const ID_FIELD: &str = "_id";

/// Reserved member carrying a document's revision
pub const REV_FIELD: &str = "_rev";

/// JSON object as decoded from / sent to the server
pub type JsonMap = Map<String, Value>;

/// DatabaseInfo describes a database as reported by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub db_name: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    #[serde(default)]
    pub update_seq: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<u64>,
    /// Members not covered above, kept as sent
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Body returned when a document is created
#[derive(Debug, Clone, Deserialize)]
pub struct CreateResponse {
    pub id: String,
    pub rev: String,
}

/// Body returned when a document is updated
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    pub rev: String,
}

/// A row of the `_all_docs` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    pub key: Value,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

/// A row of a view response, before any document resolution
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Value,
    #[serde(default)]
    pub value: Value,
    /// Present when the view was queried with `include_docs=true`
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewResponse {
    /// Absent on reduced views
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub offset: Option<u64>,
    pub rows: Vec<ViewRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_info_keeps_unknown_members() {
        let info: DatabaseInfo = serde_json::from_value(json!({
            "db_name": "testdb",
            "doc_count": 3,
            "doc_del_count": 1,
            "update_seq": 7,
            "purge_seq": 0,
            "compact_running": false
        }))
        .unwrap();

        assert_eq!(info.db_name, "testdb");
        assert_eq!(info.doc_count, 3);
        assert_eq!(info.update_seq, json!(7));
        assert_eq!(info.disk_size, None);
        assert_eq!(info.extra.get("compact_running"), Some(&json!(false)));
    }

    #[test]
    fn test_view_response_rows_keep_order() {
        let resp: ViewResponse = serde_json::from_value(json!({
            "total_rows": 3,
            "offset": 0,
            "rows": [
                {"id": "c", "key": 1, "value": "third"},
                {"id": "a", "key": 2, "value": "first"},
                {"key": null, "value": 42}
            ]
        }))
        .unwrap();

        assert_eq!(resp.total_rows, 3);
        let ids: Vec<_> = resp.rows.iter().map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("c"), Some("a"), None]);
        assert_eq!(resp.rows[2].value, json!(42));
    }

    #[test]
    fn test_reduced_view_response() {
        let resp: ViewResponse = serde_json::from_value(json!({
            "rows": [{"key": null, "value": 42}]
        }))
        .unwrap();

        assert_eq!(resp.total_rows, 0);
        assert_eq!(resp.offset, None);
        assert_eq!(resp.rows[0].value, json!(42));
        assert_eq!(resp.rows[0].id, None);
    }

    #[test]
    fn test_all_docs_response() {
        let resp: AllDocsResponse = serde_json::from_value(json!({
            "total_rows": 1,
            "offset": 0,
            "rows": [{"id": "doc1", "key": "doc1", "value": {"rev": "1-abc"}}]
        }))
        .unwrap();

        assert_eq!(resp.rows[0].id, "doc1");
        assert_eq!(resp.rows[0].value["rev"], "1-abc");
    }
}
