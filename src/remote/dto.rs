//! Wire types for the Firestore REST document API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Task;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl Document {
    /// The trailing path segment of `projects/.../documents/users/{uid}/goals/{id}`.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// A typed Firestore value. Exactly one key is present on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(serde_json::Value),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct WriteDocumentRequest {
    pub fields: HashMap<String, Value>,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::ArrayValue(a) => Some(&a.values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::MapValue(m) => Some(&m.fields),
            _ => None,
        }
    }
}

pub fn task_to_value(task: &Task) -> Value {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), Value::StringValue(task.id.clone()));
    fields.insert("title".to_string(), Value::StringValue(task.title.clone()));
    fields.insert("completed".to_string(), Value::BooleanValue(task.completed));
    Value::MapValue(MapValue { fields })
}

pub fn tasks_to_value(tasks: &[Task]) -> Value {
    Value::ArrayValue(ArrayValue {
        values: tasks.iter().map(task_to_value).collect(),
    })
}

/// Reads one embedded task. Entries missing `id` or `title` are rejected;
/// a missing `completed` flag reads as not completed.
pub fn value_to_task(value: &Value) -> Option<Task> {
    let fields = value.as_map()?;
    let id = fields.get("id")?.as_str()?.to_string();
    let title = fields.get("title")?.as_str()?.to_string();
    let completed = fields
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Some(Task { id, title, completed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_response() {
        let body = r#"{
            "documents": [{
                "name": "projects/p/databases/(default)/documents/users/u1/goals/abc123",
                "fields": {
                    "name": { "stringValue": "Learn Go" },
                    "createdAt": { "integerValue": "1767225600000" },
                    "tasks": { "arrayValue": { "values": [
                        { "mapValue": { "fields": {
                            "id": { "stringValue": "t1" },
                            "title": { "stringValue": "Read docs" },
                            "completed": { "booleanValue": true }
                        } } }
                    ] } }
                },
                "createTime": "2026-01-01T00:00:00Z",
                "updateTime": "2026-01-01T00:00:00Z"
            }],
            "nextPageToken": "next"
        }"#;

        let parsed: ListDocumentsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.next_page_token.as_deref(), Some("next"));
        let doc = &parsed.documents[0];
        assert_eq!(doc.id(), "abc123");
        assert_eq!(doc.fields["name"].as_str(), Some("Learn Go"));

        let tasks = doc.fields["tasks"].as_array().unwrap();
        let task = value_to_task(&tasks[0]).unwrap();
        assert_eq!(task.id, "t1");
        assert!(task.completed);
    }

    #[test]
    fn test_empty_list_and_empty_array() {
        let parsed: ListDocumentsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.documents.is_empty());
        assert!(parsed.next_page_token.is_none());

        let value: Value = serde_json::from_str(r#"{ "arrayValue": {} }"#).unwrap();
        assert_eq!(value.as_array().map(|v| v.len()), Some(0));
    }

    #[test]
    fn test_task_serializes_as_map_value() {
        let task = Task::new("t9".to_string(), "Write tests".to_string());
        let json = serde_json::to_value(tasks_to_value(&[task])).unwrap();
        let fields = &json["arrayValue"]["values"][0]["mapValue"]["fields"];
        assert_eq!(fields["id"]["stringValue"], "t9");
        assert_eq!(fields["title"]["stringValue"], "Write tests");
        assert_eq!(fields["completed"]["booleanValue"], false);
    }

    #[test]
    fn test_value_to_task_rejects_incomplete_entries() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), Value::StringValue("no id".to_string()));
        assert!(value_to_task(&Value::MapValue(MapValue { fields })).is_none());
        assert!(value_to_task(&Value::StringValue("t1".to_string())).is_none());
    }
}
