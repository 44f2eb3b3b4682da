use serde::{Deserialize, Serialize};

/// A statement query, optionally with positional parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub statement: String,
    pub positional: Vec<serde_json::Value>,
}

impl Query {
    pub fn simple(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            positional: Vec::new(),
        }
    }

    pub fn parameterized(statement: impl Into<String>, positional: Vec<serde_json::Value>) -> Self {
        Self {
            statement: statement.into(),
            positional,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<serde_json::Value>,
}

/// A query against a materialized view of a bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub design_doc: String,
    pub view: String,
    pub limit: Option<usize>,
    pub descending: bool,
}

impl ViewQuery {
    pub fn new(design_doc: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            design_doc: design_doc.into(),
            view: view.into(),
            limit: None,
            descending: false,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub id: String,
    pub key: serde_json::Value,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    pub rows: Vec<ViewRow>,
}
