//! Document query filters, encoded the way the REST API expects them.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal { attribute: String, values: Vec<Value> },
    Limit(u32),
    OrderAsc(String),
    OrderDesc(String),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn limit(limit: u32) -> Self {
        Query::Limit(limit)
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Query::OrderAsc(attribute.into())
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::OrderDesc(attribute.into())
    }

    pub fn to_json(&self) -> Value {
        match self {
            Query::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::Limit(limit) => json!({ "method": "limit", "values": [limit] }),
            Query::OrderAsc(attribute) => json!({ "method": "orderAsc", "attribute": attribute }),
            Query::OrderDesc(attribute) => json!({ "method": "orderDesc", "attribute": attribute }),
        }
    }

    /// `queries[]=...&queries[]=...`, percent-encoded.
    pub fn encode_all(queries: &[Query]) -> String {
        queries
            .iter()
            .map(|q| {
                format!(
                    "{}={}",
                    urlencoding::encode("queries[]"),
                    urlencoding::encode(&q.to_json().to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
