use serde_json::{json, Value};

/// One clause of a row listing query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Vec<String>),
    Contains(String, Vec<String>),
    OrderDesc(String),
    OrderAsc(String),
    Limit(u32),
    Offset(u32),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Equal(attribute.into(), vec![value.into()])
    }

    pub fn equal_any(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Query::Equal(attribute.into(), values)
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Contains(attribute.into(), vec![value.into()])
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::OrderDesc(attribute.into())
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Query::OrderAsc(attribute.into())
    }

    /// The JSON form sent as one `queries[]` parameter.
    pub fn to_json(&self) -> Value {
        match self {
            Query::Equal(attribute, values) => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::Contains(attribute, values) => json!({
                "method": "contains",
                "attribute": attribute,
                "values": values,
            }),
            Query::OrderDesc(attribute) => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::OrderAsc(attribute) => json!({
                "method": "orderAsc",
                "attribute": attribute,
            }),
            Query::Limit(n) => json!({ "method": "limit", "values": [n] }),
            Query::Offset(n) => json!({ "method": "offset", "values": [n] }),
        }
    }

    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }
}
