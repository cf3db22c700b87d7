//! Adapters from PuppetDB response rows to caller-facing shapes.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::Result;

/// Fact name -> (certname -> value).
pub type FactMap = BTreeMap<String, BTreeMap<String, Value>>;

/// A row from `/nodes`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeRow {
    pub name: String,
    #[serde(default)]
    pub deactivated: Option<String>,
    #[serde(default)]
    pub catalog_timestamp: Option<String>,
    #[serde(default)]
    pub facts_timestamp: Option<String>,
    #[serde(default)]
    pub report_timestamp: Option<String>,
}

/// A row from `/facts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FactRow {
    pub certname: String,
    pub name: String,
    pub value: Value,
}

/// Decode rows. A bare object is treated as a single row.
pub fn rows<T: DeserializeOwned>(json: Value) -> Result<Vec<T>> {
    match json {
        Value::Array(_) => Ok(serde_json::from_value(json)?),
        row => Ok(vec![serde_json::from_value(row)?]),
    }
}

/// Node names from a `/nodes` response, in response order.
pub fn node_names(json: Value) -> Result<Vec<String>> {
    Ok(rows::<NodeRow>(json)?.into_iter().map(|row| row.name).collect())
}

/// Group a `/facts` response by fact name, then certname.
pub fn fact_map(json: Value) -> Result<FactMap> {
    let mut map = FactMap::new();
    for row in rows::<FactRow>(json)? {
        map.entry(row.name).or_default().insert(row.certname, row.value);
    }
    Ok(map)
}
