//! PuppetDB query client.
//!
//! Renders an optional predicate for the endpoint being queried, sends it
//! through a [`Transport`] and adapts the response rows.

use log::debug;

use crate::query::Predicate;
use crate::response::{fact_map, node_names, FactMap};
use crate::transport::{HttpTransport, Transport};
use crate::{Config, Result};

/// Node listing endpoint.
pub const NODES_ENDPOINT: &str = "/nodes";

/// Fact listing endpoint.
pub const FACTS_ENDPOINT: &str = "/facts";

/// Client for the PuppetDB query API.
#[derive(Debug, Clone)]
pub struct PuppetDb<T = HttpTransport> {
    transport: T,
}

impl PuppetDb<HttpTransport> {
    /// Build a client with an HTTP transport.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> PuppetDb<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Names of nodes matching `query` (all nodes when `None`).
    pub fn nodes(&self, query: Option<&Predicate>) -> Result<Vec<String>> {
        let rendered = query.map(Predicate::render_machine);
        let json = self.transport.get(NODES_ENDPOINT, rendered.as_deref())?;
        let names = node_names(json)?;
        debug!("{} nodes matched", names.len());
        Ok(names)
    }

    /// Facts named in `names` (all facts when empty) for nodes matching `query`.
    pub fn facts<S: AsRef<str>>(&self, names: &[S], query: Option<&Predicate>) -> Result<FactMap> {
        let rendered = facts_query(names, query).map(|p| p.render_fact());
        let json = self.transport.get(FACTS_ENDPOINT, rendered.as_deref())?;
        let facts = fact_map(json)?;
        debug!("{} facts returned", facts.len());
        Ok(facts)
    }
}

/// The `/facts` predicate: any of `names`, narrowed by `query`.
pub fn facts_query<S: AsRef<str>>(names: &[S], query: Option<&Predicate>) -> Option<Predicate> {
    // No names, no name filter
    let by_name = Predicate::or(
        names
            .iter()
            .map(|name| Predicate::fact_present(name.as_ref())),
    )
    .ok();

    match (by_name, query) {
        (Some(by_name), Some(query)) => Some(Predicate::And(vec![by_name, query.clone()])),
        (Some(by_name), None) => Some(by_name),
        (None, Some(query)) => Some(query.clone()),
        (None, None) => None,
    }
}
