//! pdb: PuppetDB query algebra and client
//!
//! Build predicates over nodes, facts and resources, render them into
//! PuppetDB's query language, and run them against the query API.

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod response;
pub mod transport;

pub use client::{facts_query, PuppetDb, FACTS_ENDPOINT, NODES_ENDPOINT};
pub use config::Config;
pub use error::{Error, Result};
pub use query::{
    parse_filter, synthesize_subquery, Context, FactMatch, FactNamePresence, MachineMatch,
    NameValueFilter, Predicate, ResourceMatch, Subquery,
};
pub use response::{fact_map, node_names, FactMap, FactRow, NodeRow};
pub use transport::{HttpTransport, Transport};
