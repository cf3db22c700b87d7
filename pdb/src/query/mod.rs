//! Query algebra for PuppetDB's nested-array query language.
//!
//! # Rendering contexts
//!
//! A [`Predicate`] renders for one of two endpoints:
//!
//! - **Machine** (`/nodes`): node identifiers live in `name`, facts are
//!   addressed as `["fact", <name>]`.
//! - **Fact** (`/facts`): rows carry `certname`, `name` and `value`.
//!
//! Resource predicates, and fact predicates that do not fit the target
//! endpoint, are rewritten as sub-queries (see [`synthesize_subquery`]).
//!
//! # Filter syntax
//!
//! [`parse_filter`] reads a compact text form used by the `pdq` CLI:
//! `fact:osfamily=Debian !name~^db resource:Class[Nginx]`.

pub mod parser;
mod predicate;
mod subquery;

pub use parser::parse_filter;
pub use predicate::{
    Context, FactMatch, FactNamePresence, MachineMatch, Predicate, ResourceMatch, EQUALS, MATCHES,
};
pub use subquery::{subquery_value, synthesize_subquery, NameValueFilter, Subquery};

#[cfg(test)]
mod tests;
