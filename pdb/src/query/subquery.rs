//! Sub-query synthesis.
//!
//! Some predicates describe a different entity than the endpoint being
//! queried (a resource declared on a node, a fact row when listing nodes).
//! Those are rewritten as an `in` over the join field of the outer query,
//! fed by an `extract` from the related entity's selector:
//!
//! ```text
//! ["in", <join>, ["extract", <extract>, [<select>, <name-value filter>]]]
//! ```

use serde_json::{json, Value};

/// The narrower rendering embedded inside a synthesized sub-query.
///
/// Only leaves that describe a selectable entity by its intrinsic name and
/// value fields implement this. Requiring it as a bound keeps connectives and
/// node matches out of `synthesize_subquery` at compile time.
pub trait NameValueFilter {
    fn name_value_filter(&self) -> Value;
}

/// Selector, projected field and outer join field of a sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subquery {
    pub select: &'static str,
    pub extract: &'static str,
    pub join: &'static str,
}

impl Subquery {
    /// Nodes declaring a matching resource (node rows key on `name`).
    pub const RESOURCES_FOR_NODES: Subquery = Subquery {
        select: "select_resources",
        extract: "certname",
        join: "name",
    };

    /// Fact rows of nodes declaring a matching resource.
    pub const RESOURCES_FOR_FACTS: Subquery = Subquery {
        select: "select_resources",
        extract: "certname",
        join: "certname",
    };

    /// Nodes reporting a matching fact.
    pub const FACTS_FOR_NODES: Subquery = Subquery {
        select: "select_facts",
        extract: "certname",
        join: "name",
    };

    /// Fact rows of nodes reporting a matching fact.
    pub const FACTS_FOR_FACTS: Subquery = Subquery {
        select: "select_facts",
        extract: "certname",
        join: "certname",
    };

    /// Wrap a name-value filter into this sub-query.
    pub fn wrap<F: NameValueFilter + ?Sized>(&self, filter: &F) -> Value {
        subquery_value(filter, self.select, self.extract, self.join)
    }
}

/// Build the sub-query as a JSON value.
pub fn subquery_value<F: NameValueFilter + ?Sized>(
    filter: &F,
    select: &str,
    extract: &str,
    join: &str,
) -> Value {
    json!(["in", join, ["extract", extract, [select, filter.name_value_filter()]]])
}

/// Render a sub-query selecting `extract` from `select` rows matched by
/// `filter`, joined to the outer query on `join`.
pub fn synthesize_subquery<F: NameValueFilter + ?Sized>(
    filter: &F,
    select: &str,
    extract: &str,
    join: &str,
) -> String {
    subquery_value(filter, select, extract, join).to_string()
}
