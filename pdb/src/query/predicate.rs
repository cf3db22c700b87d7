//! Predicate trees and their rendering into the PuppetDB query grammar.

use serde_json::{json, Value};

use super::subquery::{NameValueFilter, Subquery};
use crate::{Error, Result};

/// Default comparison operator for leaf predicates.
pub const EQUALS: &str = "=";

/// Regex match operator.
pub const MATCHES: &str = "~";

/// Which endpoint a predicate is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// `/nodes`: rows are keyed by `name`.
    Machine,
    /// `/facts`: rows are keyed by `certname`.
    Fact,
}

/// A node in a query tree.
///
/// Trees are plain values: rendering never mutates them, so the same tree
/// can be rendered repeatedly and for either context.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Not(Box<Predicate>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Machine(MachineMatch),
    Fact(FactMatch),
    FactName(FactNamePresence),
    Resource(ResourceMatch),
}

/// Match nodes by certname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineMatch {
    pub identifier: String,
    pub operator: String,
}

/// Match by the value of a named fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactMatch {
    pub name: String,
    pub value: String,
    pub operator: String,
}

/// Match nodes reporting any value for a named fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactNamePresence {
    pub name: String,
}

/// Match through a resource declared in a node's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMatch {
    pub resource_type: String,
    pub title: String,
    pub exported: bool,
    pub operator: String,
}

impl Predicate {
    /// `["=", "name", identifier]` on nodes.
    pub fn machine(identifier: impl Into<String>) -> Self {
        Predicate::Machine(MachineMatch::new(identifier))
    }

    /// `["=", ["fact", name], value]` on nodes.
    pub fn fact(name: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Fact(FactMatch::new(name, value))
    }

    /// Nodes that report `name` at all.
    pub fn fact_present(name: impl Into<String>) -> Self {
        Predicate::FactName(FactNamePresence::new(name))
    }

    /// Nodes declaring the resource `resource_type[title]`.
    pub fn resource(resource_type: impl Into<String>, title: impl Into<String>) -> Self {
        Predicate::Resource(ResourceMatch::new(resource_type, title))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not(Box::new(predicate))
    }

    /// Conjunction of `predicates`. Fails when there are none.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Result<Self> {
        non_empty("and", predicates).map(Predicate::And)
    }

    /// Disjunction of `predicates`. Fails when there are none.
    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Result<Self> {
        non_empty("or", predicates).map(Predicate::Or)
    }

    /// Render for the given endpoint.
    pub fn render(&self, context: Context) -> String {
        self.to_value(context).to_string()
    }

    /// Render for `/nodes`.
    pub fn render_machine(&self) -> String {
        self.render(Context::Machine)
    }

    /// Render for `/facts`.
    pub fn render_fact(&self) -> String {
        self.render(Context::Fact)
    }

    /// Render the sub-query name-value filter for this predicate.
    ///
    /// Connectives and node matches have no such form.
    pub fn render_name_value(&self) -> Result<String> {
        match self {
            Predicate::Fact(fact) => Ok(fact.name_value_filter().to_string()),
            Predicate::FactName(fact) => Ok(fact.name_value_filter().to_string()),
            Predicate::Resource(resource) => Ok(resource.name_value_filter().to_string()),
            Predicate::Machine(_) => Err(Error::Unsupported("name-value filter for a node match")),
            Predicate::Not(_) | Predicate::And(_) | Predicate::Or(_) => {
                Err(Error::Unsupported("name-value filter for a boolean connective"))
            }
        }
    }

    /// Build the query value for `context`.
    ///
    /// Children of a connective are always built for the same context.
    pub fn to_value(&self, context: Context) -> Value {
        match self {
            Predicate::Not(inner) => json!(["not", inner.to_value(context)]),
            Predicate::And(children) => connective("and", children, context),
            Predicate::Or(children) => connective("or", children, context),
            Predicate::Machine(machine) => machine.to_value(context),
            Predicate::Fact(fact) => fact.to_value(context),
            Predicate::FactName(fact) => fact.to_value(context),
            Predicate::Resource(resource) => resource.to_value(context),
        }
    }
}

fn non_empty(
    token: &'static str,
    predicates: impl IntoIterator<Item = Predicate>,
) -> Result<Vec<Predicate>> {
    let predicates: Vec<_> = predicates.into_iter().collect();
    if predicates.is_empty() {
        return Err(Error::EmptyConnective(token));
    }
    Ok(predicates)
}

fn connective(token: &str, children: &[Predicate], context: Context) -> Value {
    let mut items = Vec::with_capacity(children.len() + 1);
    items.push(Value::from(token));
    items.extend(children.iter().map(|child| child.to_value(context)));
    Value::Array(items)
}

impl MachineMatch {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            operator: EQUALS.to_string(),
        }
    }

    /// Compare with `operator` instead of `=`.
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    fn to_value(&self, context: Context) -> Value {
        let field = match context {
            Context::Machine => "name",
            Context::Fact => "certname",
        };
        json!([self.operator, field, self.identifier])
    }
}

impl FactMatch {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            operator: EQUALS.to_string(),
        }
    }

    /// Compare the value with `operator` instead of `=`.
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    fn to_value(&self, context: Context) -> Value {
        match context {
            Context::Machine => json!([self.operator, ["fact", self.name], self.value]),
            Context::Fact => Subquery::FACTS_FOR_FACTS.wrap(self),
        }
    }
}

impl NameValueFilter for FactMatch {
    fn name_value_filter(&self) -> Value {
        json!([
            "and",
            ["=", "name", self.name],
            [self.operator, "value", self.value]
        ])
    }
}

impl FactNamePresence {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn to_value(&self, context: Context) -> Value {
        match context {
            Context::Machine => Subquery::FACTS_FOR_NODES.wrap(self),
            Context::Fact => self.name_value_filter(),
        }
    }
}

impl NameValueFilter for FactNamePresence {
    fn name_value_filter(&self) -> Value {
        json!(["=", "name", self.name])
    }
}

impl ResourceMatch {
    pub fn new(resource_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            title: title.into(),
            exported: false,
            operator: EQUALS.to_string(),
        }
    }

    /// Match exported resources instead of ordinary ones.
    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    /// Compare the title with `operator` instead of `=`.
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    fn to_value(&self, context: Context) -> Value {
        match context {
            Context::Machine => Subquery::RESOURCES_FOR_NODES.wrap(self),
            Context::Fact => Subquery::RESOURCES_FOR_FACTS.wrap(self),
        }
    }
}

impl NameValueFilter for ResourceMatch {
    fn name_value_filter(&self) -> Value {
        json!([
            "and",
            ["=", "type", self.resource_type],
            [self.operator, "title", self.title],
            ["=", "exported", self.exported]
        ])
    }
}

impl From<MachineMatch> for Predicate {
    fn from(machine: MachineMatch) -> Self {
        Predicate::Machine(machine)
    }
}

impl From<FactMatch> for Predicate {
    fn from(fact: FactMatch) -> Self {
        Predicate::Fact(fact)
    }
}

impl From<FactNamePresence> for Predicate {
    fn from(fact: FactNamePresence) -> Self {
        Predicate::FactName(fact)
    }
}

impl From<ResourceMatch> for Predicate {
    fn from(resource: ResourceMatch) -> Self {
        Predicate::Resource(resource)
    }
}
