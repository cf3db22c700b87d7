//! Filter parser for the `pdq` command line.
//!
//! # Syntax
//!
//! A filter is a list of whitespace-separated terms. More than one term is
//! combined with `and`.
//!
//! - **Node**: `name=web01.example.net`, `name~^web`, or a bare `web01`
//! - **Fact value**: `fact:osfamily=Debian`, `fact:kernel~^Linux`,
//!   `fact:memorysize_mb>=2048`
//! - **Fact present**: `has:ec2_metadata`
//! - **Resource**: `resource:Class[Nginx]`, `resource:File~[^/etc/]`,
//!   exported with `@@resource:Nagios_host[web01]`
//! - **Negation**: `!term` negates the whole term
//! - **Alternatives**: `a|b|c` inside one term is an `or`. After a comparison
//!   operator, `|` stays in the value (`fact:kernel~Linux|BSD`) unless a
//!   prefixed term follows (`fact:kernel~Linux|has:bsd_version`)

use super::predicate::{FactMatch, MachineMatch, Predicate, ResourceMatch, EQUALS, MATCHES};
use crate::{Error, Result};

/// Operators accepted after a fact name (two-char operators first).
const FACT_OPERATORS: &[&str] = &[">=", "<=", "=", "~", ">", "<"];

/// Operators accepted after `name`.
const NAME_OPERATORS: &[&str] = &["=", "~"];

/// Parse a filter string into a predicate tree.
///
/// Returns `Ok(None)` for an empty filter (match everything).
pub fn parse_filter(input: &str) -> Result<Option<Predicate>> {
    let mut terms = Vec::new();
    let mut remaining = input.trim();

    while !remaining.is_empty() {
        let end = find_term_end(remaining);
        terms.push(parse_term(&remaining[..end])?);
        remaining = remaining[end..].trim_start();
    }

    Ok(match terms.len() {
        0 => None,
        1 => terms.pop(),
        _ => Some(Predicate::and(terms)?),
    })
}

/// Find where a term ends. Whitespace inside `[...]` belongs to the term.
fn find_term_end(input: &str) -> usize {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => return i,
            _ => {}
        }
    }
    input.len()
}

/// Parse one term: optional `!`, then one or more `|`-separated atoms.
fn parse_term(term: &str) -> Result<Predicate> {
    if let Some(inner) = term.strip_prefix('!') {
        if inner.is_empty() {
            return Err(Error::Parse("'!' must be followed by a term".to_string()));
        }
        return Ok(Predicate::not(parse_term(inner)?));
    }

    let alternatives = split_alternatives(term);
    if alternatives.len() > 1 {
        let predicates = alternatives
            .into_iter()
            .map(parse_term)
            .collect::<Result<Vec<_>>>()?;
        return Predicate::or(predicates);
    }

    parse_atom(term)
}

/// Split on `|` outside of `[...]`.
///
/// Inside a comparison value (`fact:kernel~Linux|BSD`, `name~^web|^db`) a
/// `|` only separates alternatives when a prefixed atom follows it.
fn split_alternatives(term: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in term.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '|' if depth == 0
                && (!is_comparison(&term[start..i]) || starts_prefixed_atom(&term[i + 1..])) =>
            {
                parts.push(&term[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&term[start..]);
    parts
}

/// Whether `atom` has reached the value of a `fact:` or `name` comparison.
fn is_comparison(atom: &str) -> bool {
    let atom = atom.trim_start_matches('!');
    if let Some(rest) = atom.strip_prefix("fact:") {
        return rest.contains(['=', '~', '<', '>']);
    }
    atom.starts_with("name=") || atom.starts_with("name~")
}

/// Whether `input` opens an atom that cannot be part of a value.
fn starts_prefixed_atom(input: &str) -> bool {
    let input = input.trim_start_matches('!');
    ["fact:", "has:", "resource:", "@@resource:", "name=", "name~"]
        .iter()
        .any(|prefix| input.starts_with(prefix))
}

fn parse_atom(atom: &str) -> Result<Predicate> {
    if atom.is_empty() {
        return Err(Error::Parse("empty term".to_string()));
    }

    if let Some(rest) = atom.strip_prefix("@@resource:") {
        return parse_resource(rest, true);
    }
    if let Some(rest) = atom.strip_prefix("resource:") {
        return parse_resource(rest, false);
    }

    if let Some(name) = atom.strip_prefix("has:") {
        if name.is_empty() {
            return Err(Error::Parse("'has:' needs a fact name".to_string()));
        }
        return Ok(Predicate::fact_present(name));
    }

    if let Some(rest) = atom.strip_prefix("fact:") {
        let (name, op, value) = split_comparison(rest, FACT_OPERATORS)
            .ok_or_else(|| Error::Parse(format!("'{}' has no comparison operator", atom)))?;
        if name.is_empty() {
            return Err(Error::Parse(format!("'{}' has no fact name", atom)));
        }
        if value.is_empty() {
            return Err(Error::Parse(format!("'{}' has no value", atom)));
        }
        return Ok(FactMatch::new(name, value).operator(op).into());
    }

    // name=... / name~... (but "nameserver01" is a bare node)
    if let Some(rest) = atom.strip_prefix("name") {
        if let Some(("", op, value)) = split_comparison(rest, NAME_OPERATORS) {
            if value.is_empty() {
                return Err(Error::Parse(format!("'{}' has no value", atom)));
            }
            return Ok(MachineMatch::new(value).operator(op).into());
        }
    }

    if atom.starts_with('-') {
        return Err(Error::Parse(format!("'{}' looks like an option, not a term", atom)));
    }

    if atom.contains(['[', ']', '=', '~', '<', '>', ':']) {
        return Err(Error::Parse(format!("unrecognized term '{}'", atom)));
    }

    Ok(Predicate::machine(atom))
}

/// Parse `Type[Title]` or `Type~[pattern]`.
fn parse_resource(resource: &str, exported: bool) -> Result<Predicate> {
    let open = resource
        .find('[')
        .ok_or_else(|| Error::Parse(format!("resource '{}' needs a [title]", resource)))?;
    let title = resource[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| Error::Parse(format!("resource '{}' is missing a closing ']'", resource)))?;

    let head = &resource[..open];
    let (resource_type, op) = match head.strip_suffix('~') {
        Some(resource_type) => (resource_type, MATCHES),
        None => (head, EQUALS),
    };

    if resource_type.is_empty() {
        return Err(Error::Parse(format!("resource '{}' has no type", resource)));
    }

    Ok(ResourceMatch::new(resource_type, title)
        .exported(exported)
        .operator(op)
        .into())
}

/// Split `field<op>value` at the first operator character.
fn split_comparison<'a>(
    input: &'a str,
    operators: &[&'static str],
) -> Option<(&'a str, &'static str, &'a str)> {
    let pos = input.find(['=', '~', '<', '>'])?;
    let (field, after) = input.split_at(pos);
    let op = operators.iter().copied().find(|op| after.starts_with(*op))?;
    Some((field, op, &after[op.len()..]))
}
