//! CLI command implementations.

use std::path::PathBuf;

use log::debug;
use pdb::{parse_filter, Config, Context, Predicate, PuppetDb};
use serde_json::Value;

use crate::{OutputFormat, RenderContext};

/// Where to send queries: overrides from the command line.
pub struct Target {
    pub url: Option<String>,
    pub config: Option<PathBuf>,
}

impl Target {
    fn config(&self) -> pdb::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?.with_env_overrides(),
            None => Config::load()?,
        };
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        debug!("using PuppetDB at {}", config.url);
        Ok(config)
    }

    fn client(&self) -> pdb::Result<PuppetDb> {
        PuppetDb::from_config(&self.config()?)
    }
}

/// Parse the filter words as one filter string.
fn parse_args(filter: &[String]) -> pdb::Result<Option<Predicate>> {
    parse_filter(&filter.join(" "))
}

pub fn nodes(target: &Target, filter: &[String], format: OutputFormat) -> pdb::Result<()> {
    let query = parse_args(filter)?;
    let names = target.client()?.nodes(query.as_ref())?;

    match format {
        OutputFormat::Text => {
            for name in names {
                println!("{}", name);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
    }
    Ok(())
}

pub fn facts(
    target: &Target,
    names: &[String],
    filter: &[String],
    format: OutputFormat,
) -> pdb::Result<()> {
    let query = parse_args(filter)?;
    let facts = target.client()?.facts(names, query.as_ref())?;

    match format {
        OutputFormat::Text => {
            for (fact, nodes) in &facts {
                for (certname, value) in nodes {
                    println!("{}\t{}\t{}", certname, fact, display_value(value));
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&facts)?),
    }
    Ok(())
}

pub fn render(context: RenderContext, filter: &[String]) -> pdb::Result<()> {
    let query = parse_args(filter)?
        .ok_or_else(|| pdb::Error::Parse("no filter given".to_string()))?;
    let context = match context {
        RenderContext::Nodes => Context::Machine,
        RenderContext::Facts => Context::Fact,
    };
    println!("{}", query.render(context));
    Ok(())
}

/// Strings print bare; everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
