use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use rolegate_core::entity::{Entity, Operation};

#[derive(Debug, Parser)]
#[command(name = "rolegate", version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decide one operation and print the decision as JSON.
    Check(CheckArgs),
    /// Print the part of an update the subject may write.
    FilterUpdate {
        #[command(flatten)]
        target: TargetArgs,

        /// Proposed field change, `name=value`.
        #[arg(long = "set", value_parser = parse_field)]
        updates: Vec<(String, Value)>,
    },
    /// Load every entity type and report inert grants.
    Validate,
    ListTypes,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[arg(long)]
    pub operation: Operation,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    #[arg(long)]
    pub entity_type: String,

    #[arg(long)]
    pub subject: i64,

    /// Id of an existing entity.
    #[arg(long)]
    pub id: Option<i64>,

    /// Entity field, `name=value`. Values are read as JSON when they parse.
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,
}

impl TargetArgs {
    /// `None` when neither an id nor any field was given.
    pub fn entity(&self) -> Option<Entity> {
        if self.id.is_none() && self.fields.is_empty() {
            return None;
        }
        let mut entity: Entity = self.fields.iter().cloned().collect();
        if let Some(id) = self.id {
            entity = entity.with_id(id);
        }
        Some(entity)
    }
}

pub fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}
