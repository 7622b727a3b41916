//! Prints the statements that create (and optionally drop) the demo tables,
//! compiled for either dialect. Nothing is executed.

use crate::{
    libs::{config::Config, messages::Message, models, view::View},
    msg_print,
    orm::sql::{self, Dialect},
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Target dialect; defaults to the configured one
    #[arg(short, long, value_enum)]
    dialect: Option<Dialect>,

    /// Prefix the output with the matching DROP statements
    #[arg(long)]
    drop: bool,
}

pub fn cmd(args: SchemaArgs) -> Result<()> {
    let dialect = match args.dialect {
        Some(dialect) => dialect,
        None => Config::read()?.dialect,
    };
    let registry = models::registry();

    let mut statements = Vec::new();
    if args.drop {
        statements.extend(sql::drop_tables(registry.types(), dialect)?);
    }
    statements.extend(sql::create_tables(registry.types(), dialect)?);

    msg_print!(Message::SchemaHeader(dialect.to_string()), true);
    View::statements(&statements);
    Ok(())
}
