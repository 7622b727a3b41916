use crate::{
    db::db::Db,
    libs::{config::Config, messages::Message, models},
    msg_bail_anyhow, msg_info, msg_print, msg_success,
    orm::{manager::EntityManager, sql},
};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct DropArgs {
    /// Entities whose tables are dropped; all demo tables when omitted
    entities: Vec<String>,

    /// Drop without asking for confirmation
    #[arg(short, long)]
    yes: bool,
}

pub fn cmd(args: DropArgs) -> Result<()> {
    let registry = models::registry();
    let types = if args.entities.is_empty() {
        registry.types().to_vec()
    } else {
        let mut selected = Vec::new();
        for name in &args.entities {
            match registry.find(name) {
                Some(entity_type) => selected.push(entity_type),
                None => msg_bail_anyhow!(Message::UnknownEntity(name.clone())),
            }
        }
        selected
    };
    if types.is_empty() {
        msg_bail_anyhow!(Message::NoEntitiesSelected);
    }

    let config = Config::read()?;
    let manager = EntityManager::new(Db::open(&config)?);
    let statements = sql::drop_tables(&types, manager.dialect())?;

    msg_print!(Message::TablesToBeDropped);
    for statement in &statements {
        msg_print!(statement);
    }

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDropTables(statements.len()).to_string())
            .default(false)
            .interact()?;

        if !confirmed {
            msg_info!(Message::OperationCancelled);
            return Ok(());
        }
    }

    manager.drop_tables(&types)?;
    msg_success!(Message::TablesDropped(statements.len()));
    Ok(())
}
