//! Configuration and database initialization command.
//!
//! Runs the configuration wizard (or takes the defaults), saves the result and
//! creates the tables of every demo entity in the configured database.

use crate::{
    db::db::Db,
    libs::{config::Config, messages::Message, models},
    msg_info, msg_success, msg_warning,
    orm::{manager::EntityManager, sql},
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Remove the saved configuration instead of creating one
    #[arg(short, long)]
    delete: bool,

    /// Skip the wizard and save the default configuration
    #[arg(long)]
    defaults: bool,

    /// Drop existing tables before creating them
    #[arg(short, long)]
    force: bool,
}

pub fn cmd(init_args: InitArgs) -> Result<()> {
    if init_args.delete {
        if Config::delete()? {
            msg_success!(Message::ConfigDeleted);
        } else {
            msg_warning!(Message::ConfigFileNotFound);
        }
        return Ok(());
    }

    let config = if init_args.defaults {
        msg_info!(Message::ConfigUsingDefaults);
        Config::default()
    } else {
        Config::init()?
    };
    config.save()?;
    msg_success!(Message::ConfigSaved);

    let manager = EntityManager::new(Db::open(&config)?);
    msg_info!(Message::DatabaseOpened(config.database.clone()));

    let registry = models::registry();
    if init_args.force {
        manager.drop_tables(registry.types())?;
    }
    manager.initialize(&registry)?;

    let created = sql::create_tables(registry.types(), manager.dialect())?.len();
    msg_success!(Message::TablesCreated(created));
    Ok(())
}
