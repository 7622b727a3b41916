//! Configuration management.
//!
//! The configuration is a small JSON document stored next to the default
//! database in the platform data directory. It selects the database file,
//! the SQL dialect statements are compiled for, and whether SQLite enforces
//! foreign keys.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use microrm::libs::config::Config;
//!
//! // Load existing configuration or fall back to defaults
//! let config = Config::read()?;
//!
//! // Run the interactive setup and persist the answers
//! let updated_config = Config::init()?;
//! updated_config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::db::db::DB_FILE_NAME;
use crate::libs::messages::Message;
use crate::orm::sql::Dialect;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Database file. Relative names resolve inside the data directory;
    /// `:memory:` opens a throwaway in-memory database.
    pub database: String,

    /// Dialect statements are compiled for.
    pub dialect: Dialect,

    /// Whether `PRAGMA foreign_keys` is switched on after connecting.
    pub foreign_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DB_FILE_NAME.to_string(),
            dialect: Dialect::default(),
            foreign_keys: true,
        }
    }
}

impl Config {
    /// Loads the saved configuration; a missing file yields the defaults.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes the saved configuration file, returning whether one existed.
    pub fn delete() -> Result<bool> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(config_file_path)?;
        Ok(true)
    }

    /// Interactive setup wizard seeded with the current values.
    pub fn init() -> Result<Self> {
        let default = Self::read().unwrap_or_default();

        let database: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptDatabase.to_string())
            .default(default.database)
            .interact_text()?;

        let dialects = [Dialect::Sqlite, Dialect::Postgres];
        let selected = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptDialect.to_string())
            .items(&dialects.iter().map(|dialect| dialect.to_string()).collect::<Vec<_>>())
            .default(dialects.iter().position(|dialect| *dialect == default.dialect).unwrap_or(0))
            .interact()?;

        let foreign_keys = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptForeignKeys.to_string())
            .default(default.foreign_keys)
            .interact()?;

        Ok(Config {
            database,
            dialect: dialects[selected],
            foreign_keys,
        })
    }
}
