//! Display implementation for application messages.
//!
//! All user-facing text lives here, so commands only ever pass structured
//! [`Message`] values to the printing macros:
//!
//! ```rust
//! use microrm::libs::messages::Message;
//! use microrm::msg_success;
//!
//! msg_success!(Message::TablesCreated(3));
//! ```

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let text = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration file removed".to_string(),
            Message::ConfigFileNotFound => "Configuration file not found".to_string(),
            Message::ConfigUsingDefaults => "Using default configuration".to_string(),

            // === DATABASE MESSAGES ===
            Message::DatabaseOpened(path) => format!("Database: {}", path),
            Message::TablesCreated(count) => format!("Created {} table(s)", count),
            Message::TablesDropped(count) => format!("Dropped {} table(s)", count),
            Message::TablesToBeDropped => "The following tables will be dropped:".to_string(),
            Message::ConfirmDropTables(count) => format!("Drop {} table(s) and all their rows?", count),
            Message::UnknownEntity(name) => format!("Unknown entity '{}'", name),
            Message::NoEntitiesSelected => "No entities selected".to_string(),
            Message::OperationCancelled => "Operation cancelled".to_string(),

            // === SCHEMA MESSAGES ===
            Message::SchemaHeader(dialect) => format!("Schema ({})", dialect),

            // === ENTITY MESSAGES ===
            Message::EntitySaved(entity, id) => format!("{} #{} saved", entity, id),
            Message::EntityUpdated(entity, id) => format!("{} #{} updated", entity, id),
            Message::EntityDeleted(entity, id) => format!("{} #{} deleted", entity, id),
            Message::EntityNotFound(entity, id) => format!("{} #{} not found", entity, id),
            Message::EntityNotSaved(entity) => format!("{} was not saved", entity),
            Message::EntitiesCounted(entity, count) => format!("{}: {} row(s)", entity, count),

            // === DEMO MESSAGES ===
            Message::TodoItemsHeader => "Todo items".to_string(),
            Message::NoTodoItems => "No todo items stored".to_string(),
            Message::SubItemsOf(title) => format!("Sub-items of '{}'", title),
            Message::DemoFinished => "Walkthrough finished".to_string(),

            // === PROMPTS ===
            Message::PromptDatabase => "Database file (or :memory:)".to_string(),
            Message::PromptDialect => "SQL dialect".to_string(),
            Message::PromptForeignKeys => "Enforce foreign keys?".to_string(),
        };

        write!(f, "{}", text)
    }
}
