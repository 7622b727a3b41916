//! Demo entity types used by the command-line walkthrough.
//!
//! A todo item owns its sub-items (one-to-many, each sub-item points back
//! through `todo_item`) and is linked to shared categories (many-to-many).

use crate::impl_entity;
use crate::orm::meta::ColumnType;
use crate::orm::schema::Registry;
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub expires_at: Option<NaiveDateTime>,
    pub is_completed: bool,
    pub sub_items: Vec<SubItem>,
    pub categories: Vec<Category>,
}

impl_entity!(TodoItem {
    id: identity,
    title: column(ColumnType::Text),
    description: column(ColumnType::Text),
    expires_at: column(ColumnType::DateTime),
    is_completed: column(ColumnType::Boolean),
    sub_items: one_to_many<SubItem>,
    categories: many_to_many<Category>,
});

impl TodoItem {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }
}

impl fmt::Display for TodoItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubItem {
    pub id: i64,
    pub title: String,
    pub todo_item: Option<Box<TodoItem>>,
}

impl_entity!(SubItem {
    id: identity,
    title: column(ColumnType::Text),
    todo_item: many_to_one<TodoItem>,
});

impl SubItem {
    /// New sub-item attached to a saved `parent`.
    pub fn new(title: &str, parent: &TodoItem) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            todo_item: Some(Box::new(parent.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    pub id: i64,
    pub label: String,
}

impl_entity!(Category {
    id: identity,
    label: column(ColumnType::varchar()),
});

impl Category {
    pub fn new(label: &str) -> Self {
        Self {
            id: 0,
            label: label.to_string(),
        }
    }
}

/// Every demo type, in creation order.
pub fn registry() -> Registry {
    Registry::new().register::<TodoItem>().register::<SubItem>().register::<Category>()
}
