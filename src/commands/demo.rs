//! Guided walkthrough of the entity manager against the demo models.
//!
//! Saves categories, todo items and sub-items, lists them back with their
//! relations, updates and counts, then deletes everything again (unless
//! `--keep` is given).

use crate::{
    db::db::{Db, IN_MEMORY},
    libs::{
        config::Config,
        formatter::days_from_now,
        messages::Message,
        models::{self, Category, SubItem, TodoItem},
        view::View,
    },
    msg_info, msg_print, msg_success, msg_warning,
    orm::{manager::EntityManager, meta::Entity, sql::Filter, value::Value},
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Run against a throwaway in-memory database
    #[arg(short, long)]
    memory: bool,

    /// Keep the rows instead of deleting them at the end
    #[arg(short, long)]
    keep: bool,
}

pub fn cmd(args: DemoArgs) -> Result<()> {
    let mut config = Config::read()?;
    if args.memory {
        config.database = IN_MEMORY.to_string();
    }
    let manager = EntityManager::new(Db::open(&config)?);
    if args.memory {
        manager.initialize(&models::registry())?;
    }

    let mut work = Category::new("Work");
    let mut home = Category::new("Home");
    save(&manager, &mut work)?;
    save(&manager, &mut home)?;

    let mut todos = vec![
        TodoItem::new("Test Title", "Test Description"),
        TodoItem {
            is_completed: true,
            ..TodoItem::new("Second Test", "Another test description")
        },
        TodoItem {
            expires_at: Some(days_from_now(7)),
            categories: vec![work.clone(), home.clone()],
            ..TodoItem::new("With sub items", "This todo will have multiple sub items")
        },
    ];
    for todo in &mut todos {
        save(&manager, todo)?;
    }

    for title in ["Sub item 1", "Sub item 2", "Sub item 3"] {
        save(&manager, &mut SubItem::new(title, &todos[2]))?;
    }

    let stored = manager.list::<TodoItem>()?;
    msg_print!(Message::TodoItemsHeader, true);
    if stored.is_empty() {
        msg_info!(Message::NoTodoItems);
    } else {
        View::todos(&stored);
    }

    if let Some(mut first) = manager.find_by_id::<TodoItem>(todos[0].id)? {
        first.is_completed = true;
        if manager.update(&first)? {
            msg_success!(Message::EntityUpdated(first.entity_type().name().to_string(), first.id));
        }
    }

    let completed = Filter::from([("is_completed".to_string(), Value::Boolean(true))]);
    msg_info!(Message::EntitiesCounted("Completed TodoItem".to_string(), manager.count::<TodoItem>(Some(&completed))?));

    match manager.find_by_id::<TodoItem>(todos[2].id)? {
        Some(todo) => {
            msg_print!(Message::SubItemsOf(todo.title.clone()));
            for sub_item in &todo.sub_items {
                msg_print!(format!("  - {}", sub_item.title));
            }
        }
        None => msg_warning!(Message::EntityNotFound("TodoItem".to_string(), todos[2].id)),
    }

    if !args.keep {
        for todo in manager.list::<TodoItem>()? {
            if manager.delete(&todo)? {
                msg_success!(Message::EntityDeleted(todo.entity_type().name().to_string(), todo.id));
            }
        }
        for category in [&work, &home] {
            if manager.delete(category)? {
                msg_success!(Message::EntityDeleted(category.entity_type().name().to_string(), category.id));
            }
        }
    }

    msg_success!(Message::DemoFinished);
    Ok(())
}

fn save<T: Entity>(manager: &EntityManager<Db>, entity: &mut T) -> Result<()> {
    let name = entity.entity_type().name().to_string();
    if manager.save(entity)? {
        msg_success!(Message::EntitySaved(name, entity.identity()?));
    } else {
        msg_warning!(Message::EntityNotSaved(name));
    }
    Ok(())
}
