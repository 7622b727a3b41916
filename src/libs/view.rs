use super::models::TodoItem;
use super::formatter::format_datetime;
use crate::orm::sql::Statement;
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn todos(todos: &[TodoItem]) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TITLE", "DESCRIPTION", "EXPIRES", "DONE", "SUB-ITEMS", "CATEGORIES"]);
        for todo in todos {
            table.add_row(row![
                todo.id,
                todo.title,
                todo.description,
                todo.expires_at.map(format_datetime).unwrap_or_default(),
                if todo.is_completed { "yes" } else { "no" },
                todo.sub_items.len(),
                todo.categories.iter().map(|category| category.label.as_str()).collect::<Vec<_>>().join(", ")
            ]);
        }
        table.printstd();
    }

    pub fn statements(statements: &[Statement]) {
        let mut table = Table::new();

        table.add_row(row!["#", "STATEMENT"]);
        for (index, statement) in statements.iter().enumerate() {
            table.add_row(row![index + 1, statement]);
        }
        table.printstd();
    }
}
