pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;

#[cfg(test)]
mod tests {
    use super::Message;

    #[test]
    fn test_parameterized_messages() {
        assert_eq!(Message::EntitySaved("TodoItem".to_string(), 4).to_string(), "TodoItem #4 saved");
        assert_eq!(Message::TablesCreated(3).to_string(), "Created 3 table(s)");
    }
}
