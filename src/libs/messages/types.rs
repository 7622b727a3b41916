#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigFileNotFound,
    ConfigUsingDefaults,

    // === DATABASE MESSAGES ===
    DatabaseOpened(String), // path
    TablesCreated(usize),
    TablesDropped(usize),
    TablesToBeDropped,
    ConfirmDropTables(usize),
    UnknownEntity(String),
    NoEntitiesSelected,
    OperationCancelled,

    // === SCHEMA MESSAGES ===
    SchemaHeader(String), // dialect

    // === ENTITY MESSAGES ===
    EntitySaved(String, i64),   // entity, id
    EntityUpdated(String, i64), // entity, id
    EntityDeleted(String, i64), // entity, id
    EntityNotFound(String, i64),
    EntityNotSaved(String),
    EntitiesCounted(String, u64),

    // === DEMO MESSAGES ===
    TodoItemsHeader,
    NoTodoItems,
    SubItemsOf(String), // todo title
    DemoFinished,

    // === PROMPTS ===
    PromptDatabase,
    PromptDialect,
    PromptForeignKeys,
}
