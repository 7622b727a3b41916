//! Statement compiler.
//!
//! Turns entity metadata plus an instance (or a filter map) into SQL text.
//! Every statement is produced in two renderings:
//!
//! - `sql` with positional placeholders (`?N` for SQLite, `$N` for Postgres)
//!   and the matching parameter list, which is what gets executed
//! - `literal` with every value inlined, which is what gets logged and what
//!   [`Statement`]'s `Display` prints
//!
//! Both renderings have the same shape. Literal formatting rules:
//!
//! | Declared type      | Literal                          |
//! |--------------------|----------------------------------|
//! | TEXT / VARCHAR     | `'text'` (quotes doubled)        |
//! | INTEGER / identity | `42`                             |
//! | BOOLEAN            | `1` or `0`                       |
//! | DATETIME           | `datetime(<epoch>, 'unixepoch')` |
//! | to-one relation    | identity of the related instance |
//! | absent value       | `NULL`                           |

use super::error::{OrmError, Result};
use super::meta::{ColumnType, Entity, EntityMeta, EntityType, FieldDescriptor, FieldRole, RoleKind, ToManyKind};
use super::schema;
use super::value::{FieldRef, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Equality conditions joined with `AND`, in insertion order.
pub type Filter = IndexMap<String, Value>;

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn identity_column(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "SERIAL PRIMARY KEY",
        }
    }

    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{}", index),
            Dialect::Postgres => format!("${}", index),
        }
    }

    /// Expression converting unix epoch seconds into a stored datetime.
    pub fn datetime_expr(&self, epoch: &str) -> String {
        match self {
            Dialect::Sqlite => format!("datetime({}, 'unixepoch')", epoch),
            Dialect::Postgres => format!("to_timestamp({})", epoch),
        }
    }

    fn drop_suffix(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "",
            Dialect::Postgres => " CASCADE",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// One compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
    literal: String,
}

impl Statement {
    /// Statement without parameters, e.g. hand-written DDL.
    pub fn plain(text: String) -> Self {
        Self {
            sql: text.clone(),
            params: Vec::new(),
            literal: text,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}

struct StatementBuilder {
    dialect: Dialect,
    sql: String,
    literal: String,
    params: Vec<Value>,
}

impl StatementBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            literal: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self.literal.push_str(text);
        self
    }

    fn bind(&mut self, param: Value, literal: String) {
        self.params.push(param);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self.literal.push_str(&literal);
    }

    fn integer(&mut self, value: i64) {
        self.bind(Value::Integer(value), value.to_string());
    }

    fn datetime(&mut self, epoch: i64) {
        self.params.push(Value::Integer(epoch));
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&self.dialect.datetime_expr(&placeholder));
        self.literal.push_str(&self.dialect.datetime_expr(&epoch.to_string()));
    }

    /// Renders `value` for `field`, rejecting values its role cannot hold.
    fn value(&mut self, meta: &EntityMeta, field: &FieldDescriptor, value: &Value) -> Result<()> {
        match (&field.role, value) {
            (_, Value::Null) => {
                self.push("NULL");
            }
            (FieldRole::Identity, Value::Integer(id)) | (FieldRole::ToOne { .. }, Value::Integer(id)) => self.integer(*id),
            (FieldRole::Column(ColumnType::Integer), Value::Integer(number)) => self.integer(*number),
            (FieldRole::Column(ColumnType::Boolean), Value::Boolean(flag)) => self.integer(i64::from(*flag)),
            (FieldRole::Column(ColumnType::Boolean), Value::Integer(number)) => self.integer(i64::from(*number != 0)),
            (FieldRole::Column(ColumnType::Text | ColumnType::Varchar(_)), Value::Text(text)) => {
                self.bind(Value::Text(text.clone()), quote(text));
            }
            (FieldRole::Column(ColumnType::DateTime), Value::DateTime(moment)) => self.datetime(moment.and_utc().timestamp()),
            _ => return Err(incompatible(meta, field, value)),
        }
        Ok(())
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
            literal: self.literal,
        }
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn expected_for(role: &FieldRole) -> String {
    match role {
        FieldRole::Identity => "INTEGER identity".to_string(),
        FieldRole::Column(column_type) => column_type.to_string(),
        FieldRole::ToOne { target, .. } => format!("identity of {}", target.name()),
        FieldRole::ToMany { element, .. } => format!("collection of {}", element.name()),
    }
}

fn incompatible(meta: &EntityMeta, field: &FieldDescriptor, value: impl fmt::Debug) -> OrmError {
    OrmError::IncompatibleValue {
        entity: meta.name.to_string(),
        field: field.name.to_string(),
        expected: expected_for(&field.role),
        value: format!("{:?}", value),
    }
}

fn scalar_of(entity: &dyn Entity, meta: &EntityMeta, field: &FieldDescriptor) -> Result<Value> {
    match entity.read(field.name)? {
        FieldRef::Scalar(value) => Ok(value),
        other => Err(incompatible(meta, field, other)),
    }
}

fn related_id(entity: &dyn Entity, meta: &EntityMeta, field: &FieldDescriptor) -> Result<Value> {
    match entity.read(field.name)? {
        FieldRef::One(None) | FieldRef::Scalar(Value::Null) => Ok(Value::Null),
        FieldRef::One(Some(related)) => match related.identity()? {
            0 => Err(OrmError::UnsavedRelation {
                entity: meta.name.to_string(),
                field: field.name.to_string(),
            }),
            id => Ok(Value::Integer(id)),
        },
        other => Err(incompatible(meta, field, other)),
    }
}

fn related_items<'e>(entity: &'e dyn Entity, meta: &EntityMeta, field: &FieldDescriptor) -> Result<Vec<&'e dyn Entity>> {
    match entity.read(field.name)? {
        FieldRef::Many(items) => Ok(items),
        FieldRef::Scalar(Value::Null) => Ok(Vec::new()),
        other => Err(incompatible(meta, field, other)),
    }
}

fn assigned_identity(entity: &dyn Entity, meta: &EntityMeta) -> Result<i64> {
    match entity.identity()? {
        0 => Err(OrmError::UnassignedIdentity(meta.name.to_string())),
        id => Ok(id),
    }
}

/// Values stored in the entity's own row, in declaration order.
///
/// One-to-many fields have no column; many-to-many fields keep a placeholder
/// column that is always `NULL`. An identity of `0` is left out.
fn row_values(entity: &dyn Entity, meta: &EntityMeta, with_identity: bool) -> Result<Vec<(FieldDescriptor, Value)>> {
    let excluded: &[RoleKind] = if with_identity { &[] } else { &[RoleKind::Identity] };
    let mut values = Vec::new();

    for field in schema::fields_excluding(meta.entity_type(), excluded) {
        let value = match &field.role {
            FieldRole::Identity => match entity.identity()? {
                0 => continue,
                id => Value::Integer(id),
            },
            FieldRole::Column(_) => scalar_of(entity, meta, &field)?,
            FieldRole::ToOne { .. } => related_id(entity, meta, &field)?,
            FieldRole::ToMany { kind: ToManyKind::OneToMany, .. } => continue,
            FieldRole::ToMany { kind: ToManyKind::ManyToMany, .. } => Value::Null,
        };
        values.push((field, value));
    }

    Ok(values)
}

fn stored_field<'m>(meta: &'m EntityMeta, key: &str) -> Result<&'m FieldDescriptor> {
    let field = schema::resolve_field(meta, key)?;
    if field.kind() == RoleKind::ToMany {
        return Err(incompatible(meta, field, key));
    }
    Ok(field)
}

fn where_clause(builder: &mut StatementBuilder, meta: &EntityMeta, filters: Option<&Filter>) -> Result<()> {
    let Some(filters) = filters.filter(|filters| !filters.is_empty()) else {
        return Ok(());
    };

    builder.push(" WHERE ");
    for (index, (key, value)) in filters.iter().enumerate() {
        if index > 0 {
            builder.push(" AND ");
        }
        let field = stored_field(meta, key)?;
        let column = schema::column_name(field);
        if value.is_null() {
            builder.push(&format!("{} IS NULL", column));
        } else {
            builder.push(&format!("{}=", column));
            builder.value(meta, field, value)?;
        }
    }
    Ok(())
}

/// `CREATE TABLE` for one entity, followed by one join table per
/// many-to-many field.
pub fn create_table(entity_type: EntityType, dialect: Dialect) -> Result<Vec<Statement>> {
    let meta = entity_type.meta();
    schema::validate(&meta)?;
    let table = meta.table_name();

    let mut columns = Vec::new();
    let mut statements = Vec::new();

    for field in &meta.fields {
        match &field.role {
            FieldRole::Identity => columns.push(format!("{} {}", field.name, dialect.identity_column())),
            FieldRole::Column(column_type) => columns.push(format!("{} {}", field.name, column_type.sql_type())),
            FieldRole::ToOne { .. } => columns.push(format!("{} INTEGER", schema::column_name(field))),
            FieldRole::ToMany { kind: ToManyKind::OneToMany, .. } => {}
            FieldRole::ToMany { kind: ToManyKind::ManyToMany, element } => {
                columns.push(format!("{} INTEGER", field.name));
                statements.push(create_join_table(&meta, &element.meta())?);
            }
        }
    }

    let mut constraints = Vec::new();
    for field in schema::fields_only(entity_type, &[RoleKind::ToOne]) {
        let FieldRole::ToOne { target, .. } = &field.role else {
            continue;
        };
        let target_meta = target.meta();
        let target_identity = schema::identity_field(&target_meta)?;
        constraints.push(format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            schema::column_name(&field),
            target_meta.table_name(),
            target_identity.name
        ));
    }

    columns.extend(constraints);
    statements.insert(0, Statement::plain(format!("CREATE TABLE {} ({});", table, columns.join(", "))));
    Ok(statements)
}

fn create_join_table(owner: &EntityMeta, related: &EntityMeta) -> Result<Statement> {
    let owner_table = owner.table_name();
    let related_table = related.table_name();
    let owner_identity = schema::identity_field(owner)?;
    let related_identity = schema::identity_field(related)?;

    Ok(Statement::plain(format!(
        "CREATE TABLE {join} ({o}_id INTEGER, {r}_id INTEGER, FOREIGN KEY ({o}_id) REFERENCES {o}({oid}), FOREIGN KEY ({r}_id) REFERENCES {r}({rid}));",
        join = schema::join_table(owner, related),
        o = owner_table,
        r = related_table,
        oid = owner_identity.name,
        rid = related_identity.name,
    )))
}

pub fn create_tables(entity_types: &[EntityType], dialect: Dialect) -> Result<Vec<Statement>> {
    if entity_types.is_empty() {
        return Err(OrmError::NoEntities);
    }

    let mut statements = Vec::new();
    for entity_type in entity_types {
        statements.extend(create_table(*entity_type, dialect)?);
    }
    Ok(statements)
}

pub fn drop_table(name: &str, dialect: Dialect) -> Statement {
    Statement::plain(format!("DROP TABLE IF EXISTS {}{};", name.to_lowercase(), dialect.drop_suffix()))
}

/// Drops every listed table.
///
/// Join tables go first, then the entity tables in reverse order, so tables
/// registered after the ones they reference are dropped before them.
pub fn drop_tables(entity_types: &[EntityType], dialect: Dialect) -> Result<Vec<Statement>> {
    if entity_types.is_empty() {
        return Err(OrmError::NoEntities);
    }

    let mut statements = Vec::new();
    for entity_type in entity_types {
        let meta = entity_type.meta();
        for field in &meta.fields {
            if let FieldRole::ToMany { kind: ToManyKind::ManyToMany, element } = &field.role {
                statements.push(drop_table(&schema::join_table(&meta, &element.meta()), dialect));
            }
        }
    }
    for entity_type in entity_types.iter().rev() {
        statements.push(drop_table(&entity_type.table_name(), dialect));
    }
    Ok(statements)
}

/// `INSERT ... RETURNING *` for the entity's own row.
pub fn insert(entity: &dyn Entity, dialect: Dialect) -> Result<Statement> {
    let meta = entity.entity_type().meta();
    schema::validate(&meta)?;
    let table = meta.table_name();
    let values = row_values(entity, &meta, true)?;

    let mut builder = StatementBuilder::new(dialect);
    if values.is_empty() {
        builder.push(&format!("INSERT INTO {} DEFAULT VALUES RETURNING *;", table));
        return Ok(builder.finish());
    }

    let columns: Vec<String> = values.iter().map(|(field, _)| schema::column_name(field)).collect();
    builder.push(&format!("INSERT INTO {} ({}) VALUES (", table, columns.join(", ")));
    for (index, (field, value)) in values.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.value(&meta, field, value)?;
    }
    builder.push(") RETURNING *;");

    Ok(builder.finish())
}

/// One join-table insert per element of every many-to-many field.
///
/// Requires the owner to carry its assigned identity.
pub fn insert_join_rows(entity: &dyn Entity, dialect: Dialect) -> Result<Vec<Statement>> {
    let meta = entity.entity_type().meta();
    let mut statements = Vec::new();

    for field in &meta.fields {
        let FieldRole::ToMany { kind: ToManyKind::ManyToMany, element } = &field.role else {
            continue;
        };
        let items = related_items(entity, &meta, field)?;
        if items.is_empty() {
            continue;
        }

        let owner_id = assigned_identity(entity, &meta)?;
        let related = element.meta();
        let join = schema::join_table(&meta, &related);

        for item in items {
            let related_id = match item.identity()? {
                0 => {
                    return Err(OrmError::UnsavedRelation {
                        entity: meta.name.to_string(),
                        field: field.name.to_string(),
                    })
                }
                id => id,
            };

            let mut builder = StatementBuilder::new(dialect);
            builder.push(&format!("INSERT INTO {} ({}_id, {}_id) VALUES (", join, meta.table_name(), related.table_name()));
            builder.integer(owner_id);
            builder.push(", ");
            builder.integer(related_id);
            builder.push(");");
            statements.push(builder.finish());
        }
    }

    Ok(statements)
}

/// The entity's insert followed by its join-table inserts.
pub fn insert_all(entity: &dyn Entity, dialect: Dialect) -> Result<Vec<Statement>> {
    let mut statements = vec![insert(entity, dialect)?];
    statements.extend(insert_join_rows(entity, dialect)?);
    Ok(statements)
}

/// `SELECT` with an optional projection and optional equality filters.
pub fn select(entity_type: EntityType, projection: Option<&[&str]>, filters: Option<&Filter>, dialect: Dialect) -> Result<Statement> {
    let meta = entity_type.meta();
    schema::validate(&meta)?;

    let columns = match projection {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| stored_field(&meta, name).map(schema::column_name))
            .collect::<Result<Vec<_>>>()?
            .join(", "),
        _ => "*".to_string(),
    };

    let mut builder = StatementBuilder::new(dialect);
    builder.push(&format!("SELECT {} FROM {}", columns, meta.table_name()));
    where_clause(&mut builder, &meta, filters)?;
    builder.push(";");
    Ok(builder.finish())
}

pub fn count(entity_type: EntityType, filters: Option<&Filter>, dialect: Dialect) -> Result<Statement> {
    let meta = entity_type.meta();
    schema::validate(&meta)?;

    let mut builder = StatementBuilder::new(dialect);
    builder.push(&format!("SELECT COUNT(*) FROM {}", meta.table_name()));
    where_clause(&mut builder, &meta, filters)?;
    builder.push(";");
    Ok(builder.finish())
}

/// `UPDATE ... RETURNING *` keyed by the identity field.
pub fn update(entity: &dyn Entity, dialect: Dialect) -> Result<Statement> {
    let meta = entity.entity_type().meta();
    schema::validate(&meta)?;
    let identity = schema::identity_field(&meta)?;
    let id = assigned_identity(entity, &meta)?;
    let values = row_values(entity, &meta, false)?;
    if values.is_empty() {
        return Err(OrmError::NoFields(meta.name.to_string()));
    }

    let mut builder = StatementBuilder::new(dialect);
    builder.push(&format!("UPDATE {} SET ", meta.table_name()));
    for (index, (field, value)) in values.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push(&format!("{}=", schema::column_name(field)));
        builder.value(&meta, field, value)?;
    }
    builder.push(&format!(" WHERE {}=", identity.name));
    builder.integer(id);
    builder.push(" RETURNING *;");

    Ok(builder.finish())
}

/// Delete of the entity's row, followed by one cascade delete per non-empty
/// one-to-many field and one link cleanup per non-empty many-to-many field.
pub fn delete(entity: &dyn Entity, dialect: Dialect) -> Result<Vec<Statement>> {
    let entity_type = entity.entity_type();
    let meta = entity_type.meta();
    schema::validate(&meta)?;
    let identity = schema::identity_field(&meta)?;
    let id = assigned_identity(entity, &meta)?;

    let mut builder = StatementBuilder::new(dialect);
    builder.push(&format!("DELETE FROM {} WHERE {}=", meta.table_name(), identity.name));
    builder.integer(id);
    builder.push(" RETURNING *;");
    let mut statements = vec![builder.finish()];

    for field in &meta.fields {
        let FieldRole::ToMany { kind, element } = &field.role else {
            continue;
        };
        if related_items(entity, &meta, field)?.is_empty() {
            continue;
        }

        let mut builder = StatementBuilder::new(dialect);
        match kind {
            ToManyKind::OneToMany => {
                builder.push(&format!(
                    "DELETE FROM {} WHERE {}=",
                    element.table_name(),
                    schema::back_reference_column(entity_type, *element)?
                ));
                builder.integer(id);
                builder.push(" RETURNING *;");
            }
            // Only the links go; the related rows are shared with other owners.
            ToManyKind::ManyToMany => {
                builder.push(&format!("DELETE FROM {} WHERE {}_id=", schema::join_table(&meta, &element.meta()), meta.table_name()));
                builder.integer(id);
                builder.push(";");
            }
        }
        statements.push(builder.finish());
    }

    Ok(statements)
}

/// Number of join rows linking `owner_id` to `related`.
pub fn count_related(owner: EntityType, related: EntityType, owner_id: i64, dialect: Dialect) -> Result<Statement> {
    let owner_meta = owner.meta();
    let related_meta = related.meta();

    let mut builder = StatementBuilder::new(dialect);
    builder.push(&format!(
        "SELECT COUNT(*) FROM {} WHERE {}_id=",
        schema::join_table(&owner_meta, &related_meta),
        owner_meta.table_name()
    ));
    builder.integer(owner_id);
    builder.push(";");
    Ok(builder.finish())
}

/// Rows of `related` linked to `owner_id` through the join table.
pub fn select_related(owner: EntityType, related: EntityType, owner_id: i64, dialect: Dialect) -> Result<Statement> {
    let owner_meta = owner.meta();
    let related_meta = related.meta();
    let related_identity = schema::identity_field(&related_meta)?;

    let mut builder = StatementBuilder::new(dialect);
    builder.push(&format!(
        "SELECT * FROM {r} WHERE {rid} IN (SELECT {r}_id FROM {join} WHERE {o}_id=",
        r = related_meta.table_name(),
        rid = related_identity.name,
        join = schema::join_table(&owner_meta, &related_meta),
        o = owner_meta.table_name(),
    ));
    builder.integer(owner_id);
    builder.push(");");
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_entity;

    #[derive(Debug, Clone, Default)]
    struct Note {
        id: i64,
        body: String,
        pinned: bool,
    }

    impl_entity!(Note {
        id: identity,
        body: column(ColumnType::Text),
        pinned: column(ColumnType::Boolean),
    });

    #[test]
    fn test_placeholders_follow_dialect() {
        let note = Note {
            id: 0,
            body: "hello".to_string(),
            pinned: true,
        };

        let sqlite = insert(&note, Dialect::Sqlite).unwrap();
        assert_eq!(sqlite.sql(), "INSERT INTO note (body, pinned) VALUES (?1, ?2) RETURNING *;");
        assert_eq!(sqlite.params(), &[Value::Text("hello".to_string()), Value::Integer(1)]);

        let postgres = insert(&note, Dialect::Postgres).unwrap();
        assert_eq!(postgres.sql(), "INSERT INTO note (body, pinned) VALUES ($1, $2) RETURNING *;");
        assert_eq!(postgres.literal(), sqlite.literal());
    }

    #[test]
    fn test_quotes_are_doubled() {
        let note = Note {
            id: 0,
            body: "it's".to_string(),
            pinned: false,
        };
        let statement = insert(&note, Dialect::Sqlite).unwrap();
        assert_eq!(statement.to_string(), "INSERT INTO note (body, pinned) VALUES ('it''s', 0) RETURNING *;");
        assert_eq!(statement.params()[0], Value::Text("it's".to_string()));
    }

    #[test]
    fn test_filter_type_mismatch() {
        let filters = Filter::from([("pinned".to_string(), Value::Text("yes".to_string()))]);
        let result = select(EntityType::of::<Note>(), None, Some(&filters), Dialect::Sqlite);
        assert!(matches!(result, Err(OrmError::IncompatibleValue { .. })));
    }

    #[test]
    fn test_projection() {
        let statement = select(EntityType::of::<Note>(), Some(&["id", "body"]), None, Dialect::Sqlite).unwrap();
        assert_eq!(statement.to_string(), "SELECT id, body FROM note;");
    }

    #[test]
    fn test_drop_suffix() {
        assert_eq!(drop_table("Note", Dialect::Sqlite).to_string(), "DROP TABLE IF EXISTS note;");
        assert_eq!(drop_table("Note", Dialect::Postgres).to_string(), "DROP TABLE IF EXISTS note CASCADE;");
    }

    #[test]
    fn test_update_requires_identity() {
        let note = Note::default();
        assert!(matches!(update(&note, Dialect::Sqlite), Err(OrmError::UnassignedIdentity(_))));
    }
}
