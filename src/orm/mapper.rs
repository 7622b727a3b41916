//! Result-row mapper.
//!
//! Rebuilds entity instances from result rows. Each field role has its own
//! [`FieldMappingStrategy`]; [`strategy_for`] picks it from the role alone.
//!
//! Mapping runs in two passes per row. Identity, column and to-one fields are
//! filled first, so that when to-many fields are loaded the owner already
//! carries its identity. Loaded children receive a snapshot of the owner as
//! their back-reference, and loading stops one level below the top row.

use super::error::{OrmError, Result};
use super::meta::{ColumnType, Entity, EntityType, FieldDescriptor, FieldRole, RoleKind, ToManyKind};
use super::schema;
use super::sql::{self, Filter, Statement};
use super::value::{FieldValue, Value};
use crate::db::db::{Executor, Row};

/// How deep to-many relations are followed below the top-level row.
pub const MAX_RELATION_DEPTH: usize = 1;

/// State shared by all strategies while one row is mapped.
pub struct MappingContext<'a> {
    pub executor: &'a dyn Executor,
    /// Owner instance when mapping the children of a one-to-many field.
    pub parent: Option<&'a dyn Entity>,
    pub depth: usize,
}

impl<'a> MappingContext<'a> {
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self {
            executor,
            parent: None,
            depth: 0,
        }
    }

    fn nested<'b>(&'b self, parent: Option<&'b dyn Entity>) -> MappingContext<'b> {
        MappingContext {
            executor: self.executor,
            parent,
            depth: self.depth + 1,
        }
    }
}

pub trait FieldMappingStrategy: Sync {
    fn map_field(&self, cx: &MappingContext<'_>, row: &Row, entity: &mut dyn Entity, field: &FieldDescriptor) -> Result<()>;
}

pub struct IdentityStrategy;
pub struct ColumnStrategy;
pub struct ToOneStrategy;
pub struct OneToManyStrategy;
pub struct ManyToManyStrategy;

pub fn strategy_for(role: &FieldRole) -> &'static dyn FieldMappingStrategy {
    match role {
        FieldRole::Identity => &IdentityStrategy,
        FieldRole::Column(_) => &ColumnStrategy,
        FieldRole::ToOne { .. } => &ToOneStrategy,
        FieldRole::ToMany { kind: ToManyKind::OneToMany, .. } => &OneToManyStrategy,
        FieldRole::ToMany { kind: ToManyKind::ManyToMany, .. } => &ManyToManyStrategy,
    }
}

fn column<'r>(row: &'r Row, name: &str) -> Result<&'r Value> {
    row.get(name).ok_or_else(|| OrmError::MissingColumn(name.to_string()))
}

/// Reads the first cell of the first row `statement` returned as a count.
pub(crate) fn row_count(statement: &Statement, rows: &[Row]) -> Result<u64> {
    let value = rows
        .first()
        .and_then(|row| row.value_at(0))
        .ok_or_else(|| OrmError::EmptyResult(statement.to_string()))?;

    match value {
        Value::Integer(count) => u64::try_from(*count).map_err(|_| OrmError::unexpected("row count", count)),
        other => Err(OrmError::unexpected("row count", other)),
    }
}

impl FieldMappingStrategy for IdentityStrategy {
    fn map_field(&self, _cx: &MappingContext<'_>, row: &Row, entity: &mut dyn Entity, field: &FieldDescriptor) -> Result<()> {
        match column(row, field.name)? {
            Value::Integer(id) => entity.write(field.name, FieldValue::Scalar(Value::Integer(*id))),
            other => Err(OrmError::unexpected("integer identity", other)),
        }
    }
}

impl FieldMappingStrategy for ColumnStrategy {
    fn map_field(&self, _cx: &MappingContext<'_>, row: &Row, entity: &mut dyn Entity, field: &FieldDescriptor) -> Result<()> {
        let FieldRole::Column(column_type) = &field.role else {
            return Err(OrmError::unexpected("column field", &field.role));
        };

        let value = column(row, field.name)?;
        // Absent values keep the field's default.
        if value.is_null() {
            return Ok(());
        }

        let converted = match (column_type, value) {
            (ColumnType::DateTime, value) => Value::DateTime(value.parse_datetime()?),
            (ColumnType::Boolean, Value::Integer(number)) => Value::Boolean(*number != 0),
            (ColumnType::Boolean, Value::Boolean(flag)) => Value::Boolean(*flag),
            (ColumnType::Integer, Value::Integer(number)) => Value::Integer(*number),
            (ColumnType::Text | ColumnType::Varchar(_), Value::Text(text)) => Value::Text(text.clone()),
            (_, other) => return Err(OrmError::unexpected(&column_type.to_string(), other)),
        };

        entity.write(field.name, FieldValue::Scalar(converted))
    }
}

impl FieldMappingStrategy for ToOneStrategy {
    fn map_field(&self, cx: &MappingContext<'_>, row: &Row, entity: &mut dyn Entity, field: &FieldDescriptor) -> Result<()> {
        let FieldRole::ToOne { target, .. } = &field.role else {
            return Err(OrmError::unexpected("to-one field", &field.role));
        };

        // Children point back at the owner that is loading them.
        if let Some(parent) = cx.parent.filter(|parent| parent.entity_type() == *target) {
            return entity.write(field.name, FieldValue::One(Some(parent.clone_entity())));
        }

        match column(row, &schema::column_name(field))? {
            Value::Null => Ok(()),
            Value::Integer(id) => {
                let mut related = target.meta().instantiate();
                related.set_identity(*id)?;
                entity.write(field.name, FieldValue::One(Some(related)))
            }
            other => Err(OrmError::unexpected("related identity", other)),
        }
    }
}

impl FieldMappingStrategy for OneToManyStrategy {
    fn map_field(&self, cx: &MappingContext<'_>, _row: &Row, entity: &mut dyn Entity, field: &FieldDescriptor) -> Result<()> {
        let FieldRole::ToMany { element, .. } = &field.role else {
            return Err(OrmError::unexpected("to-many field", &field.role));
        };
        if cx.depth >= MAX_RELATION_DEPTH {
            return Ok(());
        }

        let owner = entity.entity_type();
        let dialect = cx.executor.dialect();
        let filters = Filter::from([(schema::back_reference(owner, *element)?.to_string(), Value::Integer(entity.identity()?))]);

        let count = sql::count(*element, Some(&filters), dialect)?;
        if row_count(&count, &cx.executor.query(&count)?)? == 0 {
            return entity.write(field.name, FieldValue::Many(Vec::new()));
        }

        let select = sql::select(*element, None, Some(&filters), dialect)?;
        let rows = cx.executor.query(&select)?;
        let snapshot = entity.clone_entity();
        let children = map_rows(&cx.nested(Some(snapshot.as_ref())), &rows, *element)?;

        entity.write(field.name, FieldValue::Many(children))
    }
}

impl FieldMappingStrategy for ManyToManyStrategy {
    fn map_field(&self, cx: &MappingContext<'_>, _row: &Row, entity: &mut dyn Entity, field: &FieldDescriptor) -> Result<()> {
        let FieldRole::ToMany { element, .. } = &field.role else {
            return Err(OrmError::unexpected("to-many field", &field.role));
        };
        if cx.depth >= MAX_RELATION_DEPTH {
            return Ok(());
        }

        let owner = entity.entity_type();
        let owner_id = entity.identity()?;
        let dialect = cx.executor.dialect();

        let count = sql::count_related(owner, *element, owner_id, dialect)?;
        if row_count(&count, &cx.executor.query(&count)?)? == 0 {
            return entity.write(field.name, FieldValue::Many(Vec::new()));
        }

        let select = sql::select_related(owner, *element, owner_id, dialect)?;
        let rows = cx.executor.query(&select)?;
        let related = map_rows(&cx.nested(None), &rows, *element)?;

        entity.write(field.name, FieldValue::Many(related))
    }
}

/// Builds one instance of `entity_type` from `row`.
pub fn map_row(cx: &MappingContext<'_>, row: &Row, entity_type: EntityType) -> Result<Box<dyn Entity>> {
    let meta = entity_type.meta();
    schema::validate(&meta)?;
    let mut entity = meta.instantiate();

    let (relations, direct): (Vec<_>, Vec<_>) = meta.fields.iter().partition(|field| field.kind() == RoleKind::ToMany);

    for field in direct.into_iter().chain(relations) {
        strategy_for(&field.role)
            .map_field(cx, row, entity.as_mut(), field)
            .map_err(|error| error.in_field(meta.name, field.name))?;
    }

    Ok(entity)
}

pub fn map_rows(cx: &MappingContext<'_>, rows: &[Row], entity_type: EntityType) -> Result<Vec<Box<dyn Entity>>> {
    rows.iter().map(|row| map_row(cx, row, entity_type)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_entity;
    use crate::orm::sql::Statement;
    use chrono::NaiveDate;
    use chrono::NaiveDateTime;

    #[derive(Debug, Clone, Default)]
    struct Event {
        id: i64,
        name: String,
        starts_at: Option<NaiveDateTime>,
        public: bool,
    }

    impl_entity!(Event {
        id: identity,
        name: column(ColumnType::varchar()),
        starts_at: column(ColumnType::DateTime),
        public: column(ColumnType::Boolean),
    });

    struct NoDatabase;

    impl Executor for NoDatabase {
        fn execute(&self, statement: &Statement) -> Result<usize> {
            panic!("unexpected statement {}", statement)
        }

        fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
            panic!("unexpected query {}", statement)
        }
    }

    fn event(entity: Box<dyn Entity>) -> Event {
        *crate::orm::meta::downcast::<Event>(entity).unwrap()
    }

    #[test]
    fn test_scalar_conversions() {
        let row = Row::new()
            .with("id", 3)
            .with("name", "launch")
            .with("starts_at", "2024-01-02 03:04:05")
            .with("public", 1);

        let mapped = event(map_row(&MappingContext::new(&NoDatabase), &row, EntityType::of::<Event>()).unwrap());
        assert_eq!(mapped.id, 3);
        assert_eq!(mapped.name, "launch");
        assert_eq!(mapped.starts_at, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5));
        assert!(mapped.public);
    }

    #[test]
    fn test_null_keeps_default() {
        let row = Row::new().with("id", 1).with("name", Value::Null).with("starts_at", Value::Null).with("public", 0);

        let mapped = event(map_row(&MappingContext::new(&NoDatabase), &row, EntityType::of::<Event>()).unwrap());
        assert_eq!(mapped.name, "");
        assert_eq!(mapped.starts_at, None);
        assert!(!mapped.public);
    }

    #[test]
    fn test_missing_column_names_field() {
        let row = Row::new().with("id", 1).with("name", "x").with("public", 0);

        let error = map_row(&MappingContext::new(&NoDatabase), &row, EntityType::of::<Event>()).unwrap_err();
        match error {
            OrmError::Mapping { field, source, .. } => {
                assert_eq!(field, "starts_at");
                assert!(matches!(*source, OrmError::MissingColumn(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bad_datetime_is_mapping_error() {
        let row = Row::new().with("id", 1).with("name", "x").with("starts_at", "soon").with("public", 0);

        let error = map_row(&MappingContext::new(&NoDatabase), &row, EntityType::of::<Event>()).unwrap_err();
        assert_eq!(error.kind(), crate::orm::error::ErrorKind::Mapping);
    }
}
