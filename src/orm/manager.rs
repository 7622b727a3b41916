//! Entity manager: the public façade over the statement compiler, an
//! [`Executor`] and the row mapper.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use microrm::db::db::Db;
//! use microrm::libs::models::{self, TodoItem};
//! use microrm::orm::manager::EntityManager;
//!
//! let manager = EntityManager::new(Db::open_in_memory()?);
//! manager.initialize(&models::registry())?;
//!
//! let mut todo = TodoItem::new("Buy milk", "2 litres");
//! manager.save(&mut todo)?;
//! let stored = manager.find_by_id::<TodoItem>(todo.id)?;
//! # Ok::<(), microrm::orm::error::OrmError>(())
//! ```

use super::error::{OrmError, Result};
use super::mapper::{map_rows, row_count, MappingContext};
use super::meta::{downcast, Entity, EntityType};
use super::schema::{self, Registry};
use super::sql::{self, Dialect, Filter};
use super::value::Value;
use crate::db::db::{Executor, Row};

pub struct EntityManager<E: Executor> {
    executor: E,
}

impl<E: Executor> EntityManager<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn dialect(&self) -> Dialect {
        self.executor.dialect()
    }

    /// Validates the registry and creates every table it names.
    pub fn initialize(&self, registry: &Registry) -> Result<()> {
        registry.validate()?;
        self.create_tables(registry.types())
    }

    pub fn create_tables(&self, entity_types: &[EntityType]) -> Result<()> {
        for statement in sql::create_tables(entity_types, self.dialect())? {
            self.executor.execute(&statement)?;
        }
        Ok(())
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.executor.execute(&sql::drop_table(name, self.dialect()))?;
        Ok(())
    }

    pub fn drop_tables(&self, entity_types: &[EntityType]) -> Result<()> {
        for statement in sql::drop_tables(entity_types, self.dialect())? {
            self.executor.execute(&statement)?;
        }
        Ok(())
    }

    /// Inserts `entity`, writes the assigned identity back into it, then
    /// links its many-to-many elements.
    ///
    /// Returns `false` when the insert produced no row.
    pub fn save<T: Entity>(&self, entity: &mut T) -> Result<bool> {
        let insert = sql::insert(&*entity, self.dialect())?;
        let rows = self.executor.query(&insert)?;
        let Some(row) = rows.first() else {
            return Ok(false);
        };

        let meta = T::schema();
        let identity = schema::identity_field(&meta)?;
        let id = row
            .get(identity.name)
            .and_then(Value::as_integer)
            .ok_or_else(|| OrmError::MissingColumn(identity.name.to_string()))?;
        entity.set_identity(id)?;

        for statement in sql::insert_join_rows(&*entity, self.dialect())? {
            self.executor.execute(&statement)?;
        }
        Ok(true)
    }

    /// Returns `true` when a stored row was updated.
    pub fn update<T: Entity>(&self, entity: &T) -> Result<bool> {
        let rows = self.executor.query(&sql::update(entity, self.dialect())?)?;
        Ok(!rows.is_empty())
    }

    /// Deletes `entity` and the children listed in its one-to-many fields.
    ///
    /// Children go first so foreign keys never point at a deleted owner.
    /// Returns `true` when the owner's row existed.
    pub fn delete<T: Entity>(&self, entity: &T) -> Result<bool> {
        let mut statements = sql::delete(entity, self.dialect())?;
        let primary = statements.remove(0);

        for cascade in &statements {
            self.executor.execute(cascade)?;
        }
        Ok(!self.executor.query(&primary)?.is_empty())
    }

    pub fn list<T: Entity>(&self) -> Result<Vec<T>> {
        self.fetch(&sql::select(EntityType::of::<T>(), None, None, self.dialect())?)
    }

    pub fn list_by_fields<T: Entity>(&self, filters: &Filter) -> Result<Vec<T>> {
        self.fetch(&sql::select(EntityType::of::<T>(), None, Some(filters), self.dialect())?)
    }

    pub fn find_by_id<T: Entity>(&self, id: i64) -> Result<Option<T>> {
        let meta = T::schema();
        let identity = schema::identity_field(&meta)?;
        self.find_by_fields(&Filter::from([(identity.name.to_string(), Value::Integer(id))]))
    }

    /// First entity matching every filter, if any.
    pub fn find_by_fields<T: Entity>(&self, filters: &Filter) -> Result<Option<T>> {
        Ok(self.list_by_fields(filters)?.into_iter().next())
    }

    pub fn count<T: Entity>(&self, filters: Option<&Filter>) -> Result<u64> {
        let statement = sql::count(EntityType::of::<T>(), filters, self.dialect())?;
        row_count(&statement, &self.executor.query(&statement)?)
    }

    fn fetch<T: Entity>(&self, statement: &sql::Statement) -> Result<Vec<T>> {
        let rows: Vec<Row> = self.executor.query(statement)?;
        map_rows(&MappingContext::new(&self.executor), &rows, EntityType::of::<T>())?
            .into_iter()
            .map(|entity| downcast::<T>(entity).map(|boxed| *boxed))
            .collect()
    }
}
