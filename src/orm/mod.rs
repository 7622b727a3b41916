//! Mapper core.
//!
//! - [`meta`]: entity descriptions and the [`impl_entity!`](crate::impl_entity) macro
//! - [`value`]: scalar values and field access
//! - [`schema`]: field classification, validation, the entity [`schema::Registry`]
//! - [`sql`]: statement compiler for SQLite and Postgres
//! - [`mapper`]: per-role strategies turning rows back into entities
//! - [`manager`]: the [`manager::EntityManager`] façade
//! - [`error`]: the [`error::OrmError`] taxonomy

pub mod error;
pub mod manager;
pub mod mapper;
pub mod meta;
pub mod schema;
pub mod sql;
pub mod value;

pub use error::{OrmError, Result};
pub use manager::EntityManager;
pub use meta::{ColumnType, Entity, EntityType};
pub use sql::{Dialect, Filter, Statement};
pub use value::Value;
