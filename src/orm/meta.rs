//! Declarative entity metadata.
//!
//! An entity is a plain struct whose fields are each given exactly one role
//! when the type is registered: identity, column, to-one relation or to-many
//! relation. The role is a closed sum type ([`FieldRole`]) chosen once, so a
//! field can never carry conflicting or unrecognized metadata.
//!
//! ## Usage
//!
//! ```rust
//! use microrm::impl_entity;
//! use microrm::orm::meta::ColumnType;
//!
//! #[derive(Debug, Clone, Default)]
//! pub struct Todo {
//!     pub id: i64,
//!     pub title: String,
//!     pub done: bool,
//! }
//!
//! impl_entity!(Todo {
//!     id: identity,
//!     title: column(ColumnType::Text),
//!     done: column(ColumnType::Boolean),
//! });
//! ```

use super::error::{OrmError, Result};
use super::schema;
use super::value::{FieldRef, FieldValue, Value};
use std::any::{Any, TypeId};
use std::fmt;

/// Storage type of a plain column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Varchar(u32),
    Text,
    Integer,
    Boolean,
    /// Stored as ISO-8601 text, written through `datetime(<epoch>, 'unixepoch')`.
    DateTime,
}

impl ColumnType {
    pub const DEFAULT_VARCHAR_SIZE: u32 = 64;

    pub fn varchar() -> Self {
        ColumnType::Varchar(Self::DEFAULT_VARCHAR_SIZE)
    }

    /// Column type used in `CREATE TABLE`.
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Varchar(size) => format!("VARCHAR ({})", size),
            ColumnType::Text | ColumnType::DateTime => "TEXT".to_string(),
            ColumnType::Integer | ColumnType::Boolean => "INTEGER".to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Varchar(size) => write!(f, "VARCHAR({})", size),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
            ColumnType::DateTime => write!(f, "DATETIME"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToOneKind {
    OneToOne,
    ManyToOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToManyKind {
    OneToMany,
    ManyToMany,
}

/// The single role a field plays in its entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRole {
    Identity,
    Column(ColumnType),
    ToOne { kind: ToOneKind, target: EntityType },
    ToMany { kind: ToManyKind, element: EntityType },
}

/// Role discriminant without payload, used to filter field lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Identity,
    Column,
    ToOne,
    ToMany,
}

impl FieldRole {
    pub fn kind(&self) -> RoleKind {
        match self {
            FieldRole::Identity => RoleKind::Identity,
            FieldRole::Column(_) => RoleKind::Column,
            FieldRole::ToOne { .. } => RoleKind::ToOne,
            FieldRole::ToMany { .. } => RoleKind::ToMany,
        }
    }
}

/// One declared field: its name and its role.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub role: FieldRole,
}

impl FieldDescriptor {
    pub fn identity(name: &'static str) -> Self {
        Self { name, role: FieldRole::Identity }
    }

    pub fn column(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            role: FieldRole::Column(column_type),
        }
    }

    pub fn one_to_one<T: Entity>(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::ToOne {
                kind: ToOneKind::OneToOne,
                target: EntityType::of::<T>(),
            },
        }
    }

    pub fn many_to_one<T: Entity>(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::ToOne {
                kind: ToOneKind::ManyToOne,
                target: EntityType::of::<T>(),
            },
        }
    }

    pub fn one_to_many<T: Entity>(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::ToMany {
                kind: ToManyKind::OneToMany,
                element: EntityType::of::<T>(),
            },
        }
    }

    pub fn many_to_many<T: Entity>(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::ToMany {
                kind: ToManyKind::ManyToMany,
                element: EntityType::of::<T>(),
            },
        }
    }

    pub fn kind(&self) -> RoleKind {
        self.role.kind()
    }

    pub fn column_name(&self) -> String {
        schema::column_name(self)
    }
}

/// Full description of one entity type.
#[derive(Clone)]
pub struct EntityMeta {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
    entity_type: EntityType,
    construct: fn() -> Box<dyn Entity>,
}

fn construct<T: Entity + Default>() -> Box<dyn Entity> {
    Box::new(T::default())
}

impl EntityMeta {
    pub fn new<T: Entity + Default>(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name,
            fields,
            entity_type: EntityType::of::<T>(),
            construct: construct::<T>,
        }
    }

    /// Handle of the type this metadata describes.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Lower-cased type name.
    pub fn table_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn identity(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.kind() == RoleKind::Identity)
    }

    /// Creates a blank instance through the type's parameterless constructor.
    pub fn instantiate(&self) -> Box<dyn Entity> {
        (self.construct)()
    }
}

impl fmt::Debug for EntityMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMeta").field("name", &self.name).field("fields", &self.fields).finish()
    }
}

/// Copyable handle to an entity type.
///
/// The metadata is derived again on every [`EntityType::meta`] call; nothing
/// is cached between statements. Two handles are equal only when they
/// refer to the same Rust type, whatever its name.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    describe: fn() -> EntityMeta,
}

impl EntityType {
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            describe: T::schema,
        }
    }

    pub fn meta(&self) -> EntityMeta {
        (self.describe)()
    }

    pub fn name(&self) -> &'static str {
        self.meta().name
    }

    pub fn table_name(&self) -> String {
        self.meta().table_name()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name())
    }
}

/// Object plumbing every entity gets for free from `Clone + 'static`.
pub trait EntityObject {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_entity(&self) -> Box<dyn Entity>;
}

impl<T: Entity + Clone> EntityObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_entity(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }
}

/// A persistable type.
///
/// Implement it with [`impl_entity!`](crate::impl_entity) rather than by hand.
pub trait Entity: EntityObject + fmt::Debug + 'static {
    /// Field descriptors in declaration order.
    fn schema() -> EntityMeta
    where
        Self: Sized;

    fn entity_type(&self) -> EntityType;

    fn read(&self, field: &str) -> Result<FieldRef<'_>>;

    fn write(&mut self, field: &str, value: FieldValue) -> Result<()>;

    /// Current identity value; `0` means the instance has not been saved.
    fn identity(&self) -> Result<i64> {
        let meta = self.entity_type().meta();
        let field = schema::identity_field(&meta)?;

        match self.read(field.name)? {
            FieldRef::Scalar(Value::Integer(id)) => Ok(id),
            FieldRef::Scalar(Value::Null) => Ok(0),
            other => Err(OrmError::unexpected("integer identity", other)),
        }
    }

    fn set_identity(&mut self, id: i64) -> Result<()> {
        let meta = self.entity_type().meta();
        let field = schema::identity_field(&meta)?;
        self.write(field.name, FieldValue::Scalar(Value::Integer(id)))
    }
}

/// Recovers a concrete entity from a type-erased one.
pub fn downcast<T: Entity>(entity: Box<dyn Entity>) -> Result<Box<T>> {
    let found = entity.entity_type().name().to_string();
    entity.into_any().downcast::<T>().map_err(|_| OrmError::Downcast {
        expected: EntityType::of::<T>().name().to_string(),
        found,
    })
}

/// Implements [`Entity`] for a struct from a list of `field: role` pairs.
///
/// Roles: `identity`, `column(<ColumnType>)`, `one_to_one<T>`,
/// `many_to_one<T>`, `one_to_many<T>`, `many_to_many<T>`.
/// The struct must implement `Clone`, `Debug` and `Default`.
#[macro_export]
macro_rules! impl_entity {
    ($ty:ident { $( $field:ident : $role:ident $(<$target:ty>)? $(($arg:expr))? ),+ $(,)? }) => {
        impl $crate::orm::meta::Entity for $ty {
            fn schema() -> $crate::orm::meta::EntityMeta {
                $crate::orm::meta::EntityMeta::new::<$ty>(
                    stringify!($ty),
                    vec![$( $crate::orm::meta::FieldDescriptor::$role $(::<$target>)? (stringify!($field) $(, $arg)?) ),+],
                )
            }

            fn entity_type(&self) -> $crate::orm::meta::EntityType {
                $crate::orm::meta::EntityType::of::<$ty>()
            }

            fn read(&self, field: &str) -> $crate::orm::error::Result<$crate::orm::value::FieldRef<'_>> {
                match field {
                    $( stringify!($field) => Ok($crate::orm::value::Persist::to_field(&self.$field)), )+
                    other => Err($crate::orm::error::OrmError::UnknownField {
                        entity: stringify!($ty).to_string(),
                        field: other.to_string(),
                    }),
                }
            }

            fn write(&mut self, field: &str, value: $crate::orm::value::FieldValue) -> $crate::orm::error::Result<()> {
                match field {
                    $( stringify!($field) => {
                        self.$field = $crate::orm::value::Persist::from_field(value)?;
                        Ok(())
                    } )+
                    other => Err($crate::orm::error::OrmError::UnknownField {
                        entity: stringify!($ty).to_string(),
                        field: other.to_string(),
                    }),
                }
            }
        }
    };
}
