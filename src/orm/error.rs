//! Error taxonomy for the mapper core.
//!
//! Every failure in the path that produces a result is surfaced as an
//! [`OrmError`]. Errors fall into four kinds, see [`ErrorKind`]:
//!
//! - **Metadata**: the entity description itself is unusable
//! - **Compilation**: a value cannot be rendered into a statement
//! - **Execution**: the database rejected a statement
//! - **Mapping**: a result row cannot be turned back into an entity

use thiserror::Error;

/// Coarse classification of an [`OrmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Metadata,
    Compilation,
    Execution,
    Mapping,
}

#[derive(Debug, Error)]
pub enum OrmError {
    // Metadata
    #[error("entity '{0}' must declare at least one field")]
    NoFields(String),
    #[error("entity '{0}' must declare exactly one identity field")]
    MissingIdentity(String),
    #[error("entity '{0}' declares more than one identity field")]
    DuplicateIdentity(String),
    #[error("entity '{entity}' has no field named '{field}'")]
    UnknownField { entity: String, field: String },
    #[error("at least one entity type is required")]
    NoEntities,
    #[error("entity '{related}' has no to-one field pointing back at '{entity}'")]
    MissingBackReference { entity: String, related: String },

    // Compilation
    #[error("value {value} cannot be written to {entity}.{field} declared as {expected}")]
    IncompatibleValue {
        entity: String,
        field: String,
        expected: String,
        value: String,
    },
    #[error("relation {entity}.{field} points at an instance that has not been saved")]
    UnsavedRelation { entity: String, field: String },
    #[error("entity '{0}' has no assigned identity yet")]
    UnassignedIdentity(String),

    // Execution
    #[error(transparent)]
    Execution(#[from] rusqlite::Error),
    #[error("statement returned no rows: {0}")]
    EmptyResult(String),

    // Mapping
    #[error("mapping failed for field {entity}.{field}: {source}")]
    Mapping {
        entity: String,
        field: String,
        #[source]
        source: Box<OrmError>,
    },
    #[error("column '{0}' is missing from the result row")]
    MissingColumn(String),
    #[error("unexpected value {found} where {expected} was required")]
    UnexpectedValue { expected: String, found: String },
    #[error("invalid datetime '{value}': {source}")]
    DateTimeParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("expected an instance of '{expected}', found '{found}'")]
    Downcast { expected: String, found: String },
}

impl OrmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrmError::NoFields(_) | OrmError::MissingIdentity(_) | OrmError::DuplicateIdentity(_) | OrmError::UnknownField { .. }
            | OrmError::NoEntities
            | OrmError::MissingBackReference { .. } => {
                ErrorKind::Metadata
            }
            OrmError::IncompatibleValue { .. } | OrmError::UnsavedRelation { .. } | OrmError::UnassignedIdentity(_) => ErrorKind::Compilation,
            OrmError::Execution(_) | OrmError::EmptyResult(_) => ErrorKind::Execution,
            OrmError::Mapping { .. } | OrmError::MissingColumn(_) | OrmError::UnexpectedValue { .. } | OrmError::DateTimeParse { .. } | OrmError::Downcast { .. } => {
                ErrorKind::Mapping
            }
        }
    }

    pub(crate) fn unknown_field(entity: &str, field: &str) -> Self {
        OrmError::UnknownField {
            entity: entity.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn unexpected(expected: &str, found: impl std::fmt::Debug) -> Self {
        OrmError::UnexpectedValue {
            expected: expected.to_string(),
            found: format!("{:?}", found),
        }
    }

    /// Wraps `self` as the failure of one field while mapping a row.
    pub(crate) fn in_field(self, entity: &str, field: &str) -> Self {
        OrmError::Mapping {
            entity: entity.to_string(),
            field: field.to_string(),
            source: Box::new(self),
        }
    }
}

pub type Result<T, E = OrmError> = std::result::Result<T, E>;
