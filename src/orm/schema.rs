//! Field classification and schema introspection helpers.

use super::error::{OrmError, Result};
use super::meta::{Entity, EntityMeta, EntityType, FieldDescriptor, FieldRole, RoleKind, ToManyKind};

/// All declared fields of `entity_type`, in declaration order.
pub fn fields_of(entity_type: EntityType) -> Vec<FieldDescriptor> {
    entity_type.meta().fields
}

/// Declared fields whose role is not in `roles`.
pub fn fields_excluding(entity_type: EntityType, roles: &[RoleKind]) -> Vec<FieldDescriptor> {
    fields_of(entity_type).into_iter().filter(|field| !roles.contains(&field.kind())).collect()
}

/// Declared fields whose role is in `roles`.
pub fn fields_only(entity_type: EntityType, roles: &[RoleKind]) -> Vec<FieldDescriptor> {
    fields_of(entity_type).into_iter().filter(|field| roles.contains(&field.kind())).collect()
}

/// Storage column for a field; to-one relations store `<field>_id`.
pub fn column_name(field: &FieldDescriptor) -> String {
    match field.role {
        FieldRole::ToOne { .. } => format!("{}_id", field.name),
        _ => field.name.to_string(),
    }
}

/// Checks the structural rules every entity must satisfy before use.
///
/// Each one-to-many element type must declare a to-one field targeting the
/// owner, since that field's column is what children are loaded by.
pub fn validate(meta: &EntityMeta) -> Result<()> {
    if meta.fields.is_empty() {
        return Err(OrmError::NoFields(meta.name.to_string()));
    }

    match meta.fields.iter().filter(|field| field.kind() == RoleKind::Identity).count() {
        0 => return Err(OrmError::MissingIdentity(meta.name.to_string())),
        1 => {}
        _ => return Err(OrmError::DuplicateIdentity(meta.name.to_string())),
    }

    for field in &meta.fields {
        if let FieldRole::ToMany { kind: ToManyKind::OneToMany, element } = &field.role {
            back_reference(meta.entity_type(), *element)?;
        }
    }
    Ok(())
}

pub fn identity_field(meta: &EntityMeta) -> Result<&FieldDescriptor> {
    meta.identity().ok_or_else(|| OrmError::MissingIdentity(meta.name.to_string()))
}

/// Finds a field by name or by its storage column name.
pub fn resolve_field<'m>(meta: &'m EntityMeta, key: &str) -> Result<&'m FieldDescriptor> {
    meta.field(key)
        .or_else(|| meta.fields.iter().find(|field| column_name(field) == key))
        .ok_or_else(|| OrmError::unknown_field(meta.name, key))
}

/// Join table backing a many-to-many relation: `<owner>_<related>`.
pub fn join_table(owner: &EntityMeta, related: &EntityMeta) -> String {
    format!("{}_{}", owner.table_name(), related.table_name())
}

/// Field of `child` that points back at `owner`.
pub fn back_reference(owner: EntityType, child: EntityType) -> Result<&'static str> {
    child
        .meta()
        .fields
        .iter()
        .find(|field| matches!(&field.role, FieldRole::ToOne { target, .. } if *target == owner))
        .map(|field| field.name)
        .ok_or_else(|| OrmError::MissingBackReference {
            entity: owner.name().to_string(),
            related: child.name().to_string(),
        })
}

/// Storage column of [`back_reference`].
pub fn back_reference_column(owner: EntityType, child: EntityType) -> Result<String> {
    Ok(format!("{}_id", back_reference(owner, child)?))
}

/// Ordered set of entity types managed together.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    types: Vec<EntityType>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Entity>(mut self) -> Self {
        let entity_type = EntityType::of::<T>();
        if !self.types.contains(&entity_type) {
            self.types.push(entity_type);
        }
        self
    }

    pub fn types(&self) -> &[EntityType] {
        &self.types
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks a type up by its type name or table name, ignoring case.
    pub fn find(&self, name: &str) -> Option<EntityType> {
        self.types.iter().copied().find(|entity_type| entity_type.name().eq_ignore_ascii_case(name))
    }

    /// Validates every registered type.
    pub fn validate(&self) -> Result<()> {
        if self.types.is_empty() {
            return Err(OrmError::NoEntities);
        }
        self.types.iter().try_for_each(|entity_type| validate(&entity_type.meta()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_entity;
    use crate::orm::meta::ColumnType;

    #[derive(Debug, Clone, Default)]
    struct Author {
        id: i64,
        name: String,
        books: Vec<Book>,
    }

    #[derive(Debug, Clone, Default)]
    struct Book {
        id: i64,
        title: String,
        writer: Option<Box<Author>>,
    }

    #[derive(Debug, Clone, Default)]
    struct Orphan {
        title: String,
    }

    #[derive(Debug, Clone, Default)]
    struct Twins {
        id: i64,
        other_id: i64,
    }

    impl_entity!(Author {
        id: identity,
        name: column(ColumnType::varchar()),
        books: one_to_many<Book>,
    });

    impl_entity!(Book {
        id: identity,
        title: column(ColumnType::Text),
        writer: many_to_one<Author>,
    });

    impl_entity!(Orphan { title: column(ColumnType::Text) });

    #[derive(Debug, Clone, Default)]
    struct Patron {
        id: i64,
        borrowed: Vec<Book>,
    }

    impl_entity!(Patron {
        id: identity,
        borrowed: one_to_many<Book>,
    });

    mod archive {
        use crate::impl_entity;

        #[derive(Debug, Clone, Default)]
        pub struct Author {
            id: i64,
        }

        impl_entity!(Author { id: identity });
    }

    impl_entity!(Twins {
        id: identity,
        other_id: identity,
    });

    #[test]
    fn test_fields_excluding_to_many() {
        let names: Vec<_> = fields_excluding(EntityType::of::<Author>(), &[RoleKind::ToMany]).iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_fields_only_relations() {
        let names: Vec<_> = fields_only(EntityType::of::<Book>(), &[RoleKind::ToOne]).iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["writer"]);
    }

    #[test]
    fn test_column_name_for_relation() {
        let meta = Book::schema();
        assert_eq!(column_name(meta.field("writer").unwrap()), "writer_id");
        assert_eq!(column_name(meta.field("title").unwrap()), "title");
    }

    #[test]
    fn test_validate_identity_rules() {
        assert!(validate(&Author::schema()).is_ok());
        assert!(matches!(validate(&Orphan::schema()), Err(OrmError::MissingIdentity(_))));
        assert!(matches!(validate(&Twins::schema()), Err(OrmError::DuplicateIdentity(_))));
    }

    #[test]
    fn test_back_reference_uses_child_field() {
        let owner = EntityType::of::<Author>();
        let child = EntityType::of::<Book>();
        assert_eq!(back_reference(owner, child).unwrap(), "writer");
        assert_eq!(back_reference_column(owner, child).unwrap(), "writer_id");
    }

    #[test]
    fn test_one_to_many_requires_back_reference() {
        let error = validate(&Patron::schema()).unwrap_err();
        assert!(matches!(error, OrmError::MissingBackReference { ref entity, ref related } if entity == "Patron" && related == "Book"));
        assert_eq!(error.kind(), crate::orm::error::ErrorKind::Metadata);
        assert!(Registry::new().register::<Patron>().register::<Book>().validate().is_err());
    }

    #[test]
    fn test_same_name_in_other_module_is_another_type() {
        assert_ne!(EntityType::of::<Author>(), EntityType::of::<archive::Author>());
        assert!(back_reference(EntityType::of::<archive::Author>(), EntityType::of::<Book>()).is_err());

        let registry = Registry::new().register::<Author>().register::<archive::Author>();
        assert_eq!(registry.types().len(), 2);
    }

    #[test]
    fn test_resolve_field_by_column() {
        let meta = Book::schema();
        assert_eq!(resolve_field(&meta, "writer_id").unwrap().name, "writer");
        assert!(resolve_field(&meta, "missing").is_err());
    }

    #[test]
    fn test_registry_find_and_dedup() {
        let registry = Registry::new().register::<Author>().register::<Book>().register::<Author>();
        assert_eq!(registry.types().len(), 2);
        assert_eq!(registry.find("book"), Some(EntityType::of::<Book>()));
        assert!(registry.find("unknown").is_none());
    }
}
