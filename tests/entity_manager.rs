#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use microrm::db::db::Db;
    use microrm::impl_entity;
    use microrm::libs::models::{self, Category, SubItem, TodoItem};
    use microrm::orm::error::{ErrorKind, OrmError};
    use microrm::orm::manager::EntityManager;
    use microrm::orm::meta::ColumnType;
    use microrm::orm::schema::Registry;
    use microrm::orm::sql::Filter;
    use microrm::orm::value::Value;
    use test_context::{test_context, TestContext};

    #[derive(Debug, Clone, Default)]
    struct Household {
        id: i64,
        name: String,
        pets: Vec<Pet>,
    }

    impl_entity!(Household {
        id: identity,
        name: column(ColumnType::Text),
        pets: one_to_many<Pet>,
    });

    /// Declares no field leading back to its household.
    #[derive(Debug, Clone, Default)]
    struct Pet {
        id: i64,
        name: String,
    }

    impl_entity!(Pet {
        id: identity,
        name: column(ColumnType::Text),
    });

    struct ManagerTestContext {
        manager: EntityManager<Db>,
    }

    impl TestContext for ManagerTestContext {
        fn setup() -> Self {
            let manager = EntityManager::new(Db::open_in_memory().unwrap());
            manager.initialize(&models::registry()).unwrap();
            ManagerTestContext { manager }
        }
    }

    fn saved_todo(manager: &EntityManager<Db>, title: &str) -> TodoItem {
        let mut todo = TodoItem::new(title, "description");
        assert!(manager.save(&mut todo).unwrap());
        todo
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_save_assigns_identity(ctx: &mut ManagerTestContext) {
        let first = saved_todo(&ctx.manager, "first");
        let second = saved_todo(&ctx.manager, "second");

        assert!(first.id > 0);
        assert!(second.id > first.id);
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_find_by_id_round_trip(ctx: &mut ManagerTestContext) {
        let expires_at = NaiveDate::from_ymd_opt(2030, 1, 15).unwrap().and_hms_opt(9, 30, 0).unwrap();
        let mut todo = TodoItem {
            expires_at: Some(expires_at),
            is_completed: true,
            ..TodoItem::new("Buy milk", "2 litres, it's for the cat")
        };
        ctx.manager.save(&mut todo).unwrap();

        let stored = ctx.manager.find_by_id::<TodoItem>(todo.id).unwrap().unwrap();
        assert_eq!(stored.title, "Buy milk");
        assert_eq!(stored.description, "2 litres, it's for the cat");
        assert_eq!(stored.expires_at, Some(expires_at));
        assert!(stored.is_completed);
        assert!(stored.sub_items.is_empty());
        assert!(stored.categories.is_empty());
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_find_missing_returns_none(ctx: &mut ManagerTestContext) {
        assert!(ctx.manager.find_by_id::<TodoItem>(42).unwrap().is_none());

        let filters = Filter::from([("title".to_string(), Value::from("nothing"))]);
        assert!(ctx.manager.find_by_fields::<TodoItem>(&filters).unwrap().is_none());
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_sub_items_are_loaded_with_owner(ctx: &mut ManagerTestContext) {
        let todo = saved_todo(&ctx.manager, "With sub items");
        for title in ["one", "two", "three"] {
            ctx.manager.save(&mut SubItem::new(title, &todo)).unwrap();
        }

        let stored = ctx.manager.find_by_id::<TodoItem>(todo.id).unwrap().unwrap();
        let titles: Vec<_> = stored.sub_items.iter().map(|sub_item| sub_item.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
        for sub_item in &stored.sub_items {
            assert_eq!(sub_item.todo_item.as_ref().unwrap().id, todo.id);
        }

        let loose = ctx.manager.list::<SubItem>().unwrap();
        assert_eq!(loose.len(), 3);
        assert_eq!(loose[0].todo_item.as_ref().unwrap().id, todo.id);
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_categories_are_linked(ctx: &mut ManagerTestContext) {
        let mut work = Category::new("Work");
        let mut home = Category::new("Home");
        ctx.manager.save(&mut work).unwrap();
        ctx.manager.save(&mut home).unwrap();

        let mut todo = TodoItem {
            categories: vec![work.clone(), home.clone()],
            ..TodoItem::new("Tagged", "")
        };
        ctx.manager.save(&mut todo).unwrap();

        let stored = ctx.manager.find_by_id::<TodoItem>(todo.id).unwrap().unwrap();
        assert_eq!(stored.categories, vec![work, home]);
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_unsaved_category_is_rejected(ctx: &mut ManagerTestContext) {
        let mut todo = TodoItem {
            categories: vec![Category::new("Never saved")],
            ..TodoItem::new("Tagged", "")
        };

        let error = ctx.manager.save(&mut todo).unwrap_err();
        assert!(matches!(error, OrmError::UnsavedRelation { .. }));
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_update(ctx: &mut ManagerTestContext) {
        let mut todo = saved_todo(&ctx.manager, "before");
        todo.title = "after".to_string();
        todo.is_completed = true;

        assert!(ctx.manager.update(&todo).unwrap());

        let stored = ctx.manager.find_by_id::<TodoItem>(todo.id).unwrap().unwrap();
        assert_eq!(stored.title, "after");
        assert!(stored.is_completed);
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_update_missing_row(ctx: &mut ManagerTestContext) {
        let ghost = TodoItem {
            id: 99,
            ..TodoItem::new("ghost", "")
        };
        assert!(!ctx.manager.update(&ghost).unwrap());
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_count_with_filters(ctx: &mut ManagerTestContext) {
        saved_todo(&ctx.manager, "open");
        let mut done = TodoItem {
            is_completed: true,
            ..TodoItem::new("done", "")
        };
        ctx.manager.save(&mut done).unwrap();

        let completed = Filter::from([("is_completed".to_string(), Value::Boolean(true))]);
        assert_eq!(ctx.manager.count::<TodoItem>(None).unwrap(), 2);
        assert_eq!(ctx.manager.count::<TodoItem>(Some(&completed)).unwrap(), 1);

        let found = ctx.manager.list_by_fields::<TodoItem>(&completed).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "done");
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_delete_cascades(ctx: &mut ManagerTestContext) {
        let mut category = Category::new("Work");
        ctx.manager.save(&mut category).unwrap();

        let mut todo = TodoItem {
            categories: vec![category.clone()],
            ..TodoItem::new("Doomed", "")
        };
        ctx.manager.save(&mut todo).unwrap();
        ctx.manager.save(&mut SubItem::new("child", &todo)).unwrap();

        let stored = ctx.manager.find_by_id::<TodoItem>(todo.id).unwrap().unwrap();
        assert!(ctx.manager.delete(&stored).unwrap());

        assert!(ctx.manager.find_by_id::<TodoItem>(todo.id).unwrap().is_none());
        assert_eq!(ctx.manager.count::<SubItem>(None).unwrap(), 0);
        assert_eq!(ctx.manager.count::<Category>(None).unwrap(), 1);
        assert!(!ctx.manager.delete(&stored).unwrap());
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_dropped_tables_fail_to_execute(ctx: &mut ManagerTestContext) {
        ctx.manager.drop_tables(models::registry().types()).unwrap();

        let error = ctx.manager.list::<TodoItem>().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Execution);
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_drop_single_table(ctx: &mut ManagerTestContext) {
        ctx.manager.drop_table("Category").unwrap();
        assert!(ctx.manager.list::<Category>().is_err());
        assert!(ctx.manager.list::<TodoItem>().unwrap().is_empty());
    }

    #[test_context(ManagerTestContext)]
    #[test]
    fn test_children_without_back_reference_are_rejected(ctx: &mut ManagerTestContext) {
        let registry = Registry::new().register::<Household>().register::<Pet>();

        let error = ctx.manager.initialize(&registry).unwrap_err();
        assert!(matches!(error, OrmError::MissingBackReference { ref entity, ref related } if entity == "Household" && related == "Pet"));
        assert_eq!(error.kind(), ErrorKind::Metadata);

        let mut household = Household {
            name: "Smiths".to_string(),
            ..Default::default()
        };
        assert!(matches!(ctx.manager.save(&mut household), Err(OrmError::MissingBackReference { .. })));
        assert!(ctx.manager.list::<Pet>().is_err());
    }
}
