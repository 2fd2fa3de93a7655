use docket::errors::ErrorKind;
use docket::filter::{all, Filter};
use docket::record;
use docket_int_test::test_util::{insert_test_records, run_with_each_codec};

#[test]
fn test_collection_handle() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        let users = db.collection("users")?;
        assert_eq!(users.name(), "users");
        assert!(!users.exists()?);

        assert_eq!(users.insert(record! { "name": "Foo", "age": 10 })?, 1);
        assert!(users.exists()?);

        let found = users.find(&Filter::new().eq("name", "Foo"))?;
        assert_eq!(found, vec![record! { "id": 1, "name": "Foo", "age": 10 }]);

        let updated = users.update(&all(), &record! { "age": 11 })?;
        assert_eq!(updated, vec![record! { "id": 1, "name": "Foo", "age": 11 }]);

        // handles share the database
        let clone = users.clone();
        assert_eq!(clone.find(&all())?, db.find("users", &all())?);
        Ok(())
    });
}

#[test]
fn test_collections_are_isolated() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;
        db.insert("auth", record! { "name": "Foo", "token": "abc" })?;

        assert_eq!(db.find("users", &all())?.len(), 3);
        assert_eq!(
            db.find("auth", &all())?,
            vec![record! { "id": 1, "name": "Foo", "token": "abc" }]
        );
        Ok(())
    });
}

#[test]
fn test_create_collection_is_idempotent() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        db.create_collection("users")?;
        db.insert("users", record! { "name": "Foo" })?;
        db.create_collection("users")?;

        assert_eq!(db.find("users", &all())?.len(), 1);
        assert_eq!(db.insert("users", record! { "name": "Bar" })?, 2);
        Ok(())
    });
}

#[test]
fn test_list_collection_names() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        assert!(db.list_collection_names()?.is_empty());

        db.insert("users", record! { "name": "Foo" })?;
        db.create_collection("orders")?;
        db.insert("my auth", record! { "token": "abc" })?;

        assert_eq!(
            db.list_collection_names()?,
            vec![
                "my auth".to_string(),
                "orders".to_string(),
                "users".to_string()
            ]
        );
        assert!(db.has_collection("my auth")?);
        assert!(!db.has_collection("Users")?);
        Ok(())
    });
}

#[test]
fn test_invalid_collection_names() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        for name in ["", "$docket_meta", "$DOCKET_META"] {
            let err = db.insert(name, record! { "name": "Foo" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            assert_eq!(
                db.collection(name).err().map(|err| err.kind().clone()),
                Some(ErrorKind::ValidationError)
            );
        }
        assert!(db.list_collection_names()?.is_empty());
        Ok(())
    });
}

#[test]
fn test_long_collection_names() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        let long_ascii = "c".repeat(300);
        let long_unicode = "é".repeat(50);

        assert_eq!(db.insert(&long_ascii, record! { "a": 1 })?, 1);
        db.create_collection(&long_unicode)?;
        assert_eq!(db.insert(&long_unicode, record! { "a": 2 })?, 1);

        assert_eq!(
            db.find(&long_ascii, &all())?,
            vec![record! { "id": 1, "a": 1 }]
        );
        let updated = db.update(&long_unicode, &all(), &record! { "a": 3 })?;
        assert_eq!(updated, vec![record! { "id": 1, "a": 3 }]);
        assert_eq!(db.list_collection_names()?, vec![long_ascii, long_unicode]);
        Ok(())
    });
}
