use docket::codec::{CodecKind, RecordCodec};
use docket::errors::ErrorKind;
use docket::filter::{all, Filter};
use docket::record;
use docket::store::{FieldStore, RecordKey};
use docket_int_test::test_util::{
    cleanup, create_typed_field_context, insert_test_records, run_test, run_with_each_codec,
};

#[test]
fn test_update_preserves_shape() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        db.insert("users", record! { "name": "foobarbaz" })?;

        let updated = db.update("users", &all(), &record! { "name": "Sailor", "age": 5 })?;
        assert_eq!(updated, vec![record! { "id": 1, "name": "Sailor" }]);
        assert_eq!(db.find("users", &all())?, updated);
        Ok(())
    });
}

#[test]
fn test_update_matching_records_only() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;

        let updated = db.update(
            "users",
            &Filter::new().eq("age", 10),
            &record! { "age": 11 },
        )?;
        assert_eq!(
            updated,
            vec![
                record! { "id": 1, "name": "Foo", "age": 11 },
                record! { "id": 3, "name": "Baz", "age": 11 },
            ]
        );

        assert_eq!(
            db.find("users", &all())?,
            vec![
                record! { "id": 1, "name": "Foo", "age": 11 },
                record! { "id": 2, "name": "Bar", "age": 88.3 },
                record! { "id": 3, "name": "Baz", "age": 11 },
            ]
        );
        Ok(())
    });
}

#[test]
fn test_update_never_touches_id() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;

        let updated = db.update(
            "users",
            &Filter::new().eq("name", "Bar"),
            &record! { "id": 42, "name": "Bart" },
        )?;
        assert_eq!(updated, vec![record! { "id": 2, "name": "Bart", "age": 88.3 }]);
        assert!(db.find("users", &Filter::new().eq("id", 42))?.is_empty());
        Ok(())
    });
}

#[test]
fn test_update_ignores_projection_and_limit() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;

        let filter = all().select(&["name"]).limit(1).sort_by("name");
        let updated = db.update("users", &filter, &record! { "age": 1 })?;
        assert_eq!(updated.len(), 3);
        assert_eq!(updated[0], record! { "id": 1, "name": "Foo", "age": 1 });
        Ok(())
    });
}

#[test]
fn test_update_without_matches() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;

        let updated = db.update(
            "users",
            &Filter::new().eq("name", "Nobody"),
            &record! { "age": 1 },
        )?;
        assert!(updated.is_empty());
        assert_eq!(db.find("users", &Filter::new().eq("age", 1))?.len(), 0);
        Ok(())
    });
}

#[test]
fn test_update_missing_collection() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;

        let err = db
            .update("nonexistent", &all(), &record! { "name": "Sailor" })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CollectionNotFound);

        // nothing changed
        assert!(!db.has_collection("nonexistent")?);
        assert_eq!(db.list_collection_names()?, vec!["users".to_string()]);
        assert_eq!(db.find("users", &Filter::new().eq("name", "Sailor"))?.len(), 0);
        Ok(())
    });
}

#[test]
fn test_failed_update_rolls_back_every_record() {
    run_test(
        create_typed_field_context,
        |ctx| {
            let db = ctx.db();
            insert_test_records(&db, "users")?;
            db.insert("users", record! { "name": "Qux", "big": 1 })?;

            // the first three records take the patch, the last cannot
            // encode it
            let err = db
                .update("users", &all(), &record! { "name": "Same", "big": i64::MAX })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::EncodingError);

            assert_eq!(
                db.find("users", &all())?,
                vec![
                    record! { "id": 1, "name": "Foo", "age": 10 },
                    record! { "id": 2, "name": "Bar", "age": 88.3 },
                    record! { "id": 3, "name": "Baz", "age": 10 },
                    record! { "id": 4, "name": "Qux", "big": 1 },
                ]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_then_insert_continues_sequence() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;
        db.update("users", &all(), &record! { "name": "Same" })?;
        assert_eq!(db.insert("users", record! { "name": "Next" })?, 4);
        Ok(())
    });
}

#[test]
fn test_undecodable_record_aborts_find_and_update() {
    run_with_each_codec(|ctx| {
        let db = ctx.db();
        insert_test_records(&db, "users")?;

        let mut tx = db.store().begin(true)?;
        {
            let mut bucket = tx.bucket("users")?.unwrap();
            let key = RecordKey::from_id(4);
            match ctx.codec() {
                CodecKind::WholeRecord => bucket.put(key.as_bytes(), b"{\"name\":")?,
                CodecKind::TypedField => {
                    bucket.create_sub_namespace(key)?;
                    bucket.put_field(key, "name", &[9, 0, 0, 0])?;
                }
            }
        }
        tx.commit()?;

        let err = db.find("users", &all()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DecodingError);
        let err = db
            .update("users", &Filter::new().eq("name", "Foo"), &record! { "age": 11 })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DecodingError);

        // repairing the entry shows the valid records were not rewritten
        let codec = RecordCodec::for_kind(ctx.codec());
        let mut tx = db.store().begin(true)?;
        {
            let mut bucket = tx.bucket("users")?.unwrap();
            codec.write_record(&mut bucket, RecordKey::from_id(4), &record! { "name": "Qux" })?;
        }
        tx.commit()?;
        assert_eq!(
            db.find("users", &all())?,
            vec![
                record! { "id": 1, "name": "Foo", "age": 10 },
                record! { "id": 2, "name": "Bar", "age": 88.3 },
                record! { "id": 3, "name": "Baz", "age": 10 },
                record! { "id": 4, "name": "Qux" },
            ]
        );
        Ok(())
    });
}
