use repokit::common::{Document, Value};
use repokit::doc;
use repokit::errors::ErrorKind;
use repokit::val;
use repokit_int_test::test_util::{cleanup, create_seeded_context, run_test};

fn order(field: &str, direction: &str) -> Value {
    let mut order = Document::new();
    order.put(field, direction);
    Value::from(order)
}

#[test]
fn test_find_by_field() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let editors = repo
                .call("findByRole", vec![val!("editor"), order("id", "DESC"), val!(2), val!(1)])?
                .into_many()
                .unwrap();
            assert_eq!(editors.iter().map(|u| u.id).collect::<Vec<_>>(), vec![10, 9]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_one_by_camel_cases_field() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.mongo_users()?;
            let user = repo
                .call("findOneByUserName", vec![val!("admin02")])?
                .into_one()
                .unwrap();
            assert_eq!(user.map(|u| u.id), Some(2));

            let missing = repo
                .call("findOneByUserName", vec![val!("nobody")])?
                .into_one()
                .unwrap();
            assert!(missing.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_association() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let found = ctx
                .couch_users()?
                .call("findByGroup", vec![val!(2)])?
                .into_many()
                .unwrap();
            assert_eq!(found.len(), 4);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paginated_and_paged_finders() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let paginator = repo
                .call("findPaginatedByRole", vec![val!("admin"), Value::Null, val!(4)])?
                .into_paginator()
                .unwrap();
            assert_eq!(paginator.count()?, 2);

            let page = repo
                .call("findPagedByRole", vec![val!("admin"), order("name", "ASC"), val!(4), val!(4)])?
                .into_page()
                .unwrap();
            assert_eq!(page.current_page(), 2);
            assert_eq!(page.items()[0].name, "Admin05");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_finders() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let removed = repo.call("removeByRole", vec![val!("editor")])?.removed();
            assert_eq!(removed, Some(5));
            assert_eq!(repo.count_all()?, 12);
            repo.flush()?;
            assert_eq!(repo.count_all()?, 7);

            let removed = repo
                .call("removeOneByUserName", vec![val!("admin01"), val!(true)])?
                .removed();
            assert_eq!(removed, Some(1));
            assert_eq!(repo.count_all()?, 6);

            let removed = repo
                .call("removeOneByUserName", vec![val!("admin01"), val!(true)])?
                .removed();
            assert_eq!(removed, Some(0));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bare_prefix_takes_criteria_map() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let map = doc! { "role": "admin", "group": 1, "userName": "admin06" };
            let found = repo
                .call("findBy", vec![Value::from(map)])?
                .into_many()
                .unwrap();
            assert_eq!(found.len(), 1);

            let err = repo.call("findBy", vec![val!(3)]).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_dispatch_errors() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;

            let err = repo.call("countByRole", vec![val!("admin")]).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::NoSuchMethod);
            assert_eq!(
                err.message(),
                r#"Undefined method "countByRole". Method name must start with one of "findBy", "findOneBy", "findPaginatedBy", "findPagedBy", "removeBy", "removeOneBy"!"#
            );

            let err = repo.call("findByRole", vec![]).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
            assert_eq!(err.message(), "You need to pass a parameter to User::findByRole");

            let err = repo.call("removeOneByNickname", vec![val!("x")]).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
            assert_eq!(
                err.message(),
                r#"Invalid call to User::removeOneBy. Field "nickname" does not exist"#
            );

            let err = repo
                .call("findByRole", vec![val!("admin"), val!("sideways")])
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);

            let err = repo
                .call("findByRole", vec![val!("admin"), Value::Null, val!(-1)])
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
