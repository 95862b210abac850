use repokit::common::OrderBy;
use repokit::criteria;
use repokit::errors::ErrorKind;
use repokit::repository::{limit_to, FindOptions};
use repokit_int_test::fixtures::User;
use repokit_int_test::test_util::{
    cleanup, create_auto_flush_context, create_seeded_context, create_test_context, run_test,
};

#[test]
fn test_add_is_invisible_until_flush() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            assert!(!repo.is_auto_flush());

            repo.add([User::new(1, "Alice", Some("admin"))], false)?;
            assert_eq!(repo.count_all()?, 0);
            assert_eq!(repo.find(1)?, None);

            repo.flush()?;
            assert_eq!(repo.count_all()?, 1);
            assert_eq!(repo.find(1)?.map(|u| u.name), Some("Alice".to_string()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_auto_flush_makes_add_visible() {
    run_test(
        || create_auto_flush_context(),
        |ctx| {
            let repo = ctx.mongo_users()?;
            assert!(repo.is_auto_flush());

            repo.add([User::new(1, "Alice", None)], false)?;
            assert_eq!(repo.count_all()?, 1);

            repo.set_auto_flush(false);
            repo.add([User::new(2, "Bob", None)], false)?;
            assert_eq!(repo.count_all()?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_with_options() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;

            let admins = repo.find_by(
                criteria! { "role": "admin" },
                FindOptions::new()
                    .with_order(OrderBy::desc("name"))
                    .skip(1)
                    .limit(2),
            )?;
            let names: Vec<String> = admins.into_iter().map(|u| u.name).collect();
            assert_eq!(names, vec!["Admin05", "Admin04"]);

            let nobody = repo.find_by(criteria! { "role": "guest" }, limit_to(5))?;
            assert!(nobody.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_null_and_list_criteria() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let without_role = repo.find_by(criteria! { "role": None::<String> }, FindOptions::new())?;
            assert_eq!(without_role.len(), 1);
            assert_eq!(without_role[0].id, 12);

            let picked = repo.find_by(criteria! { "id": vec![2, 4, 99] }, FindOptions::new())?;
            assert_eq!(picked.len(), 2);
            assert_eq!(repo.count_by(criteria! { "id": vec![2, 4, 99] })?, 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unknown_criteria_field_is_rejected() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let err = ctx
                .sql_users()?
                .find_by(criteria! { "colour": "red" }, FindOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_or_fail_variants() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.couch_users()?;
            assert_eq!(repo.find_by_or_fail(criteria! { "role": "editor" }, FindOptions::new())?.len(), 5);
            assert_eq!(
                repo.find_one_by_or_fail(criteria! { "userName": "admin03" }, OrderBy::new())?.id,
                3
            );

            let err = repo
                .find_by_or_fail(criteria! { "role": "guest" }, FindOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            let err = repo
                .find_one_by_or_fail(criteria! { "role": "guest" }, OrderBy::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_one_by_or_get_new_does_not_persist() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let existing = repo.find_one_by_or_get_new(criteria! { "userName": "editor07" })?;
            assert_eq!(existing.id, 7);

            let fresh = repo.find_one_by_or_create_new(criteria! { "userName": "nobody" })?;
            assert_eq!(fresh, User::default());
            assert_eq!(repo.get_new(), repo.create_new());
            assert_eq!(repo.count_all()?, 12);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_operations_flush_when_asked() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;

            assert_eq!(repo.remove_by(criteria! { "role": "editor" }, false)?, 5);
            assert_eq!(repo.count_all()?, 12);
            repo.flush()?;
            assert_eq!(repo.count_all()?, 7);

            assert!(repo.remove_one_by(criteria! { "role": "admin" }, true)?);
            assert!(repo.remove_by_id(12, true)?);
            assert!(!repo.remove_by_id(12, true)?);
            assert_eq!(repo.count_all()?, 5);

            assert_eq!(repo.remove_all(true)?, 5);
            assert!(repo.find_all()?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_refresh_and_detach() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;

            let mut user = repo.find(1)?.unwrap();
            user.name = "Changed".to_string();
            repo.refresh(&mut user)?;
            assert_eq!(user.name, "Admin01");

            let mut pending = User::new(50, "Pending", None);
            repo.add([pending.clone()], false)?;
            repo.detach(&pending)?;
            repo.flush()?;
            assert_eq!(repo.find(50)?, None);

            let err = repo.refresh(&mut pending).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_class_name() {
    run_test(
        || create_test_context(),
        |ctx| {
            assert_eq!(ctx.sql_users()?.class_name(), "User");
            assert_eq!(ctx.couch_users()?.class_name(), "User");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
