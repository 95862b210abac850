use repokit::criteria;
use repokit::errors::ErrorKind;
use repokit::repository::FindOptions;
use repokit_int_test::fixtures::SOFT_DELETE;
use repokit_int_test::test_util::{cleanup, create_seeded_context, run_test};
use std::sync::Arc;

#[test]
fn test_enabled_filter_hides_rows_everywhere() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            ctx.session().filters().enable(SOFT_DELETE)?;
            let repo = ctx.sql_users()?;

            assert_eq!(repo.count_all()?, 10);
            assert_eq!(repo.find_all()?.len(), 10);
            assert_eq!(repo.find(11)?, None);
            assert_eq!(repo.count_by(criteria! { "role": "editor" })?, 4);
            assert_eq!(ctx.mongo_users()?.count_all()?, 10);
            assert_eq!(ctx.couch_users()?.count_all()?, 10);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_disable_and_restore_filter() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let filters = ctx.session().filters();
            filters.enable(SOFT_DELETE)?;
            let repo = ctx.sql_users()?;

            repo.disable_filter(SOFT_DELETE)?;
            repo.disable_filter(SOFT_DELETE)?;
            assert!(!filters.is_enabled(SOFT_DELETE));
            assert_eq!(repo.count_all()?, 12);

            repo.restore_filter(SOFT_DELETE)?;
            assert!(filters.is_enabled(SOFT_DELETE));
            assert_eq!(repo.count_all()?, 10);

            repo.restore_filter(SOFT_DELETE)?;
            assert!(filters.is_enabled(SOFT_DELETE));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_disable_all_restores_only_suspended() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let filters = ctx.session().filters();
            filters.register(
                "adminsOnly",
                Arc::new(|_: &str, document: &repokit::common::Document| {
                    document.get("role").as_str() == Some("admin")
                }),
            );
            filters.register("never", Arc::new(|_: &str, _: &repokit::common::Document| false));
            filters.enable(SOFT_DELETE)?;
            filters.enable("adminsOnly")?;

            let repo = ctx.sql_users()?;
            assert_eq!(repo.count_all()?, 6);

            repo.disable_filters()?;
            assert!(filters.enabled_filters().is_empty());
            assert_eq!(repo.find_by(criteria! {}, FindOptions::new())?.len(), 12);

            repo.restore_filters()?;
            assert!(filters.is_enabled(SOFT_DELETE));
            assert!(filters.is_enabled("adminsOnly"));
            assert!(!filters.is_enabled("never"));
            assert_eq!(repo.count_all()?, 6);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unknown_filter_cannot_be_enabled() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let err = ctx.session().filters().enable("missing").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);

            ctx.sql_users()?.disable_filter("missing")?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
