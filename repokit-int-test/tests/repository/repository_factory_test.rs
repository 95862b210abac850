use repokit::backend::{MongoSession, MongoTranslator};
use repokit::repository::Repository;
use repokit::session::SessionContext;
use repokit_int_test::fixtures::User;
use repokit_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_same_entity_and_session_share_repository() {
    run_test(
        || create_test_context(),
        |ctx| {
            let first = ctx.sql_users()?;
            let second = ctx.sql_users()?;
            first.set_auto_flush(true);
            assert!(second.is_auto_flush());
            assert_eq!(ctx.factory().len(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_backends_get_separate_repositories_over_same_data() {
    run_test(
        || create_test_context(),
        |ctx| {
            let sql = ctx.sql_users()?;
            let mongo = ctx.mongo_users()?;
            let couch = ctx.couch_users()?;
            assert_eq!(ctx.factory().len(), 3);

            sql.set_auto_flush(true);
            assert!(!mongo.is_auto_flush());

            sql.add([User::new(1, "Alice", None)], false)?;
            assert_eq!(mongo.count_all()?, 1);
            assert_eq!(couch.find(1)?.map(|u| u.name), Some("Alice".to_string()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_other_session_is_isolated() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.sql_users()?.add([User::new(1, "Alice", None)], true)?;

            let other = SessionContext::new();
            let repo = ctx.factory().sql_repository::<User>(&other)?;
            assert_eq!(repo.count_all()?, 0);
            assert_eq!(ctx.factory().len(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_explicit_session_lookup() {
    run_test(
        || create_test_context(),
        |ctx| {
            let session = MongoSession::<User>::new(ctx.session())?;
            assert!(!ctx.factory().has_repository::<User, _>(&session));

            let repo: Repository<User, MongoTranslator, MongoSession<User>> =
                ctx.factory().get_repository(session.clone())?;
            repo.set_auto_flush(true);
            assert!(ctx.factory().has_repository::<User, _>(&session));
            assert!(ctx.mongo_users()?.is_auto_flush());

            ctx.factory().clear();
            assert!(!ctx.factory().has_repository::<User, _>(&session));
            assert!(!ctx.mongo_users()?.is_auto_flush());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
