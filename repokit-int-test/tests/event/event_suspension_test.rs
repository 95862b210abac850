use repokit::errors::ErrorKind;
use repokit::event::{
    EventListener, LIFECYCLE_EVENTS, ON_FLUSH, POST_FLUSH, POST_PERSIST, PRE_FLUSH, PRE_PERSIST,
};
use repokit_int_test::fixtures::{
    AuditSubscriber, CountingListener, RecordingListener, User, VetoListener,
};
use repokit_int_test::test_util::{cleanup, create_test_context, run_test};
use std::sync::Arc;

#[test]
fn test_listener_sees_lifecycle_in_order() {
    run_test(
        || create_test_context(),
        |ctx| {
            let recorder = Arc::new(RecordingListener::default());
            ctx.session()
                .event_manager()
                .add_event_listener(&LIFECYCLE_EVENTS, recorder.clone());

            ctx.sql_users()?.add([User::new(1, "Alice", None)], true)?;
            assert_eq!(
                recorder.events(),
                vec![PRE_PERSIST, PRE_FLUSH, ON_FLUSH, POST_PERSIST, POST_FLUSH]
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_disable_and_restore_listeners_of_event() {
    run_test(
        || create_test_context(),
        |ctx| {
            let recorder = Arc::new(RecordingListener::default());
            ctx.session()
                .event_manager()
                .add_event_listener(&[PRE_PERSIST, POST_FLUSH], recorder.clone());

            let repo = ctx.sql_users()?;
            repo.disable_event_listeners(PRE_PERSIST);
            repo.disable_event_listeners(PRE_PERSIST);
            assert_eq!(repo.registered_events(), vec![POST_FLUSH.to_string()]);

            repo.add([User::new(1, "Alice", None)], true)?;
            assert_eq!(recorder.events(), vec![POST_FLUSH]);

            repo.restore_event_listeners(PRE_PERSIST);
            recorder.clear();
            repo.add([User::new(2, "Bob", None)], true)?;
            assert_eq!(recorder.events(), vec![PRE_PERSIST, POST_FLUSH]);

            repo.restore_event_listeners(PRE_PERSIST);
            assert_eq!(ctx.session().event_manager().listeners(PRE_PERSIST).len(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_disable_single_listener_by_type() {
    run_test(
        || create_test_context(),
        |ctx| {
            let recorder = Arc::new(RecordingListener::default());
            let counter = Arc::new(CountingListener::default());
            let manager = ctx.session().event_manager();
            manager.add_event_listener(&[POST_FLUSH], recorder.clone());
            manager.add_event_listener(&[POST_FLUSH], counter.clone());

            let repo = ctx.mongo_users()?;
            repo.disable_event_listener::<CountingListener>(POST_FLUSH);
            repo.add([User::new(1, "Alice", None)], true)?;
            assert_eq!(counter.count(), 0);
            assert_eq!(recorder.events(), vec![POST_FLUSH]);

            repo.restore_all_event_listeners();
            repo.add([User::new(2, "Bob", None)], true)?;
            assert_eq!(counter.count(), 1);

            let restored: Arc<dyn EventListener> = counter.clone();
            assert!(manager.listeners(POST_FLUSH).iter().any(|l| Arc::ptr_eq(l, &restored)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_disable_and_restore_subscriber() {
    run_test(
        || create_test_context(),
        |ctx| {
            let audit = Arc::new(AuditSubscriber::default());
            ctx.session().event_manager().add_event_subscriber(audit.clone());

            let repo = ctx.sql_users()?;
            repo.add([User::new(1, "Alice", None)], true)?;
            assert_eq!((audit.persisted(), audit.flushes()), (1, 1));

            repo.disable_event_subscriber::<AuditSubscriber>();
            repo.disable_event_subscriber::<AuditSubscriber>();
            repo.add([User::new(2, "Bob", None)], true)?;
            assert_eq!((audit.persisted(), audit.flushes()), (1, 1));
            assert!(ctx.session().event_manager().subscribers().is_empty());

            repo.restore_event_subscribers();
            repo.add([User::new(3, "Carol", None)], true)?;
            assert_eq!((audit.persisted(), audit.flushes()), (2, 2));
            assert_eq!(ctx.session().event_manager().subscribers().len(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failed_flush_keeps_changes_pending() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.session()
                .event_manager()
                .add_event_listener(&[ON_FLUSH], Arc::new(VetoListener));

            let repo = ctx.couch_users()?;
            let err = repo.add([User::new(1, "Alice", None)], true).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::EventError);
            assert_eq!(repo.count_all()?, 0);

            repo.disable_event_listener::<VetoListener>(ON_FLUSH);
            repo.flush()?;
            assert_eq!(repo.count_all()?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_restore_without_disable_is_noop() {
    run_test(
        || create_test_context(),
        |ctx| {
            let recorder = Arc::new(RecordingListener::default());
            ctx.session()
                .event_manager()
                .add_event_listener(&[PRE_PERSIST], recorder.clone());

            let repo = ctx.sql_users()?;
            repo.restore_event_listeners(PRE_PERSIST);
            repo.restore_all_event_listeners();
            repo.restore_event_subscribers();
            assert_eq!(ctx.session().event_manager().listeners(PRE_PERSIST).len(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
