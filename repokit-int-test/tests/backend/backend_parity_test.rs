use repokit::backend::{DocumentQuery, SelectorQuery, SqlPredicate, SqlQuery};
use repokit::common::{OrderBy, SortOrder, Value};
use repokit::criteria::{Criteria, QuerySource};
use repokit::errors::ErrorKind;
use repokit::repository::FindOptions;
use repokit::session::PersistenceSession;
use repokit::{criteria, doc, val};
use repokit_int_test::test_util::{cleanup, create_seeded_context, run_test};

fn criteria_cases() -> Vec<Criteria> {
    vec![
        criteria! {},
        criteria! { "role": "admin" },
        criteria! { "role": "editor", "group": 2 },
        criteria! { "role": None::<String> },
        criteria! { "id": vec![1, 3, 5, 7, 42] },
        criteria! { "userName": "nobody" },
    ]
}

#[test]
fn test_count_matches_find_on_every_backend() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let sql = ctx.sql_users()?;
            let mongo = ctx.mongo_users()?;
            let couch = ctx.couch_users()?;

            for criteria in criteria_cases() {
                let expected = sql.find_by(criteria.clone(), FindOptions::new())?.len();
                assert_eq!(sql.count_by(criteria.clone())?, expected, "sql {}", criteria);
                assert_eq!(mongo.count_by(criteria.clone())?, expected, "mongo {}", criteria);
                assert_eq!(couch.count_by(criteria.clone())?, expected, "couch {}", criteria);
                assert_eq!(
                    mongo.find_by(criteria.clone(), FindOptions::new())?.len(),
                    expected
                );
                assert_eq!(couch.find_by(criteria, FindOptions::new())?.len(), expected);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_backends_agree_on_order_and_window() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let options = FindOptions::new()
                .with_order(OrderBy::desc("role").add("name", SortOrder::Ascending))
                .skip(2)
                .limit(4);
            let ids = |users: Vec<repokit_int_test::fixtures::User>| {
                users.into_iter().map(|u| u.id).collect::<Vec<_>>()
            };

            let sql = ids(ctx.sql_users()?.find_by(criteria! {}, options.clone())?);
            let mongo = ids(ctx.mongo_users()?.find_by(criteria! {}, options.clone())?);
            let couch = ids(ctx.couch_users()?.find_by(criteria! {}, options)?);
            assert_eq!(sql, mongo);
            assert_eq!(sql, couch);
            assert_eq!(sql.len(), 4);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_native_queries_bypass_translation() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let sql_query = SqlQuery::select("User", "e")
                .and_where(SqlPredicate::In {
                    field: "id".into(),
                    parameter: "ids".into(),
                })
                .set_parameter("ids", val!(vec![2, 4, 6]));
            let sql = ctx.sql_users()?;
            assert_eq!(sql.find_by(QuerySource::native(sql_query.clone()), FindOptions::new())?.len(), 3);
            assert_eq!(sql.count_by(QuerySource::native(sql_query))?, 3);

            let mongo_query = DocumentQuery::for_collection("User").equals("role", val!("admin"));
            let mongo = ctx.mongo_users()?;
            assert_eq!(mongo.count_by(QuerySource::native(mongo_query.eager_cursor(true)))?, 6);

            let selector = doc! { "role": doc! { "$in": vec!["editor"] } };
            let couch_query = SelectorQuery::from_selector("User", Value::from(selector))?;
            let couch = ctx.couch_users()?;
            assert_eq!(couch.count_by(QuerySource::native(couch_query))?, 5);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_count_scalar_differs_per_backend() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let sql = ctx.sql_users()?;
            let count = sql
                .session()
                .count(&SqlQuery::select("User", "e").select_count())?;
            assert_eq!(count, Value::String("12".to_string()));

            let mongo = ctx.mongo_users()?;
            let count = mongo
                .session()
                .count(&DocumentQuery::for_collection("User").count())?;
            assert!(matches!(count, Value::I64(12)));

            let couch = ctx.couch_users()?;
            let count = couch
                .session()
                .count(&SelectorQuery::for_type("User").count())?;
            assert!(matches!(count, Value::U64(12)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_query_for_other_entity_is_backend_error() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let err = ctx
                .sql_users()?
                .find_by(QuerySource::native(SqlQuery::select("Group", "g")), FindOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::BackendError);

            let err = ctx
                .mongo_users()?
                .count_by(QuerySource::native(DocumentQuery::for_collection("Group")))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::BackendError);

            let selector = doc! { "role": doc! { "$regex": "^adm" } };
            let query = SelectorQuery::from_selector("User", Value::from(selector))?;
            let err = ctx
                .couch_users()?
                .find_by(QuerySource::native(query), FindOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::BackendError);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
