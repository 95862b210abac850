use repokit::common::OrderBy;
use repokit::criteria;
use repokit::errors::ErrorKind;
use repokit::pager::Pager;
use repokit::RepoResult;
use repokit_int_test::fixtures::User;
use repokit_int_test::test_util::{cleanup, create_seeded_context, run_test};

struct Roster {
    names: Vec<String>,
    users: Vec<User>,
    page: usize,
    size: usize,
    total: usize,
}

impl Pager<User> for Roster {
    fn new(users: Vec<User>, page: usize, size: usize, total: usize) -> RepoResult<Self> {
        Ok(Roster {
            names: users.iter().map(|u| u.name.clone()).collect(),
            users,
            page,
            size,
            total,
        })
    }

    fn current_page(&self) -> usize {
        self.page
    }

    fn page_size(&self) -> usize {
        self.size
    }

    fn total_count(&self) -> usize {
        self.total
    }

    fn items(&self) -> &[User] {
        &self.users
    }
}

#[test]
fn test_paged_by_walks_every_page() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let mut seen = Vec::new();
            let mut offset = 0;
            loop {
                let page = repo.find_paged_by(criteria! {}, OrderBy::asc("id"), Some(5), offset)?;
                assert_eq!(page.total_count(), 12);
                assert_eq!(page.total_pages(), 3);
                assert_eq!(page.current_page_offset_start(), offset as usize);
                seen.extend(page.iter().map(|u| u.id));
                match page.next_page() {
                    Some(_) => offset += 5,
                    None => {
                        assert!(page.is_last_page());
                        assert_eq!(page.len(), 2);
                        break;
                    }
                }
            }
            assert_eq!(seen, (1..=12).collect::<Vec<i64>>());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paged_by_uses_configured_page_size() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            ctx.factory().config().set_page_size(4)?;
            let page = ctx
                .mongo_users()?
                .find_paged_by(criteria! { "role": "admin" }, OrderBy::new(), None, 4)?;
            assert_eq!(page.page_size(), 4);
            assert_eq!(page.current_page(), 2);
            assert_eq!(page.len(), 2);
            assert_eq!(page.previous_page(), Some(1));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paged_by_rejects_offset_past_end() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let err = ctx
                .couch_users()?
                .find_paged_by(criteria! { "role": "admin" }, OrderBy::new(), Some(2), 40)
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::OutOfBounds);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paged_by_rejects_unaligned_offset() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let err = ctx
                .sql_users()?
                .find_paged_by(criteria! {}, OrderBy::asc("id"), Some(4), 2)
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::OutOfBounds);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paged_by_into_custom_pager() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let roster: Roster = ctx.mongo_users()?.find_paged_by_as(
                criteria! { "role": "admin" },
                OrderBy::asc("name"),
                Some(4),
                4,
            )?;
            assert_eq!(roster.names, vec!["Admin05", "Admin06"]);
            assert_eq!(roster.items().len(), 2);
            assert_eq!(roster.total_pages(), 2);
            assert!(roster.is_last_page());
            assert_eq!(roster.current_page_offset_start(), 4);
            assert_eq!(roster.previous_page(), Some(1));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_result_is_single_empty_page() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let page = ctx
                .sql_users()?
                .find_paged_by(criteria! { "role": "guest" }, OrderBy::new(), Some(10), 0)?;
            assert!(page.is_empty());
            assert_eq!(page.current_page(), 1);
            assert_eq!(page.total_pages(), 1);
            assert!(page.is_first_page() && page.is_last_page());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paginator_fetches_lazily() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            let mut paginator =
                repo.find_paginated_by(criteria! { "role": "editor" }, OrderBy::asc("id"), Some(2))?;
            assert_eq!(paginator.total_item_count()?, 5);
            assert_eq!(paginator.count()?, 3);

            paginator.set_current_page_number(3);
            let last: Vec<i64> = paginator.current_items()?.into_iter().map(|u| u.id).collect();
            assert_eq!(last, vec![11]);

            paginator.set_current_page_number(99);
            assert_eq!(paginator.current_page_number()?, 3);

            let page = paginator.page(2)?;
            assert_eq!(page.items().iter().map(|u| u.id).collect::<Vec<_>>(), vec![9, 10]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paginator_without_page_size_holds_everything() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.mongo_users()?;
            let paginator = repo.find_paginated_by(criteria! {}, OrderBy::new(), Some(-3))?;
            assert_eq!(paginator.item_count_per_page(), 0);
            assert_eq!(paginator.count()?, 1);
            assert_eq!(paginator.items_by_page(1)?.len(), 12);

            ctx.factory().config().set_items_per_page(0);
            let fresh = ctx.couch_users()?;
            let paginator = fresh.find_paginated_by(criteria! { "role": "admin" }, OrderBy::new(), None)?;
            assert_eq!(paginator.page(1)?.len(), 6);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paginated_by_or_fail() {
    run_test(
        || create_seeded_context(),
        |ctx| {
            let repo = ctx.sql_users()?;
            assert!(repo
                .find_paginated_by_or_fail(criteria! { "role": "admin" }, OrderBy::new(), None)
                .is_ok());
            let err = repo
                .find_paginated_by_or_fail(criteria! { "role": "guest" }, OrderBy::new(), None)
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
