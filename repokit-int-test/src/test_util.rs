use crate::fixtures::{sample_users, soft_delete_filter, User, SOFT_DELETE};
use repokit::backend::{CouchRepository, MongoRepository, SqlRepository};
use repokit::criteria::QueryTranslator;
use repokit::errors::RepoResult;
use repokit::repository::{Repository, RepositoryFactory};
use repokit::repository_builder::RepositoryBuilder;
use repokit::session::{PersistenceSession, SessionContext};
use std::backtrace::Backtrace;
use std::time::Instant;

/// Runs `before`, then `test`, then `after`, reporting errors and panics with
/// the phase they happened in. `after` also runs when `test` fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> RepoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> RepoResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> RepoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();
    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", message), String::new())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed. Last error: {}", error);
}

/// One session context plus the factory handing out its repositories.
#[derive(Clone)]
pub struct TestContext {
    session: SessionContext,
    factory: RepositoryFactory,
}

impl TestContext {
    pub fn new(session: SessionContext, factory: RepositoryFactory) -> Self {
        Self { session, factory }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn factory(&self) -> &RepositoryFactory {
        &self.factory
    }

    pub fn sql_users(&self) -> RepoResult<SqlRepository<User>> {
        self.factory.sql_repository(&self.session)
    }

    pub fn mongo_users(&self) -> RepoResult<MongoRepository<User>> {
        self.factory.mongo_repository(&self.session)
    }

    pub fn couch_users(&self) -> RepoResult<CouchRepository<User>> {
        self.factory.couch_repository(&self.session)
    }
}

/// Fresh session with the soft delete filter registered, disabled.
pub fn create_test_context() -> RepoResult<TestContext> {
    let factory = RepositoryBuilder::new().factory()?;
    Ok(TestContext::new(new_session(), factory))
}

pub fn create_auto_flush_context() -> RepoResult<TestContext> {
    let factory = RepositoryBuilder::new().auto_flush(true).factory()?;
    Ok(TestContext::new(new_session(), factory))
}

/// Fresh session whose `User` repository already holds [`sample_users`].
pub fn create_seeded_context() -> RepoResult<TestContext> {
    let ctx = create_test_context()?;
    seed_users(&ctx.sql_users()?)?;
    Ok(ctx)
}

pub fn seed_users<Tr, S>(repository: &Repository<User, Tr, S>) -> RepoResult<()>
where
    Tr: QueryTranslator,
    S: PersistenceSession<User, Query = Tr::Query>,
{
    repository.add(sample_users(), true)
}

pub fn cleanup(ctx: TestContext) -> RepoResult<()> {
    log::debug!(
        "Dropping {} cached repositories of session {}",
        ctx.factory().len(),
        ctx.session().id()
    );
    ctx.factory().clear();
    Ok(())
}

fn new_session() -> SessionContext {
    let session = SessionContext::new();
    session.filters().register(SOFT_DELETE, soft_delete_filter());
    session
}
