use parking_lot::Mutex;
use repokit::common::{Document, Value};
use repokit::doc;
use repokit::entity::{Entity, EntityMetadata};
use repokit::errors::{ErrorKind, RepoError, RepoResult};
use repokit::event::{
    EventListener, EventSubscriber, LifecycleEventArgs, POST_FLUSH, PRE_PERSIST,
};
use repokit::filter::QueryFilter;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SOFT_DELETE: &str = "softDelete";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub user_name: String,
    pub role: Option<String>,
    pub deleted_at: Option<String>,
    pub group: Option<i64>,
}

impl User {
    pub fn new(id: i64, name: &str, role: Option<&str>) -> Self {
        User {
            id,
            name: name.to_string(),
            user_name: name.to_lowercase(),
            role: role.map(str::to_string),
            deleted_at: None,
            group: None,
        }
    }

    pub fn deleted(mut self, at: &str) -> Self {
        self.deleted_at = Some(at.to_string());
        self
    }

    pub fn in_group(mut self, group: i64) -> Self {
        self.group = Some(group);
        self
    }
}

impl Entity for User {
    fn metadata() -> EntityMetadata {
        EntityMetadata::new("User", "id")
            .field("name")
            .field("userName")
            .field("role")
            .field("deletedAt")
            .association("group")
    }

    fn id(&self) -> Value {
        Value::from(self.id)
    }

    fn to_document(&self) -> Document {
        doc! {
            "id": self.id,
            "name": self.name.as_str(),
            "userName": self.user_name.as_str(),
            "role": self.role.clone(),
            "deletedAt": self.deleted_at.clone(),
            "group": self.group,
        }
    }
}

/// Twelve users: six admins, four editors, two without role. Ids 11 and 12
/// are soft deleted editors.
pub fn sample_users() -> Vec<User> {
    let mut users = Vec::new();
    for id in 1..=6 {
        users.push(User::new(id, &format!("Admin{:02}", id), Some("admin")).in_group(1));
    }
    for id in 7..=10 {
        users.push(User::new(id, &format!("Editor{:02}", id), Some("editor")).in_group(2));
    }
    users.push(User::new(11, "Ghost11", Some("editor")).deleted("2024-01-01"));
    users.push(User::new(12, "Ghost12", None).deleted("2024-02-01"));
    users
}

/// Hides rows with a `deletedAt` value.
pub fn soft_delete_filter() -> Arc<dyn QueryFilter> {
    Arc::new(|_: &str, document: &Document| document.get("deletedAt").is_null())
}

/// Remembers every event it receives, in order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, args: &LifecycleEventArgs) -> RepoResult<()> {
        self.events.lock().push(args.event().to_string());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Counts events without recording them.
#[derive(Default)]
pub struct CountingListener {
    count: AtomicUsize,
}

impl CountingListener {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl EventListener for CountingListener {
    fn on_event(&self, _: &LifecycleEventArgs) -> RepoResult<()> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Counts persisted users and flushes.
#[derive(Default)]
pub struct AuditSubscriber {
    persisted: AtomicUsize,
    flushes: AtomicUsize,
}

impl AuditSubscriber {
    pub fn persisted(&self) -> usize {
        self.persisted.load(Ordering::Relaxed)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl EventListener for AuditSubscriber {
    fn on_event(&self, args: &LifecycleEventArgs) -> RepoResult<()> {
        match args.event() {
            PRE_PERSIST => self.persisted.fetch_add(1, Ordering::Relaxed),
            _ => self.flushes.fetch_add(1, Ordering::Relaxed),
        };
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl EventSubscriber for AuditSubscriber {
    fn subscribed_events(&self) -> Vec<&'static str> {
        vec![PRE_PERSIST, POST_FLUSH]
    }
}

/// Rejects every flush.
pub struct VetoListener;

impl EventListener for VetoListener {
    fn on_event(&self, args: &LifecycleEventArgs) -> RepoResult<()> {
        Err(RepoError::new(
            &format!("{} vetoed", args.event()),
            ErrorKind::BackendError,
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
