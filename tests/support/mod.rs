//! Test doubles shared by the integration suites.
//!
//! `FakeCatalog` keeps one course per id and marks tasks `done` on submission,
//! recomputing module and course percents. Failures and fixed post-submission
//! snapshots can be scripted. `FakeRegistry` hands out `ctx-{externalUid}`
//! and records every registration. `FlakyStore` wraps [`InMemoryStore`] with
//! switchable write failures.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lernreise::{
    Caller, CatalogGateway, CourseSnapshot, CourseSummary, GatewayError, IdentityMapping,
    InMemoryStore, Instance, InstanceStore, Lernreise, ModuleSnapshot, ProgressEvent,
    Registration, RegistryGateway, RewardPolicy, StoreError, TaskSnapshot, Versioned,
};

pub type TestService = Lernreise<FlakyStore, FakeCatalog, FakeRegistry>;

/// A wired service plus handles onto its collaborators.
pub struct Fixture {
    pub service: TestService,
    pub store: FlakyStore,
    pub catalog: FakeCatalog,
    pub registry: FakeRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        let store = FlakyStore::new();
        let catalog = FakeCatalog::new();
        let registry = FakeRegistry::new();
        let service = Lernreise::new(
            store.clone(),
            catalog.clone(),
            registry.clone(),
            RewardPolicy::default(),
        );
        Self {
            service,
            store,
            catalog,
            registry,
        }
    }

    /// A fixture whose catalog already knows `course1` (see [`rust_basics`]).
    pub fn with_course() -> Self {
        let fixture = Self::new();
        fixture.catalog.add_course(rust_basics());
        fixture
    }
}

pub fn caller(user_id: &str) -> Caller {
    Caller::new(user_id).with_profile(
        format!("ext-{}", user_id),
        "Anna Maria Schmidt",
        format!("{}@example.org", user_id),
    )
}

pub fn task(id: &str, state: &str) -> TaskSnapshot {
    TaskSnapshot {
        id: id.to_string(),
        state: state.to_string(),
        name: id.to_string(),
    }
}

pub fn module(id: &str, percent: u32, tasks: Vec<TaskSnapshot>) -> ModuleSnapshot {
    ModuleSnapshot {
        id: id.to_string(),
        name: format!("Module {}", id),
        progress_percent: percent,
        tasks,
    }
}

pub fn course(id: &str, percent: u32, modules: Vec<ModuleSnapshot>) -> CourseSnapshot {
    CourseSnapshot {
        id: id.to_string(),
        name: format!("Course {}", id),
        progress_percent: percent,
        progress_label: format!("{}%", percent),
        modules,
    }
}

/// `course1` at 0%: `mod1` with `task1`, `mod2` with two tasks.
pub fn rust_basics() -> CourseSnapshot {
    course(
        "course1",
        0,
        vec![
            module("mod1", 0, vec![task("task1", "open")]),
            module("mod2", 0, vec![task("task2", "open"), task("task3", "open")]),
        ],
    )
}

fn catalog_down() -> GatewayError {
    GatewayError::Transport {
        service: "catalog",
        message: "connection refused".into(),
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Default)]
struct CatalogState {
    courses: HashMap<String, CourseSnapshot>,
    scripted: VecDeque<CourseSnapshot>,
    fail_fetch: bool,
    fail_submit: bool,
    fail_ping: bool,
    fetches: usize,
    submissions: Vec<(String, String, String, String)>,
}

#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_course(&self, snapshot: CourseSnapshot) {
        let mut state = self.state.lock().unwrap();
        state.courses.insert(snapshot.id.clone(), snapshot);
    }

    /// The next submission returns (and stores) `snapshot` instead of the
    /// computed one.
    pub fn then_submit_returns(&self, snapshot: CourseSnapshot) {
        self.state.lock().unwrap().scripted.push_back(snapshot);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetch = fail;
    }

    pub fn fail_submit(&self, fail: bool) {
        self.state.lock().unwrap().fail_submit = fail;
    }

    pub fn fail_ping(&self, fail: bool) {
        self.state.lock().unwrap().fail_ping = fail;
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    /// `(context, course, module, task)` of every accepted submission.
    pub fn submissions(&self) -> Vec<(String, String, String, String)> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn course(&self, course_id: &str) -> Option<CourseSnapshot> {
        self.state.lock().unwrap().courses.get(course_id).cloned()
    }
}

fn mark_done(snapshot: &mut CourseSnapshot, module_id: &str, task_id: &str) {
    for module in snapshot.modules.iter_mut().filter(|m| m.id == module_id) {
        for task in module.tasks.iter_mut().filter(|t| t.id == task_id) {
            task.state = "done".to_string();
        }
    }

    let mut done_total = 0;
    let mut task_total = 0;
    for module in snapshot.modules.iter_mut() {
        let done = module.tasks.iter().filter(|t| t.state == "done").count();
        if !module.tasks.is_empty() {
            module.progress_percent = (done * 100 / module.tasks.len()) as u32;
        }
        done_total += done;
        task_total += module.tasks.len();
    }
    if task_total > 0 {
        snapshot.progress_percent = (done_total * 100 / task_total) as u32;
    }
    snapshot.progress_label = format!("{}%", snapshot.progress_percent);
}

impl CatalogGateway for FakeCatalog {
    fn list_courses(&self, _context_id: &str) -> Result<Vec<CourseSummary>, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_fetch {
            return Err(catalog_down());
        }
        let mut courses: Vec<CourseSummary> = state
            .courses
            .values()
            .map(|c| CourseSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                description: String::new(),
            })
            .collect();
        courses.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(courses)
    }

    fn get_course_data(
        &self,
        _context_id: &str,
        course_id: &str,
    ) -> Result<CourseSnapshot, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        if state.fail_fetch {
            return Err(catalog_down());
        }
        state
            .courses
            .get(course_id)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                service: "catalog",
                status: 404,
                body: format!("no course {}", course_id),
            })
    }

    fn submit_task(
        &self,
        context_id: &str,
        course_id: &str,
        module_id: &str,
        task_id: &str,
    ) -> Result<CourseSnapshot, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_submit {
            return Err(GatewayError::Status {
                service: "catalog",
                status: 503,
                body: "maintenance".into(),
            });
        }

        let after = match state.scripted.pop_front() {
            Some(snapshot) => snapshot,
            None => {
                let mut snapshot = state.courses.get(course_id).cloned().ok_or_else(|| {
                    GatewayError::Status {
                        service: "catalog",
                        status: 404,
                        body: format!("no course {}", course_id),
                    }
                })?;
                mark_done(&mut snapshot, module_id, task_id);
                snapshot
            }
        };
        state.courses.insert(course_id.to_string(), after.clone());
        state.submissions.push((
            context_id.to_string(),
            course_id.to_string(),
            module_id.to_string(),
            task_id.to_string(),
        ));
        Ok(after)
    }

    fn ping(&self) -> Result<(), GatewayError> {
        if self.state.lock().unwrap().fail_ping {
            return Err(catalog_down());
        }
        Ok(())
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
struct RegistryState {
    registrations: Vec<Registration>,
    fail: bool,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct FakeRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// Sleep this long inside every registration (outside the state lock).
    pub fn delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.state.lock().unwrap().registrations.clone()
    }
}

impl RegistryGateway for FakeRegistry {
    fn register_user(&self, registration: &Registration) -> Result<String, GatewayError> {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(GatewayError::Status {
                service: "registry",
                status: 500,
                body: "registry unavailable".into(),
            });
        }
        state.registrations.push(registration.clone());
        Ok(format!("ctx-{}", registration.external_uid))
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Default)]
struct Failures {
    put_context: AtomicBool,
    insert: AtomicBool,
    update: AtomicBool,
    append: AtomicBool,
}

/// [`InMemoryStore`] with switchable write failures.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    failures: Arc<Failures>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn fail_put_context(&self, fail: bool) {
        self.failures.put_context.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert(&self, fail: bool) {
        self.failures.insert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.failures.update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_append(&self, fail: bool) {
        self.failures.append.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Storage(format!("{} failed: disk full", what)));
        }
        Ok(())
    }
}

impl InstanceStore for FlakyStore {
    fn get_context_id(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_context_id(user_id)
    }

    fn put_context_id(&self, mapping: &IdentityMapping) -> Result<(), StoreError> {
        Self::check(&self.failures.put_context, "put_context_id")?;
        self.inner.put_context_id(mapping)
    }

    fn insert_instance(&self, instance: &Instance) -> Result<Versioned<Instance>, StoreError> {
        Self::check(&self.failures.insert, "insert_instance")?;
        self.inner.insert_instance(instance)
    }

    fn get_instance(&self, id: &str) -> Result<Option<Versioned<Instance>>, StoreError> {
        self.inner.get_instance(id)
    }

    fn update_instance(
        &self,
        instance: &Instance,
        expected_version: u64,
    ) -> Result<Versioned<Instance>, StoreError> {
        Self::check(&self.failures.update, "update_instance")?;
        self.inner.update_instance(instance, expected_version)
    }

    fn get_active_instance(
        &self,
        user_id: &str,
    ) -> Result<Option<Versioned<Instance>>, StoreError> {
        self.inner.get_active_instance(user_id)
    }

    fn list_instances(&self, user_id: &str) -> Result<Vec<Instance>, StoreError> {
        self.inner.list_instances(user_id)
    }

    fn append_progress(&self, event: &ProgressEvent) -> Result<(), StoreError> {
        Self::check(&self.failures.append, "append_progress")?;
        self.inner.append_progress(event)
    }

    fn list_progress(&self, instance_id: &str) -> Result<Vec<ProgressEvent>, StoreError> {
        self.inner.list_progress(instance_id)
    }
}
