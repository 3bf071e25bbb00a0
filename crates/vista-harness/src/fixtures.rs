#![forbid(unsafe_code)]

//! Fixtures for driving collection views in tests.
//!
//! - [`Project`]: a dashboard record with a stable `u64` id
//! - [`RecordingRenderer`]: keeps a log of every create and update
//! - [`ScriptedLoader`]: pages over a fixed-size backend, with scripted failures
//! - [`RequestQueue`]: captures `on_load_more` calls so a test can answer them
//!   synchronously

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use vista_runtime::PageLoader;
use vista_widgets::{
    CollectionView, ItemRenderer, Keyed, LoadError, LoadOutcome, LoadRequest, Page,
};

const OWNERS: [&str; 4] = ["ana", "bo", "chidi", "dara"];

/// Lifecycle state of a [`Project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
}

/// A project record as the dashboard receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub owner: String,
    pub status: ProjectStatus,
    pub starred: bool,
}

impl Project {
    /// A deterministic project for `id`.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("Project {id}"),
            owner: OWNERS[(id % OWNERS.len() as u64) as usize].to_owned(),
            status: ProjectStatus::Active,
            starred: false,
        }
    }

    /// One project per id in `ids`.
    pub fn batch(ids: Range<u64>) -> Vec<Self> {
        ids.map(Self::new).collect()
    }
}

impl Keyed for Project {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Node produced by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCard {
    pub project_id: u64,
    pub title: String,
    pub selected: bool,
}

/// Whether a draw built a node or rewrote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Create,
    Update,
}

/// One renderer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub kind: DrawKind,
    pub project_id: u64,
    pub selected: bool,
}

/// Renders [`ProjectCard`]s and records every call.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    draws: Vec<Draw>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every draw since creation or the last [`RecordingRenderer::take`].
    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    /// Nodes built from scratch.
    pub fn created(&self) -> usize {
        self.count(DrawKind::Create)
    }

    /// Nodes rewritten in place.
    pub fn updated(&self) -> usize {
        self.count(DrawKind::Update)
    }

    /// Draws for one project, oldest first.
    pub fn draws_of(&self, project_id: u64) -> Vec<&Draw> {
        self.draws
            .iter()
            .filter(|draw| draw.project_id == project_id)
            .collect()
    }

    /// Drain the log.
    pub fn take(&mut self) -> Vec<Draw> {
        std::mem::take(&mut self.draws)
    }

    fn count(&self, kind: DrawKind) -> usize {
        self.draws.iter().filter(|draw| draw.kind == kind).count()
    }

    fn record(&mut self, kind: DrawKind, project: &Project, selected: bool) {
        self.draws.push(Draw {
            kind,
            project_id: project.id,
            selected,
        });
    }
}

impl ItemRenderer<Project> for RecordingRenderer {
    type Node = ProjectCard;

    fn create(&mut self, item: &Project, selected: bool) -> ProjectCard {
        self.record(DrawKind::Create, item, selected);
        ProjectCard {
            project_id: item.id,
            title: item.name.clone(),
            selected,
        }
    }

    fn update(&mut self, node: &mut ProjectCard, item: &Project, selected: bool) {
        self.record(DrawKind::Update, item, selected);
        node.project_id = item.id;
        node.title.clone_from(&item.name);
        node.selected = selected;
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Error returned for a scripted failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub offset: usize,
    pub attempt: usize,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scripted failure at offset {} (attempt {})",
            self.offset, self.attempt
        )
    }
}

impl std::error::Error for LoadFailure {}

/// Pages over `total` projects, `page_size` at a time.
///
/// Every request is recorded. Offsets registered with
/// [`ScriptedLoader::fail_once_at`] fail on their first request and succeed
/// afterwards.
#[derive(Debug)]
pub struct ScriptedLoader {
    total: u64,
    page_size: u64,
    failures: Mutex<Vec<usize>>,
    requests: Mutex<Vec<LoadRequest>>,
}

impl ScriptedLoader {
    /// Serve ids `0..total` in pages of `page_size` (at least 1).
    pub fn new(total: u64, page_size: u64) -> Self {
        Self {
            total,
            page_size: page_size.max(1),
            failures: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first request for `offset`.
    #[must_use]
    pub fn fail_once_at(mut self, offset: usize) -> Self {
        self.failures
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(offset);
        self
    }

    /// Answer `request` synchronously.
    pub fn respond(&self, request: &LoadRequest) -> Result<Page<Project>, LoadFailure> {
        let attempt = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(*request);
            requests.iter().filter(|r| r.offset == request.offset).count()
        };

        {
            let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(pos) = failures.iter().position(|&offset| offset == request.offset) {
                failures.swap_remove(pos);
                return Err(LoadFailure {
                    offset: request.offset,
                    attempt,
                });
            }
        }

        let start = (request.offset as u64).min(self.total);
        let end = (start + self.page_size).min(self.total);
        Ok(Page {
            items: Project::batch(start..end),
            has_more: end < self.total,
        })
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<LoadRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

/// Number of loads served so far, failures included.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PageLoader<Project> for ScriptedLoader {
    type Error = LoadFailure;

    fn load(&self, request: &LoadRequest) -> Result<Page<Project>, LoadFailure> {
        self.respond(request)
    }
}

// ============================================================================
// Request queue
// ============================================================================

/// Collects the requests a view issues so a test can answer them in its own
/// order.
#[derive(Debug, Clone, Default)]
pub struct RequestQueue {
    pending: Rc<RefCell<VecDeque<LoadRequest>>>,
    total: Rc<Cell<usize>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `view`'s `on_load_more` into this queue.
    pub fn attach<T, R>(&self, view: &mut CollectionView<T, R>)
    where
        T: Keyed,
        R: ItemRenderer<T>,
    {
        let queue = self.clone();
        view.set_on_load_more(move |request| {
            queue.pending.borrow_mut().push_back(*request);
            queue.total.set(queue.total.get() + 1);
        });
    }

    /// Requests not yet popped.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Requests ever received.
    pub fn total(&self) -> usize {
        self.total.get()
    }

    /// Oldest unanswered request.
    pub fn pop(&self) -> Option<LoadRequest> {
        self.pending.borrow_mut().pop_front()
    }

    /// Pop the oldest request, answer it with `loader`, and hand the result
    /// to `view`.
    pub fn serve_next<R>(
        &self,
        view: &mut CollectionView<Project, R>,
        loader: &ScriptedLoader,
    ) -> Option<Result<LoadOutcome, LoadError<LoadFailure>>>
    where
        R: ItemRenderer<Project>,
    {
        let request = self.pop()?;
        Some(view.complete_load(request.ticket, loader.respond(&request)))
    }
}
