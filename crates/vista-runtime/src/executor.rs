#![forbid(unsafe_code)]

//! Thread-per-request loader execution.
//!
//! Every [`LoadRequest`] gets its own named thread. The thread runs the
//! loader, catches a panic if there is one, and sends the outcome on an mpsc
//! channel. [`LoadExecutor::pump`] drains that channel into
//! [`CollectionView::complete_load`] and joins finished threads.
//!
//! The view admits one request at a time, so at most one loader thread is
//! live per view unless a request was superseded while still running.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use vista_widgets::{
    CollectionView, ItemRenderer, Keyed, LoadError, LoadOutcome, LoadRequest, LoadTicket, Page,
};

/// Fetches one page. Runs on a background thread.
pub trait PageLoader<T>: Send + Sync + 'static {
    /// Error reported back through [`LoadError::Fetch`].
    type Error: Send + 'static;

    /// Fetch the page starting at `request.offset`.
    fn load(&self, request: &LoadRequest) -> Result<Page<T>, Self::Error>;
}

impl<T, E, F> PageLoader<T> for F
where
    F: Fn(&LoadRequest) -> Result<Page<T>, E> + Send + Sync + 'static,
    E: Send + 'static,
{
    type Error = E;

    fn load(&self, request: &LoadRequest) -> Result<Page<T>, E> {
        self(request)
    }
}

/// Failures of the executor itself, as opposed to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// No completion arrived within the wait.
    Timeout(Duration),
    /// Every sender is gone; nothing can complete.
    Disconnected,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(after) => write!(f, "no page load completed within {after:?}"),
            Self::Disconnected => write!(f, "page loader channel disconnected"),
        }
    }
}

impl std::error::Error for RuntimeError {}

enum Outcome<T, E> {
    Finished(Result<Page<T>, E>),
    Panicked(String),
}

struct Completion<T, E> {
    ticket: LoadTicket,
    outcome: Outcome<T, E>,
}

/// What one [`LoadExecutor::pump`] call did.
#[derive(Debug)]
pub struct PumpReport<E> {
    /// Pages appended to the catalog.
    pub applied: usize,
    /// Stale results dropped.
    pub discarded: usize,
    /// Panic messages from loader threads that panicked or could not be
    /// spawned, in arrival order. Each one released the trigger.
    pub panics: Vec<String>,
    /// Loader errors, in arrival order.
    pub failures: Vec<LoadError<E>>,
}

impl<E> Default for PumpReport<E> {
    fn default() -> Self {
        Self {
            applied: 0,
            discarded: 0,
            panics: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<E> PumpReport<E> {
    /// Whether nothing arrived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.discarded == 0 && self.panics.is_empty() && self.failures.is_empty()
    }
}

type Handles = Rc<RefCell<Vec<JoinHandle<()>>>>;

/// Starts loader threads. Cloned into a view's `on_load_more` callback.
pub struct LoadSpawner<T, L: PageLoader<T>> {
    loader: Arc<L>,
    sender: mpsc::Sender<Completion<T, L::Error>>,
    handles: Handles,
}

impl<T, L: PageLoader<T>> Clone for LoadSpawner<T, L> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            sender: self.sender.clone(),
            handles: Rc::clone(&self.handles),
        }
    }
}

impl<T, L> LoadSpawner<T, L>
where
    T: Send + 'static,
    L: PageLoader<T>,
{
    /// Run the loader for `request` on a new thread.
    pub fn spawn(&self, request: &LoadRequest) {
        let request = *request;
        let loader = Arc::clone(&self.loader);
        let sender = self.sender.clone();

        let spawned = thread::Builder::new()
            .name(format!("vista-load-{}", request.ticket))
            .spawn(move || {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| loader.load(&request))) {
                    Ok(result) => Outcome::Finished(result),
                    Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
                };
                let _ = sender.send(Completion {
                    ticket: request.ticket,
                    outcome,
                });
            });

        match spawned {
            Ok(handle) => {
                vista_core::debug!(ticket = %request.ticket, offset = request.offset, "loader spawned");
                self.handles.borrow_mut().push(handle);
            }
            Err(err) => {
                vista_core::error!(ticket = %request.ticket, error = %err, "failed to spawn loader thread");
                let _ = self.sender.send(Completion {
                    ticket: request.ticket,
                    outcome: Outcome::Panicked(format!("failed to spawn loader thread: {err}")),
                });
            }
        }
    }
}

/// Owns the completion channel and the loader threads.
pub struct LoadExecutor<T, L: PageLoader<T>> {
    spawner: LoadSpawner<T, L>,
    receiver: mpsc::Receiver<Completion<T, L::Error>>,
}

impl<T, L> LoadExecutor<T, L>
where
    T: Keyed + Send + 'static,
    L: PageLoader<T>,
{
    /// Create an executor around `loader`.
    pub fn new(loader: L) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            spawner: LoadSpawner {
                loader: Arc::new(loader),
                sender,
                handles: Rc::new(RefCell::new(Vec::new())),
            },
            receiver,
        }
    }

    /// A handle that starts loads from inside a callback.
    #[must_use]
    pub fn spawner(&self) -> LoadSpawner<T, L> {
        self.spawner.clone()
    }

    /// Route `view`'s load requests to this executor.
    pub fn attach<R>(&self, view: &mut CollectionView<T, R>)
    where
        R: ItemRenderer<T>,
    {
        let spawner = self.spawner();
        view.set_on_load_more(move |request| spawner.spawn(request));
    }

    /// Apply every completion that has arrived, without blocking.
    pub fn pump<R>(&mut self, view: &mut CollectionView<T, R>) -> PumpReport<L::Error>
    where
        R: ItemRenderer<T>,
    {
        let mut report = PumpReport::default();
        self.drain(view, &mut report);
        self.reap_finished();
        report
    }

    /// Block until at least one completion arrives (or `timeout` passes),
    /// then apply it and everything else already queued.
    pub fn wait<R>(
        &mut self,
        view: &mut CollectionView<T, R>,
        timeout: Duration,
    ) -> Result<PumpReport<L::Error>, RuntimeError>
    where
        R: ItemRenderer<T>,
    {
        let first = self.receiver.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => RuntimeError::Timeout(timeout),
            RecvTimeoutError::Disconnected => RuntimeError::Disconnected,
        })?;
        let mut report = PumpReport::default();
        apply(view, first, &mut report);
        self.drain(view, &mut report);
        self.reap_finished();
        Ok(report)
    }

    /// Threads started and not yet joined.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.spawner.handles.borrow().len()
    }

    /// Join every loader thread. Their results stay queued for the next pump.
    pub fn join_all(&mut self) {
        let handles: Vec<JoinHandle<()>> = self.spawner.handles.borrow_mut().drain(..).collect();
        for handle in handles {
            log_join(handle);
        }
    }

    fn drain<R>(&mut self, view: &mut CollectionView<T, R>, report: &mut PumpReport<L::Error>)
    where
        R: ItemRenderer<T>,
    {
        loop {
            match self.receiver.try_recv() {
                Ok(completion) => apply(view, completion, report),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    fn reap_finished(&mut self) {
        let mut handles = self.spawner.handles.borrow_mut();
        if handles.is_empty() {
            return;
        }
        let mut remaining = Vec::with_capacity(handles.len());
        for handle in handles.drain(..) {
            if handle.is_finished() {
                log_join(handle);
            } else {
                remaining.push(handle);
            }
        }
        *handles = remaining;
    }
}

fn apply<T, R, E>(
    view: &mut CollectionView<T, R>,
    completion: Completion<T, E>,
    report: &mut PumpReport<E>,
) where
    T: Keyed,
    R: ItemRenderer<T>,
{
    let ticket = completion.ticket;
    match completion.outcome {
        Outcome::Finished(result) => match view.complete_load(ticket, result) {
            Ok(LoadOutcome::Applied { .. }) => report.applied += 1,
            Ok(LoadOutcome::Discarded { .. }) => report.discarded += 1,
            Err(err) => report.failures.push(err),
        },
        Outcome::Panicked(message) => {
            vista_core::error!(ticket = %ticket, message = %message, "page loader panicked");
            if view.abandon_load(ticket) {
                report.panics.push(message);
            } else {
                report.discarded += 1;
            }
        }
    }
}

fn log_join(handle: JoinHandle<()>) {
    // Loader panics are caught inside the thread; this only fires if the
    // completion send itself panicked.
    if handle.join().is_err() {
        vista_core::error!("loader thread panicked after its result was sent");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
