//! Asynchronous texture loading with aggregate progress tracking.
//!
//! ## How it works
//!
//! 1. **Request**: [`LoadingManager::load`] returns a pending [`Texture`] at once
//!    and hands the fetch to a [`FetchExecutor`].
//! 2. **Fetch**: the job reads bytes from the [`AssetSource`], decodes them and
//!    pushes progress/result events into a channel. It never touches the scene.
//! 3. **Deliver**: [`LoadingManager::poll`], called once per tick on the
//!    scheduler thread, drains the channel, back-fills textures and fires
//!    callbacks.
//!
//! Requests for a source that is already in flight join the existing request
//! instead of fetching twice.

use std::{
    collections::HashMap,
    fmt,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    config::LoaderConfig,
    error::{LoadError, LoadErrorKind},
};

use super::{
    source::{worker_pool, AssetSource, FetchExecutor, FileSource},
    texture::{ImageData, LoadStatus, Texture},
};

/// Per-request observer callbacks.
///
/// For a successful load they fire as `start → progress* → load`, for a failed
/// one as `start → error`. Each fires at most once, except progress.
#[derive(Default)]
pub struct LoadCallbacks {
    on_start: Option<Box<dyn FnOnce(&str)>>,
    on_progress: Option<Box<dyn FnMut(u64, u64)>>,
    on_load: Option<Box<dyn FnOnce(&Texture)>>,
    on_error: Option<Box<dyn FnOnce(&LoadError)>>,
}

impl LoadCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl FnOnce(&str) + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called with `(loaded_bytes, total_bytes)`; never decreases.
    pub fn on_progress(mut self, f: impl FnMut(u64, u64) + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_load(mut self, f: impl FnOnce(&Texture) + 'static) -> Self {
        self.on_load = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&LoadError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    fn start(&mut self, url: &str) {
        if let Some(f) = self.on_start.take() {
            f(url);
        }
    }

    fn progress(&mut self, loaded: u64, total: u64) {
        if let Some(f) = self.on_progress.as_mut() {
            f(loaded, total);
        }
    }

    fn complete(mut self, texture: &Texture) {
        if let Some(f) = self.on_load.take() {
            f(texture);
        }
    }

    fn fail(mut self, err: &LoadError) {
        if let Some(f) = self.on_error.take() {
            f(err);
        }
    }
}

/// Manager-wide callbacks, fired once per fetch rather than per requester.
#[derive(Default)]
struct ManagerCallbacks {
    on_start: Option<Box<dyn FnMut(&str, usize, usize)>>,
    on_progress: Option<Box<dyn FnMut(&str, usize, usize)>>,
    on_load: Option<Box<dyn FnMut()>>,
    on_error: Option<Box<dyn FnMut(&str)>>,
}

/// Bookkeeping for one source identity.
pub struct LoadRequest {
    url: String,
    texture: Texture,
    ticket: u64,
    started_at: Instant,
    observers: Vec<LoadCallbacks>,
    loaded_bytes: u64,
    total_bytes: Option<u64>,
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("url", &self.url)
            .field("status", &self.status())
            .field("loaded_bytes", &self.loaded_bytes)
            .field("total_bytes", &self.total_bytes)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl LoadRequest {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> LoadStatus {
        self.texture.status()
    }

    /// Decoded payload, present only when loaded.
    pub fn payload(&self) -> Option<Rc<ImageData>> {
        self.texture.image()
    }

    /// Failure detail, present only when failed.
    pub fn error(&self) -> Option<LoadError> {
        self.texture.error()
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Highest byte count reported so far and the total, if known.
    pub fn progress(&self) -> (u64, Option<u64>) {
        (self.loaded_bytes, self.total_bytes)
    }
}

enum LoadEvent {
    Progress { ticket: u64, loaded: u64, total: u64 },
    Loaded { ticket: u64, image: ImageData, total: u64 },
    Failed { ticket: u64, kind: LoadErrorKind },
}

/// Tracks every load requested during a session.
pub struct LoadingManager {
    source: Arc<dyn AssetSource>,
    executor: Box<dyn FetchExecutor>,
    requests: HashMap<String, LoadRequest>,
    in_flight: HashMap<u64, String>,
    next_ticket: u64,
    started: usize,
    settled: usize,
    failed: usize,
    timeout: Option<Duration>,
    events_tx: UnboundedSender<LoadEvent>,
    events_rx: UnboundedReceiver<LoadEvent>,
    callbacks: ManagerCallbacks,
}

impl LoadingManager {
    pub fn new(source: Arc<dyn AssetSource>, executor: Box<dyn FetchExecutor>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded();
        Self {
            source,
            executor,
            requests: HashMap::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
            started: 0,
            settled: 0,
            failed: 0,
            timeout: None,
            events_tx,
            events_rx,
            callbacks: ManagerCallbacks::default(),
        }
    }

    /// File-backed manager with its own worker pool.
    pub fn from_config(config: &LoaderConfig) -> crate::Result<Self> {
        let pool = worker_pool(config.workers)?;
        log::debug!(
            "loader reading from {} with {} workers",
            config.asset_root.display(),
            config.workers
        );
        Ok(Self::new(Arc::new(FileSource::new(&config.asset_root)), Box::new(pool))
            .with_timeout(config.timeout))
    }

    /// Fail loads that have not settled after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fired when a fetch starts while nothing else was pending,
    /// with `(url, settled, started)`.
    pub fn set_on_start(&mut self, f: impl FnMut(&str, usize, usize) + 'static) {
        self.callbacks.on_start = Some(Box::new(f));
    }

    /// Fired after every settled fetch with `(url, settled, started)`.
    pub fn set_on_progress(&mut self, f: impl FnMut(&str, usize, usize) + 'static) {
        self.callbacks.on_progress = Some(Box::new(f));
    }

    /// Fired each time the pending count drops to zero, failures included.
    pub fn set_on_load(&mut self, f: impl FnMut() + 'static) {
        self.callbacks.on_load = Some(Box::new(f));
    }

    /// Fired with the url of every failed fetch.
    pub fn set_on_error(&mut self, f: impl FnMut(&str) + 'static) {
        self.callbacks.on_error = Some(Box::new(f));
    }

    /// Requests a texture without per-request callbacks.
    pub fn load_texture(&mut self, url: &str) -> Texture {
        self.load(url, LoadCallbacks::default())
    }

    /// Requests `url` and returns its placeholder texture immediately.
    ///
    /// - Pending: the callbacks join the in-flight request; no new fetch.
    /// - Loaded: start and load fire before this returns.
    /// - Failed or unknown: a new fetch is issued, reusing the same texture
    ///   handle so existing holders observe the retry.
    pub fn load(&mut self, url: &str, mut callbacks: LoadCallbacks) -> Texture {
        if let Some(request) = self.requests.get_mut(url) {
            match request.status() {
                LoadStatus::Pending => {
                    log::debug!("joining in-flight load of `{url}`");
                    callbacks.start(url);
                    request.observers.push(callbacks);
                    return request.texture.clone();
                }
                LoadStatus::Loaded => {
                    log::debug!("`{url}` already loaded");
                    let texture = request.texture.clone();
                    callbacks.start(url);
                    callbacks.complete(&texture);
                    return texture;
                }
                LoadStatus::Failed => {
                    log::debug!("retrying failed load of `{url}`");
                }
            }
        }

        let texture = match self.requests.remove(url) {
            Some(previous) => {
                previous.texture.reset();
                previous.texture
            }
            None => Texture::pending(url),
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        if self.pending() == 0 {
            if let Some(f) = self.callbacks.on_start.as_mut() {
                f(url, self.settled, self.started + 1);
            }
        }
        self.started += 1;

        callbacks.start(url);
        self.requests.insert(
            url.to_string(),
            LoadRequest {
                url: url.to_string(),
                texture: texture.clone(),
                ticket,
                started_at: Instant::now(),
                observers: vec![callbacks],
                loaded_bytes: 0,
                total_bytes: None,
            },
        );
        self.in_flight.insert(ticket, url.to_string());

        log::debug!("fetching `{url}` (ticket {ticket})");
        self.spawn_fetch(url.to_string(), ticket);
        texture
    }

    fn spawn_fetch(&self, url: String, ticket: u64) {
        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();

        self.executor.execute(Box::new(move || {
            let mut report = |loaded: u64, total: u64| {
                // The manager may be gone; nothing left to notify then.
                let _ = tx.unbounded_send(LoadEvent::Progress {
                    ticket,
                    loaded,
                    total,
                });
            };
            let event = match source.fetch(&url, &mut report) {
                Ok(bytes) => match ImageData::decode(&bytes) {
                    Ok(image) => LoadEvent::Loaded {
                        ticket,
                        image,
                        total: bytes.len() as u64,
                    },
                    Err(kind) => LoadEvent::Failed { ticket, kind },
                },
                Err(err) => LoadEvent::Failed {
                    ticket,
                    kind: LoadErrorKind::Fetch(format!("{err:#}")),
                },
            };
            let _ = tx.unbounded_send(event);
        }));
    }

    /// Delivers every queued event and expires timed-out loads.
    ///
    /// Must be called on the thread that owns the scene. Returns the number of
    /// loads that settled during this call.
    pub fn poll(&mut self) -> usize {
        let mut settled = 0;
        while let Ok(Some(event)) = self.events_rx.try_next() {
            if self.dispatch(event) {
                settled += 1;
            }
        }
        settled + self.expire()
    }

    fn dispatch(&mut self, event: LoadEvent) -> bool {
        match event {
            LoadEvent::Progress {
                ticket,
                loaded,
                total,
            } => {
                if let Some(request) = self.request_for(ticket) {
                    advance_progress(request, loaded, total);
                }
                false
            }
            LoadEvent::Loaded {
                ticket,
                image,
                total,
            } => {
                let Some(url) = self.in_flight.remove(&ticket) else {
                    return false;
                };
                let Some(request) = self.requests.get_mut(&url) else {
                    return false;
                };
                advance_progress(request, total, total);
                request.texture.fill(Rc::new(image));

                let texture = request.texture.clone();
                for observer in std::mem::take(&mut request.observers) {
                    observer.complete(&texture);
                }
                log::debug!("loaded `{url}` ({total} bytes)");
                self.settle(&url);
                true
            }
            LoadEvent::Failed { ticket, kind } => {
                let Some(url) = self.in_flight.remove(&ticket) else {
                    return false;
                };
                self.fail(&url, kind);
                true
            }
        }
    }

    fn request_for(&mut self, ticket: u64) -> Option<&mut LoadRequest> {
        let url = self.in_flight.get(&ticket)?;
        self.requests.get_mut(url)
    }

    fn fail(&mut self, url: &str, kind: LoadErrorKind) {
        let err = LoadError::new(url, kind);
        log::warn!("{err}");

        if let Some(request) = self.requests.get_mut(url) {
            request.texture.fail(err.clone());
            for observer in std::mem::take(&mut request.observers) {
                observer.fail(&err);
            }
        }
        if let Some(f) = self.callbacks.on_error.as_mut() {
            f(url);
        }
        self.failed += 1;
        self.settle(url);
    }

    fn settle(&mut self, url: &str) {
        self.settled += 1;
        if let Some(f) = self.callbacks.on_progress.as_mut() {
            f(url, self.settled, self.started);
        }
        if self.pending() == 0 {
            log::debug!(
                "all loads settled ({} ok, {} failed)",
                self.settled - self.failed,
                self.failed
            );
            if let Some(f) = self.callbacks.on_load.as_mut() {
                f();
            }
        }
    }

    fn expire(&mut self) -> usize {
        let Some(timeout) = self.timeout else {
            return 0;
        };

        let expired: Vec<(u64, String)> = self
            .in_flight
            .iter()
            .filter(|(_, url)| {
                self.requests
                    .get(*url)
                    .is_some_and(|request| request.started_at.elapsed() >= timeout)
            })
            .map(|(ticket, url)| (*ticket, url.clone()))
            .collect();

        for (ticket, url) in &expired {
            self.in_flight.remove(ticket);
            self.fail(url, LoadErrorKind::TimedOut(timeout));
        }
        expired.len()
    }

    pub fn request(&self, url: &str) -> Option<&LoadRequest> {
        self.requests.get(url)
    }

    pub fn requests(&self) -> impl Iterator<Item = &LoadRequest> {
        self.requests.values()
    }

    /// Number of distinct fetches issued since the last reset.
    pub fn started(&self) -> usize {
        self.started
    }

    /// Fetches that finished, successfully or not.
    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// The aggregate pending counter.
    pub fn pending(&self) -> usize {
        self.started - self.settled
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Forgets settled requests and restarts the counters.
    ///
    /// In-flight requests survive and are counted as freshly started.
    pub fn reset(&mut self) {
        self.requests
            .retain(|_, request| request.status() == LoadStatus::Pending);
        self.started = self.requests.len();
        self.settled = 0;
        self.failed = 0;
        log::debug!("loading manager reset, {} still pending", self.started);
    }
}

fn advance_progress(request: &mut LoadRequest, loaded: u64, total: u64) {
    if loaded <= request.loaded_bytes && request.total_bytes.is_some() {
        return;
    }
    request.loaded_bytes = loaded;
    request.total_bytes = Some(total);
    for observer in request.observers.iter_mut() {
        observer.progress(loaded, total);
    }
}
