//! Where asset bytes come from and where fetches run.
//!
//! An [`AssetSource`] produces raw bytes for a source identity and reports
//! byte progress as it goes. A [`FetchExecutor`] decides which thread the
//! fetch runs on. Neither ever touches the scene: results travel back to the
//! [`LoadingManager`](super::loader::LoadingManager) over a channel.

use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{anyhow, Context};
use futures::executor::ThreadPool;

/// Default read size between two progress reports.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Produces the bytes behind a source identity.
///
/// `progress(loaded, total)` may be called any number of times with the
/// running byte count. Implementations run off the tick thread.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, url: &str, progress: &mut dyn FnMut(u64, u64)) -> anyhow::Result<Vec<u8>>;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
    chunk_size: usize,
}

impl FileSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FileSource {
    fn fetch(&self, url: &str, progress: &mut dyn FnMut(u64, u64)) -> anyhow::Result<Vec<u8>> {
        let path = self.root.join(url);
        let mut file =
            File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        let total = file.metadata()?.len();

        let mut bytes = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let read = file
                .read(&mut chunk)
                .with_context(|| format!("reading {}", path.display()))?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);
            progress(bytes.len() as u64, total.max(bytes.len() as u64));
        }
        Ok(bytes)
    }
}

/// Serves assets from memory, e.g. bytes embedded with `include_bytes!`.
#[derive(Debug)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
    chunk_size: usize,
    fetches: AtomicUsize,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_asset(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn insert(&mut self, url: &str, bytes: Vec<u8>) {
        self.assets.insert(url.to_string(), bytes);
    }

    /// How many fetches have been issued against this source.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, url: &str, progress: &mut dyn FnMut(u64, u64)) -> anyhow::Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .assets
            .get(url)
            .ok_or_else(|| anyhow!("no asset named `{url}`"))?;

        let total = bytes.len() as u64;
        let chunk = self.chunk_size.max(1);
        let mut loaded = 0usize;
        while loaded < bytes.len() {
            loaded = (loaded + chunk).min(bytes.len());
            progress(loaded as u64, total);
        }
        Ok(bytes.clone())
    }
}

/// A unit of fetch work.
pub type FetchJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs fetch jobs somewhere other than the tick, or inline.
pub trait FetchExecutor {
    fn execute(&self, job: FetchJob);
}

impl FetchExecutor for ThreadPool {
    fn execute(&self, job: FetchJob) {
        self.spawn_ok(async move { job() });
    }
}

/// Runs each job immediately on the calling thread.
///
/// Results are still queued and only delivered on the next
/// [`LoadingManager::poll`](super::loader::LoadingManager::poll), so
/// callback ordering is the same as with a thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl FetchExecutor for InlineExecutor {
    fn execute(&self, job: FetchJob) {
        job();
    }
}

/// Builds the worker pool used for out-of-band loads.
///
/// `workers == 0` sizes the pool to the number of logical CPUs.
pub fn worker_pool(workers: usize) -> std::io::Result<ThreadPool> {
    let size = if workers == 0 { num_cpus::get() } else { workers };
    ThreadPool::builder()
        .pool_size(size)
        .name_prefix("thistle-loader-")
        .create()
}
