// src/store.rs
//! Dedup store: durable sets of already-used links and image URLs.
//!
//! Each set is an append-only text file with one key per line. The file is
//! re-read on every membership check, which is fine at the volume a
//! once-per-hour bot produces. Not safe for concurrent writers: two
//! overlapping runs may both pick the same item before either appends it.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const POSTED_LINKS_FILE: &str = "posted_links.txt";
pub const USED_IMAGES_FILE: &str = "used_images.txt";

/// Membership set with insert. Swap the backing store without touching callers.
pub trait KeyStore: Send {
    fn contains(&self, key: &str) -> Result<bool>;
    fn add(&mut self, key: &str) -> Result<()>;
}

/// Keys are single non-empty lines; a stray newline would split one record
/// into two in the file store.
fn checked_key(key: &str) -> Result<&str> {
    let key = key.trim();
    if key.is_empty() || key.contains(['\n', '\r']) {
        anyhow::bail!("refusing to store empty or multi-line key");
    }
    Ok(key)
}

/// Line-delimited append-only file. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Opens (and creates if needed) the backing file so permission problems
    /// surface at startup instead of halfway through a run.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating store dir {}", dir.display()))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening store {} for append", path.display()))?;
        fs::read_to_string(&path)
            .with_context(|| format!("reading store {}", path.display()))?;
        Ok(Self { path })
    }

    fn read_lines(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("reading store {}", self.path.display())),
        }
    }
}

impl KeyStore for FileKeyStore {
    fn contains(&self, key: &str) -> Result<bool> {
        let key = key.trim();
        Ok(self.read_lines()?.lines().any(|l| l.trim() == key))
    }

    fn add(&mut self, key: &str) -> Result<()> {
        let key = checked_key(key)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening store {} for append", self.path.display()))?;
        writeln!(f, "{key}").with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(())
    }
}

/// Process-local store used by tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyStore {
    keys: HashSet<String>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyStore for MemoryKeyStore {
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.keys.contains(key.trim()))
    }

    fn add(&mut self, key: &str) -> Result<()> {
        let key = checked_key(key)?;
        self.keys.insert(key.to_string());
        Ok(())
    }
}

/// Reads through to a durable store, keeps writes in memory.
pub struct OverlayKeyStore {
    base: Box<dyn KeyStore>,
    scratch: MemoryKeyStore,
}

impl OverlayKeyStore {
    pub fn new(base: Box<dyn KeyStore>) -> Self {
        Self {
            base,
            scratch: MemoryKeyStore::new(),
        }
    }
}

impl KeyStore for OverlayKeyStore {
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.scratch.contains(key)? || self.base.contains(key)?)
    }

    fn add(&mut self, key: &str) -> Result<()> {
        self.scratch.add(key)
    }
}

/// The two dedup sets a run consults.
pub struct DedupStore {
    pub links: Box<dyn KeyStore>,
    pub images: Box<dyn KeyStore>,
}

impl DedupStore {
    pub fn new(links: Box<dyn KeyStore>, images: Box<dyn KeyStore>) -> Self {
        Self { links, images }
    }

    /// File-backed store under `dir` (`posted_links.txt`, `used_images.txt`).
    pub fn open_dir(dir: &Path) -> Result<Self> {
        let links = FileKeyStore::open(dir.join(POSTED_LINKS_FILE))?;
        let images = FileKeyStore::open(dir.join(USED_IMAGES_FILE))?;
        Ok(Self::new(Box::new(links), Box::new(images)))
    }

    /// File-backed reads, in-memory writes. Used by dry runs.
    pub fn open_dir_scratch(dir: &Path) -> Result<Self> {
        let DedupStore { links, images } = Self::open_dir(dir)?;
        Ok(Self::new(
            Box::new(OverlayKeyStore::new(links)),
            Box::new(OverlayKeyStore::new(images)),
        ))
    }

    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryKeyStore::new()),
            Box::new(MemoryKeyStore::new()),
        )
    }
}
