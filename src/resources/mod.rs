//! # Static Resources
//! src/resources/mod.rs
//!
//! Files under the public directory are read once at startup and kept in
//! memory. After the server starts the store is only read, so every worker
//! shares it without locking.
//!
//! ```text
//! ./public/index.html      →  /index.html
//! ./public/css/style.css   →  /css/style.css
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// MIME type for unknown extensions
pub use crate::http::writer::MIME_ANY;

const MIME_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("pdf", "application/pdf"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

/// MIME type from the final extension of a file name
///
/// # Example
/// ```
/// use tippy::resources::mime_for;
///
/// assert_eq!(mime_for("index.HTML"), "text/html");
/// assert_eq!(mime_for("archive.tar.gz"), "*/*");
/// assert_eq!(mime_for("README"), "*/*");
/// ```
pub fn mime_for(file_name: &str) -> &'static str {
    let Some(extension) = Path::new(file_name).extension().and_then(|ext| ext.to_str()) else {
        return MIME_ANY;
    };

    MIME_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
        .unwrap_or(MIME_ANY)
}

/// One file loaded into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResource {
    data: Vec<u8>,
    mime: &'static str,
    modified: i64,
}

impl StaticResource {
    pub fn new(data: Vec<u8>, mime: &'static str, modified: i64) -> Self {
        Self { data, mime, modified }
    }

    /// Reads a file and stamps it with its modification time
    pub fn load(path: &Path) -> io::Result<Self> {
        let data = fs::read(path)?;
        let modified = fs::metadata(path)?
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_secs() as i64)
            .unwrap_or(0);
        let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();

        Ok(Self::new(data, mime_for(file_name), modified))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime
    }

    pub fn content_length(&self) -> usize {
        self.data.len()
    }

    /// Last modification, seconds since the epoch (UTC)
    pub fn modified(&self) -> i64 {
        self.modified
    }
}

/// Request path → resource, with alias paths sharing one entry
#[derive(Debug, Default)]
pub struct ResourceStore {
    indexes: HashMap<String, usize>,
    resources: Vec<StaticResource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every file below `dir`, recursively
    pub fn load(dir: &Path) -> io::Result<Self> {
        let mut store = Self::new();
        store.scan(dir, "")?;
        Ok(store)
    }

    fn scan(&mut self, dir: &Path, prefix: &str) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let name = entry.file_name().to_string_lossy().to_string();
            let request_path = format!("{}/{}", prefix, name);

            if file_type.is_dir() {
                self.scan(&entry.path(), &request_path)?;
            } else if file_type.is_file() {
                self.insert(&request_path, StaticResource::load(&entry.path())?);
            }
        }

        Ok(())
    }

    /// Adds a resource under its primary path
    pub fn insert(&mut self, path: &str, resource: StaticResource) {
        self.resources.push(resource);
        self.indexes.insert(path.to_string(), self.resources.len() - 1);
    }

    /// Makes `paths[1..]` resolve to the resource indexed under `paths[0]`
    ///
    /// Returns `false` when `paths` is empty or the primary path is unknown.
    pub fn register_aliases(&mut self, paths: &[&str]) -> bool {
        let Some((primary, aliases)) = paths.split_first() else {
            return false;
        };

        let Some(&index) = self.indexes.get(*primary) else {
            return false;
        };

        for alias in aliases {
            self.indexes.insert(alias.to_string(), index);
        }

        true
    }

    pub fn lookup(&self, path: &str) -> Option<&StaticResource> {
        self.indexes.get(path).map(|&index| &self.resources[index])
    }

    /// Every path the store answers to, aliases included
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(|path| path.as_str())
    }

    /// Number of distinct resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
