//! Bounded evidence extraction from a local checkout.
//!
//! The evidence set is the sole basis for everything downstream: the
//! heuristic scan and the model review both see only what is collected
//! here. Bounds are enforced at construction so no later stage needs to
//! re-check sizes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use walkdir::WalkDir;

/// Maximum number of file paths sampled from a checkout.
pub const MAX_FILES: usize = 200;

/// Maximum characters kept from any single key file.
pub const MAX_KEY_FILE_CHARS: usize = 8000;

/// Serialized form of [`KeyFile::Directory`].
pub const DIRECTORY_SENTINEL: &str = "DIRECTORY_PRESENT";

/// Well-known top-level names whose presence and content are inspected.
pub const KEY_FILE_ALLOW_LIST: [&str; 10] = [
    "README.md",
    "LICENSE",
    ".env.example",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "Dockerfile",
    ".github",
    "SECURITY.md",
];

/// Path substrings that prune a subtree from the walk.
pub const SKIP_DIR_SUBSTRINGS: [&str; 7] = [
    ".git",
    "node_modules",
    "__pycache__",
    ".venv",
    "dist",
    "build",
    "target",
];

/// Size bounds for a single extraction run.
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    pub max_files: usize,
    pub max_file_chars: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        ExtractLimits {
            max_files: MAX_FILES,
            max_file_chars: MAX_KEY_FILE_CHARS,
        }
    }
}

/// Content recorded for an allow-listed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFile {
    /// The name exists but is a directory (e.g. `.github`).
    Directory,
    /// Truncated, lossily decoded file content. Empty if unreadable.
    Text(String),
}

impl KeyFile {
    /// Content as a prompt-ready string slice.
    pub fn as_str(&self) -> &str {
        match self {
            KeyFile::Directory => DIRECTORY_SENTINEL,
            KeyFile::Text(s) => s,
        }
    }
}

impl Serialize for KeyFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KeyFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == DIRECTORY_SENTINEL {
            Ok(KeyFile::Directory)
        } else {
            Ok(KeyFile::Text(s))
        }
    }
}

/// The bounded snapshot of repository structure and key-file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    /// Relative file paths in discovery order, at most `max_files` entries.
    pub files: Vec<String>,
    /// Allow-listed names found at the top level.
    pub key_files: BTreeMap<String, KeyFile>,
}

impl EvidenceSet {
    /// Names of the key files that were found, in map order.
    pub fn key_files_found(&self) -> Vec<String> {
        self.key_files.keys().cloned().collect()
    }

    pub fn has_key_file(&self, name: &str) -> bool {
        self.key_files.contains_key(name)
    }
}

/// Walk `root` and build an [`EvidenceSet`].
///
/// Never fails: missing key files are omitted and unreadable ones degrade
/// to an empty string. The walk is sorted by file name so the sampled
/// listing is deterministic for a fixed tree.
pub fn extract_evidence(root: &Path, limits: &ExtractLimits) -> EvidenceSet {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            // Substring match on the path inside the checkout, never on the
            // scratch prefix above it.
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .into_owned();
            !SKIP_DIR_SUBSTRINGS.iter().any(|skip| rel.contains(skip))
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if files.len() >= limits.max_files {
            break;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(rel.to_string_lossy().into_owned());
        }
    }

    let mut key_files = BTreeMap::new();
    for name in KEY_FILE_ALLOW_LIST {
        let path = root.join(name);
        if path.is_dir() {
            key_files.insert(name.to_string(), KeyFile::Directory);
        } else if path.is_file() {
            let text = read_truncated(&path, limits.max_file_chars);
            key_files.insert(name.to_string(), KeyFile::Text(text));
        }
    }

    EvidenceSet { files, key_files }
}

/// Read a file, substituting invalid UTF-8, keeping at most `max_chars`.
fn read_truncated(path: &Path, max_chars: usize) -> String {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(_) => return String::new(),
    };
    let text = String::from_utf8_lossy(&bytes);
    truncate_chars(&text, max_chars)
}

/// Keep at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
