//! Dictionary bundle discovery
//!
//! A bundle is one dictionary's files on disk: a single `.mdx` main file plus
//! any number of `.mdd` resource archives sitting next to it. Two layouts are
//! accepted under the configured root:
//!
//! ```text
//! root/                         root/
//! ├── Oxford/                   ├── oaldpe.mdx
//! │   ├── oaldpe.mdx            └── oaldpe.mdd
//! │   ├── oaldpe.mdd
//! │   └── oaldpe.1.mdd
//! └── Collins/
//!     └── collins.mdx
//! ```
//!
//! The nested layout (left) is tried first; the flat layout (right) is the
//! fallback when no subdirectory holds a dictionary. Entries are visited in
//! lexical order of their names, so the registry order, and with it the port
//! each dictionary gets, does not depend on the file system's listing order.

use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Extension of the file that makes a directory a bundle
pub const MAIN_EXTENSION: &str = "mdx";

/// Extension of the resource archives belonging to a bundle
pub const AUX_EXTENSION: &str = "mdd";

/// Errors that can occur while scanning for bundles
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("More than one .mdx file in {}: {first} and {second}", dir.display())]
    AmbiguousMainFile {
        dir: PathBuf,
        first: String,
        second: String,
    },

    #[error("No .mdx dictionary found under {}", root.display())]
    NoBundles { root: PathBuf },
}

/// One dictionary's on-disk file set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    /// Directory holding the files
    pub root: PathBuf,

    /// Main `.mdx` file name, empty when the directory is not a bundle
    pub main_file: String,

    /// `.mdd` file names in lexical order
    pub aux_files: Vec<String>,
}

impl Bundle {
    fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            main_file: String::new(),
            aux_files: Vec::new(),
        }
    }

    /// A bundle is valid iff it has a main file
    pub fn is_valid(&self) -> bool {
        !self.main_file.is_empty()
    }

    /// Display name: the directory's final component
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// Absolute location of the main file
    pub fn main_path(&self) -> PathBuf {
        self.root.join(&self.main_file)
    }

    /// Absolute locations of the resource archives
    pub fn aux_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.aux_files.iter().map(|f| self.root.join(f))
    }
}

/// Immutable, ordered set of bundles discovered at startup
#[derive(Debug, Clone)]
pub struct BundleRegistry {
    root: PathBuf,
    bundles: Vec<Bundle>,
}

impl BundleRegistry {
    /// Scan `root` and refuse an empty result
    pub fn discover(root: &Path) -> Result<Self, DiscoveryError> {
        let bundles = scan(root)?;
        if bundles.is_empty() {
            return Err(DiscoveryError::NoBundles {
                root: root.to_path_buf(),
            });
        }

        tracing::info!(root = %root.display(), count = bundles.len(), "Dictionaries discovered");
        for bundle in &bundles {
            tracing::debug!(
                dir = %bundle.root.display(),
                mdx = %bundle.main_file,
                mdd = ?bundle.aux_files,
                "Bundle"
            );
        }

        Ok(Self {
            root: root.to_path_buf(),
            bundles,
        })
    }

    /// Root the registry was built from
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Deref for BundleRegistry {
    type Target = [Bundle];

    fn deref(&self) -> &[Bundle] {
        &self.bundles
    }
}

/// Find every bundle under `root`.
///
/// Returns an empty vector when nothing qualifies; callers decide whether
/// that is fatal.
pub fn scan(root: &Path) -> Result<Vec<Bundle>, DiscoveryError> {
    let meta = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DiscoveryError::DirectoryNotFound {
            path: root.to_path_buf(),
        },
        _ => DiscoveryError::Unreadable {
            path: root.to_path_buf(),
            source: e,
        },
    })?;
    if !meta.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut bundles = Vec::new();
    for dir in sorted_entries(root)?
        .into_iter()
        .filter(|p| fs::metadata(p).map(|m| m.is_dir()).unwrap_or(false))
    {
        let bundle = detect(&dir)?;
        if bundle.is_valid() {
            bundles.push(bundle);
        }
    }

    if bundles.is_empty() {
        let bundle = detect(root)?;
        if bundle.is_valid() {
            bundles.push(bundle);
        }
    }

    Ok(bundles)
}

/// Classify the regular files directly inside `dir`.
///
/// Subdirectories are ignored. The result may be invalid (no main file).
pub fn detect(dir: &Path) -> Result<Bundle, DiscoveryError> {
    let mut bundle = Bundle::empty(dir);

    for path in sorted_entries(dir)? {
        if !fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some(MAIN_EXTENSION) => {
                if bundle.is_valid() {
                    return Err(DiscoveryError::AmbiguousMainFile {
                        dir: dir.to_path_buf(),
                        first: bundle.main_file,
                        second: name,
                    });
                }
                bundle.main_file = name;
            }
            Some(AUX_EXTENSION) => bundle.aux_files.push(name),
            _ => {}
        }
    }

    Ok(bundle)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let unreadable = |source| DiscoveryError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(unreadable)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(unreadable)?;
    entries.sort();
    Ok(entries)
}
