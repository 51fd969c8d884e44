/// On-disk call-graph cache.
///
/// Computing dispatch successors for every method is the expensive part of a
/// run over a large model, and the result only depends on the model itself,
/// so it is memoized to a JSON file between runs. A cache is never trusted
/// blindly: `load` takes a validity predicate (digest equality by default)
/// and a cache that fails it, carries the wrong format version, or cannot be
/// parsed is discarded with a log line, never an aborted run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::ir::{MethodSig, Program};

use super::call_graph::CallGraph;

/// Bump when the serialized layout changes.
pub const CACHE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum CacheError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Io(e) => write!(f, "I/O error: {e}"),
            CacheError::Json(e) => write!(f, "cache encode/decode error: {e}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(e) => Some(e),
            CacheError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::Io(e)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Json(e)
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

// ---------------------------------------------------------------------------
// CallGraphCache
// ---------------------------------------------------------------------------

/// Durable successor edges, keyed by full method signature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallGraphCache {
    pub version: u32,
    /// Digest of the program the edges were computed over.
    pub program_digest: u64,
    /// Classes present when the cache was built.
    pub classes: BTreeSet<String>,
    pub edges: BTreeMap<String, Vec<MethodSig>>,
}

impl CallGraphCache {
    /// Compute edges for every modeled method that has a body.
    pub fn build(program: &Program, graph: &dyn CallGraph) -> Self {
        let mut edges = BTreeMap::new();
        for class in program.classes.values() {
            for method in &class.methods {
                if let Some(body) = &method.body {
                    let sig = method.sig(&class.name);
                    edges.insert(sig.full_signature(), graph.successors_of(body));
                }
            }
        }
        CallGraphCache {
            version: CACHE_VERSION,
            program_digest: program.digest(),
            classes: program.classes.keys().cloned().collect(),
            edges,
        }
    }

    /// Load a cache if one exists and passes `is_valid`. A missing file,
    /// unparseable file, wrong version, or failed predicate all come back as
    /// `None`; only real I/O trouble is an error.
    pub fn load(
        path: &Path,
        is_valid: impl Fn(&CallGraphCache) -> bool,
    ) -> CacheResult<Option<CallGraphCache>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no call-graph cache at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let cache: CallGraphCache = match serde_json::from_str(&text) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("discarding unreadable call-graph cache {}: {}", path.display(), e);
                return Ok(None);
            }
        };
        if cache.version != CACHE_VERSION {
            info!(
                "discarding call-graph cache {} (version {} != {})",
                path.display(),
                cache.version,
                CACHE_VERSION
            );
            return Ok(None);
        }
        if !is_valid(&cache) {
            info!("discarding stale call-graph cache {}", path.display());
            return Ok(None);
        }
        debug!(
            "loaded call-graph cache {} ({} methods)",
            path.display(),
            cache.edges.len()
        );
        Ok(Some(cache))
    }

    pub fn store(&self, path: &Path) -> CacheResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Cached successors of a method, if it was recorded.
    pub fn edges_for(&self, sig: &MethodSig) -> Option<&[MethodSig]> {
        self.edges.get(&sig.full_signature()).map(|v| v.as_slice())
    }

    /// The default validity predicate: the cache was computed over a program
    /// with this digest.
    pub fn digest_validator(digest: u64) -> impl Fn(&CallGraphCache) -> bool {
        move |cache| cache.program_digest == digest
    }
}
