//! C code generation: naming, per-class layout, statement lowering, and the
//! per-run driver that writes header/body/build files.

pub mod code;
pub mod driver;
pub mod exceptions;
pub mod header;
pub mod lower;
pub mod main_file;
pub mod makefile;
pub mod method_lists;
pub mod names;
pub mod overrides;
pub mod structs;

use std::fmt;
use std::path::PathBuf;

use crate::analysis::PruneLevel;
use crate::ir::{MethodSig, ModelError};

pub use driver::{generate, GenContext, GenSummary};
pub use names::NamingContext;

#[derive(Debug)]
pub enum GenError {
    /// Two class initializers in one class: malformed input.
    DuplicateClassInitializer { class: String },
    /// A branch targets a unit that was never registered as a label.
    UnknownBranchTarget { method: String, target: usize },
    /// A body references a local its method never declared.
    UnknownLocal { method: String, local: String },
    ClassNotModeled { name: String },
    /// The entry class does not declare the standard entry method.
    MissingEntryPoint { class: String },
    Model(ModelError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::DuplicateClassInitializer { class } => {
                write!(f, "class {} has more than one class initializer", class)
            }
            GenError::UnknownBranchTarget { method, target } => {
                write!(f, "unit {} in {} is not a branch target", target, method)
            }
            GenError::UnknownLocal { method, local } => {
                write!(f, "undeclared local '{}' in {}", local, method)
            }
            GenError::ClassNotModeled { name } => {
                write!(f, "class {} is not in the model", name)
            }
            GenError::MissingEntryPoint { class } => {
                write!(f, "class {} declares no main([Ljava/lang/String;)V", class)
            }
            GenError::Model(e) => write!(f, "model error: {e}"),
            GenError::Io(e) => write!(f, "I/O error: {e}"),
            GenError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenError::Model(e) => Some(e),
            GenError::Io(e) => Some(e),
            GenError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for GenError {
    fn from(e: ModelError) -> Self {
        GenError::Model(e)
    }
}

impl From<std::io::Error> for GenError {
    fn from(e: std::io::Error) -> Self {
        GenError::Io(e)
    }
}

impl From<serde_json::Error> for GenError {
    fn from(e: serde_json::Error) -> Self {
        GenError::Json(e)
    }
}

pub type GenResult<T> = Result<T, GenError>;

/// Full builds the whole reachable hierarchy; single-class compiles one
/// class with no cross-class references, for fast diagnostic iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompileMode {
    #[default]
    Full,
    SingleClass,
}

/// Build-file flavor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetPlatform {
    #[default]
    Unix,
    C6x,
}

/// Everything a generation run can be configured with.
#[derive(Clone, Debug)]
pub struct Options {
    pub mode: CompileMode,
    pub prune_level: PruneLevel,
    pub target: TargetPlatform,
    pub output_dir: PathBuf,
    /// Where the runtime support sources live; recorded in the makefile.
    pub runtime_dir: PathBuf,
    /// Directory probed for hand-written method bodies.
    pub overrides_dir: Option<PathBuf>,
    /// Call-graph cache location; no caching when absent.
    pub cache_path: Option<PathBuf>,
    /// Extra pruning roots on top of the built-in compulsory set.
    pub extra_roots: Vec<MethodSig>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            mode: CompileMode::Full,
            prune_level: PruneLevel::CallGraph,
            target: TargetPlatform::Unix,
            output_dir: PathBuf::from("."),
            runtime_dir: PathBuf::from("runtime"),
            overrides_dir: None,
            cache_path: None,
            extra_roots: Vec::new(),
        }
    }
}
