//! Whole-program analyses: the dispatch oracle, reachability pruning, and
//! the on-disk call-graph cache.

pub mod cache;
pub mod call_graph;
pub mod reachability;

pub use cache::{CacheError, CacheResult, CallGraphCache, CACHE_VERSION};
pub use call_graph::{CallGraph, ClassHierarchyGraph};
pub use reachability::{
    compulsory_roots, prune, Element, OverrideSet, PruneLevel, ReachableSets, Required,
};
