//! Whole-program translation of JVM-style class models into C.
//!
//! The pipeline prunes a class model down to what one entry class can
//! actually reach, then lowers every surviving class to its own C
//! translation unit: a class structure carrying a function-pointer method
//! table, an instance structure mirroring the inheritance chain, and
//! function bodies lowered unit by unit.

use std::fs;
use std::path::Path;

#[macro_use]
extern crate bitflags;

pub mod analysis;
pub mod codegen;
pub mod ir;

pub use analysis::PruneLevel;
pub use codegen::{
    generate, CompileMode, GenError, GenResult, GenSummary, Options, TargetPlatform,
};
pub use ir::Program;

/// Load a program model from its JSON serialization.
///
/// ```no_run
/// let program = class2c::load_program("model.json").unwrap();
/// println!("{} classes modeled", program.classes.len());
/// ```
pub fn load_program(path: impl AsRef<Path>) -> GenResult<Program> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
