/// Per-run orchestration: scan overrides, prune, then write every generated
/// file for the reachable set.
///
/// A failed write is reported and counted but does not stop the run; the
/// binary turns a nonzero failure count into its exit status. Errors from
/// generation itself (malformed model input) abort, since the remaining
/// output would be wrong anyway.

use std::fs;

use log::{debug, error, info, warn};

use crate::analysis::{prune, CallGraphCache, ClassHierarchyGraph, PruneLevel, Required};
use crate::ir::Program;

use super::code::CodeGenerator;
use super::header::HeaderGenerator;
use super::main_file::MainFileGenerator;
use super::makefile::MakefileGenerator;
use super::method_lists::MethodListBuilder;
use super::names::NamingContext;
use super::overrides::OverrideScanner;
use super::structs::StructGenerator;
use super::{CompileMode, GenError, GenResult, Options};

/// What one run covered and produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenSummary {
    pub classes: usize,
    pub methods: usize,
    pub fields: usize,
    pub files_written: usize,
    pub files_failed: usize,
}

/// One generation run's fixed inputs: the model, the resolved reachable
/// set, and the naming context every emitted identifier comes from.
pub struct GenContext<'a> {
    program: &'a Program,
    options: &'a Options,
    root_class: String,
    names: NamingContext,
    required: Required,
    reachable: Vec<String>,
}

impl<'a> GenContext<'a> {
    pub fn new(program: &'a Program, root_class: &str, options: &'a Options) -> GenResult<Self> {
        if !program.contains_class(root_class) {
            return Err(GenError::ClassNotModeled {
                name: root_class.to_string(),
            });
        }
        let names = NamingContext::new();
        let overrides =
            OverrideScanner::new(&names, options.overrides_dir.as_deref()).collect(program);

        let required = match options.prune_level {
            PruneLevel::None => {
                info!(
                    "pruning disabled, keeping all {} classes",
                    program.classes.len()
                );
                Required::everything()
            }
            PruneLevel::CallGraph => {
                let graph = ClassHierarchyGraph::new(program);
                let cache = load_cache(program, options);
                let fresh = cache.is_none();
                let sets = prune(
                    program,
                    &graph,
                    cache.as_ref(),
                    &overrides,
                    root_class,
                    &options.extra_roots,
                );
                if fresh {
                    store_cache(program, &graph, options);
                }
                Required::from_sets(sets)
            }
        };

        let reachable = match (options.mode, required.sets()) {
            (CompileMode::SingleClass, _) => vec![root_class.to_string()],
            (CompileMode::Full, Some(sets)) => sets.classes.iter().cloned().collect(),
            (CompileMode::Full, None) => program.classes.keys().cloned().collect(),
        };

        Ok(GenContext {
            program,
            options,
            root_class: root_class.to_string(),
            names,
            required,
            reachable,
        })
    }

    pub fn required(&self) -> &Required {
        &self.required
    }

    /// Classes this run emits files for, sorted by name.
    pub fn reachable(&self) -> &[String] {
        &self.reachable
    }

    fn counts(&self) -> (usize, usize, usize) {
        match self.required.sets() {
            Some(sets) => (sets.classes.len(), sets.methods.len(), sets.fields.len()),
            None => (
                self.program.classes.len(),
                self.program.classes.values().map(|c| c.methods.len()).sum(),
                self.program.classes.values().map(|c| c.fields.len()).sum(),
            ),
        }
    }

    fn write(&self, name: &str, text: &str, summary: &mut GenSummary) {
        let path = self.options.output_dir.join(name);
        match fs::write(&path, text) {
            Ok(()) => {
                debug!("wrote {}", path.display());
                summary.files_written += 1;
            }
            Err(e) => {
                error!("cannot write {}: {}", path.display(), e);
                summary.files_failed += 1;
            }
        }
    }

    pub fn run(&self) -> GenResult<GenSummary> {
        fs::create_dir_all(&self.options.output_dir)?;
        let single_class = self.options.mode == CompileMode::SingleClass;

        let lists = MethodListBuilder::new(self.program, &self.required);
        let structs = StructGenerator::new(
            self.program,
            &self.names,
            &lists,
            &self.required,
            single_class,
        );
        let headers = HeaderGenerator::new(self.program, &self.names, &structs, single_class);
        let scanner = OverrideScanner::new(&self.names, self.options.overrides_dir.as_deref());
        let code = CodeGenerator::new(
            self.program,
            &self.names,
            &lists,
            &structs,
            &scanner,
            single_class,
        );

        let (classes, methods, fields) = self.counts();
        let mut summary = GenSummary {
            classes,
            methods,
            fields,
            ..GenSummary::default()
        };

        for class in &self.reachable {
            info!("emitting {}", class);
            self.write(
                &self.names.stub_header_file(class),
                &headers.stub(class),
                &mut summary,
            );
            self.write(
                &self.names.header_file(class),
                &headers.header(class)?,
                &mut summary,
            );
            self.write(&self.names.code_file(class), &code.code(class)?, &mut summary);
        }

        // Single-class runs stop at the one translation unit; there is
        // nothing coherent to link.
        if !single_class {
            let mains = MainFileGenerator::new(self.program, &self.names, &lists, &self.required);
            self.write(
                &self.names.main_file(&self.root_class),
                &mains.main_file(&self.root_class, &self.reachable)?,
                &mut summary,
            );
            let make = MakefileGenerator::new(
                &self.names,
                self.options.target,
                &self.options.runtime_dir,
            );
            self.write(
                make.file_name(),
                &make.makefile(&self.root_class, &self.reachable),
                &mut summary,
            );
            if let Some((name, text)) = make.linker_command(&self.root_class, &self.reachable) {
                self.write(&name, &text, &mut summary);
            }
        }
        Ok(summary)
    }
}

fn load_cache(program: &Program, options: &Options) -> Option<CallGraphCache> {
    let path = options.cache_path.as_deref()?;
    match CallGraphCache::load(path, CallGraphCache::digest_validator(program.digest())) {
        Ok(Some(cache)) => {
            info!("call-graph cache hit: {}", path.display());
            Some(cache)
        }
        Ok(None) => {
            info!("call-graph cache miss: {}", path.display());
            None
        }
        Err(e) => {
            warn!("cannot read call-graph cache {}: {}", path.display(), e);
            None
        }
    }
}

fn store_cache(program: &Program, graph: &ClassHierarchyGraph, options: &Options) {
    let Some(path) = options.cache_path.as_deref() else {
        return;
    };
    let cache = CallGraphCache::build(program, graph);
    match cache.store(path) {
        Ok(()) => debug!(
            "stored call-graph cache {} ({} methods)",
            path.display(),
            cache.edges.len()
        ),
        Err(e) => warn!("cannot store call-graph cache {}: {}", path.display(), e),
    }
}

/// Prune from `root_class` and emit everything into the configured output
/// directory.
pub fn generate(program: &Program, root_class: &str, options: &Options) -> GenResult<GenSummary> {
    GenContext::new(program, root_class, options)?.run()
}
