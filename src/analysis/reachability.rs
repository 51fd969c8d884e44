/// Reachability pruning: the minimal transitive closure of classes, methods,
/// and fields needed to compile a program from one root class.
///
/// Worklist coloring: discovered-but-unprocessed elements sit in a gray
/// frontier; processing an element moves it into its reachable set and feeds
/// its dependencies back into the frontier. An element is in exactly one of
/// {frontier, reachable set} at any time, and the loop ends when the
/// frontier drains.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use log::{debug, info, warn};

use crate::ir::{FieldSig, MethodSig, Program, Ty, Unit, Value, OBJECT_CLASS};

use super::cache::CallGraphCache;
use super::call_graph::CallGraph;

// ---------------------------------------------------------------------------
// Elements and result sets
// ---------------------------------------------------------------------------

/// One unit of pruning work.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Element {
    Class(String),
    Method(MethodSig),
    Field(FieldSig),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Class(name) => write!(f, "class {}", name),
            Element::Method(sig) => write!(f, "method {}", sig),
            Element::Field(sig) => write!(f, "field {}", sig),
        }
    }
}

/// The three closure sets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReachableSets {
    pub classes: BTreeSet<String>,
    pub methods: BTreeSet<MethodSig>,
    pub fields: BTreeSet<FieldSig>,
}

impl ReachableSets {
    fn contains(&self, element: &Element) -> bool {
        match element {
            Element::Class(name) => self.classes.contains(name),
            Element::Method(sig) => self.methods.contains(sig),
            Element::Field(sig) => self.fields.contains(sig),
        }
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Methods and classes replaced by hand-written bodies. An overridden method
/// is a leaf for pruning (its body text is opaque); an overridden class
/// skips its static-initializer walk but still needs its superclass chain.
#[derive(Clone, Debug, Default)]
pub struct OverrideSet {
    methods: BTreeSet<MethodSig>,
    classes: BTreeSet<String>,
}

impl OverrideSet {
    pub fn new() -> Self {
        OverrideSet::default()
    }

    pub fn add_method(&mut self, sig: MethodSig) {
        self.methods.insert(sig);
    }

    pub fn add_class(&mut self, name: impl Into<String>) {
        self.classes.insert(name.into());
    }

    pub fn method_overridden(&self, sig: &MethodSig) -> bool {
        self.methods.contains(sig)
    }

    pub fn class_overridden(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.classes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Required-ness
// ---------------------------------------------------------------------------

/// Pruning levels. Level 0 keeps everything; level 1 keeps the computed
/// closure only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PruneLevel {
    None,
    #[default]
    CallGraph,
}

/// The required-ness query consulted throughout lowering. With pruning
/// disabled every answer is "true".
#[derive(Clone, Debug)]
pub struct Required {
    sets: Option<ReachableSets>,
}

impl Required {
    /// Everything is required (pruning disabled).
    pub fn everything() -> Self {
        Required { sets: None }
    }

    pub fn from_sets(sets: ReachableSets) -> Self {
        Required { sets: Some(sets) }
    }

    pub fn class(&self, name: &str) -> bool {
        match &self.sets {
            Some(sets) => sets.classes.contains(name),
            None => true,
        }
    }

    pub fn method(&self, sig: &MethodSig) -> bool {
        match &self.sets {
            Some(sets) => sets.methods.contains(sig),
            None => true,
        }
    }

    pub fn field(&self, sig: &FieldSig) -> bool {
        match &self.sets {
            Some(sets) => sets.fields.contains(sig),
            None => true,
        }
    }

    /// A type is required when the class it references is; non-reference
    /// types always are.
    pub fn ty(&self, ty: &Ty) -> bool {
        match ty.referenced_class() {
            Some(class) => self.class(class),
            None => true,
        }
    }

    pub fn sets(&self) -> Option<&ReachableSets> {
        self.sets.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Compulsory nodes
// ---------------------------------------------------------------------------

const STRING_CLASS: &str = "java.lang.String";
const SYSTEM_CLASS: &str = "java.lang.System";
const PRINT_STREAM_CLASS: &str = "java.io.PrintStream";
const EXCEPTION_CLASS: &str = "java.lang.Exception";

/// Runtime essentials the emitted support code references whether or not
/// the source program does: string construction from character arrays,
/// string statics, `toString`, system initialization and its output stream,
/// and the base exception class. Entries absent from the model are skipped;
/// a minimal model without the standard library still prunes cleanly.
pub fn compulsory_roots(program: &Program) -> Vec<Element> {
    let mut out = Vec::new();
    let mut add_method = |class: &str, name: &str, descriptor: &str, out: &mut Vec<Element>| {
        let sig = MethodSig::new(class, name, descriptor);
        if program.method(&sig).is_some() {
            out.push(Element::Method(sig));
        } else {
            debug!("compulsory node {} not in model, skipped", sig);
        }
    };

    add_method(STRING_CLASS, "<init>", "([C)V", &mut out);
    add_method(STRING_CLASS, "<clinit>", "()V", &mut out);
    add_method(OBJECT_CLASS, "toString", "()Ljava/lang/String;", &mut out);
    add_method(SYSTEM_CLASS, "initializeSystemClass", "()V", &mut out);

    if let Some(string) = program.class(STRING_CLASS) {
        out.push(Element::Class(STRING_CLASS.to_string()));
        for field in &string.fields {
            out.push(Element::Field(field.sig(STRING_CLASS)));
        }
    }
    if let Some(system) = program.class(SYSTEM_CLASS) {
        out.push(Element::Class(SYSTEM_CLASS.to_string()));
        if system.field("out").is_some() {
            out.push(Element::Field(FieldSig::new(
                SYSTEM_CLASS,
                "out",
                format!("L{};", PRINT_STREAM_CLASS.replace('.', "/")),
            )));
        }
    }
    if program.contains_class(PRINT_STREAM_CLASS) {
        out.push(Element::Class(PRINT_STREAM_CLASS.to_string()));
    }
    if program.contains_class(EXCEPTION_CLASS) {
        out.push(Element::Class(EXCEPTION_CLASS.to_string()));
    }
    out
}

// ---------------------------------------------------------------------------
// Pruner
// ---------------------------------------------------------------------------

/// Compute the reachable closure from `root_class`. `extra_roots` are
/// caller-supplied additions to the compulsory seed set.
pub fn prune(
    program: &Program,
    graph: &dyn CallGraph,
    cache: Option<&CallGraphCache>,
    overrides: &OverrideSet,
    root_class: &str,
    extra_roots: &[MethodSig],
) -> ReachableSets {
    let mut pruner = Pruner {
        program,
        graph,
        cache,
        overrides,
        gray: VecDeque::new(),
        gray_members: BTreeSet::new(),
        sets: ReachableSets::default(),
    };
    pruner.seed(root_class, extra_roots);
    pruner.run();
    info!(
        "pruned from {}: {} classes, {} methods, {} fields reachable",
        root_class,
        pruner.sets.classes.len(),
        pruner.sets.methods.len(),
        pruner.sets.fields.len()
    );
    pruner.sets
}

struct Pruner<'p> {
    program: &'p Program,
    graph: &'p dyn CallGraph,
    cache: Option<&'p CallGraphCache>,
    overrides: &'p OverrideSet,
    gray: VecDeque<Element>,
    gray_members: BTreeSet<Element>,
    sets: ReachableSets,
}

impl Pruner<'_> {
    /// Discover an element: enqueue it unless already gray or done.
    fn discover(&mut self, element: Element) {
        if self.sets.contains(&element) || self.gray_members.contains(&element) {
            return;
        }
        self.gray_members.insert(element.clone());
        self.gray.push_back(element);
    }

    fn seed(&mut self, root_class: &str, extra_roots: &[MethodSig]) {
        self.discover(Element::Class(root_class.to_string()));
        if let Some(root) = self.program.class(root_class) {
            for method in &root.methods {
                self.discover(Element::Method(method.sig(root_class)));
            }
            for field in &root.fields {
                self.discover(Element::Field(field.sig(root_class)));
            }
        }
        if let Some(object) = self.program.class(OBJECT_CLASS) {
            for method in &object.methods {
                self.discover(Element::Method(method.sig(OBJECT_CLASS)));
            }
        }
        for element in compulsory_roots(self.program) {
            self.discover(element);
        }
        for sig in extra_roots {
            self.discover(Element::Method(sig.clone()));
        }
    }

    fn run(&mut self) {
        while let Some(element) = self.gray.pop_front() {
            self.gray_members.remove(&element);
            match element {
                Element::Class(name) => self.process_class(name),
                Element::Method(sig) => self.process_method(sig),
                Element::Field(sig) => self.process_field(sig),
            }
        }
    }

    fn process_class(&mut self, name: String) {
        let Some(class) = self.program.class(&name) else {
            warn!("reachable class {} is not in the model, dropped", name);
            return;
        };
        debug!("reachable class {}", name);
        // The static initializer runs when the class loads, unless the whole
        // class is replaced by a hand-written body.
        if !self.overrides.class_overridden(&name) {
            if let Some(clinit) = class.class_initializer() {
                self.discover(Element::Method(clinit.sig(&name)));
            }
        }
        // Struct layout needs every ancestor even for overridden classes.
        if let Some(super_name) = self.program.superclass_of(&name) {
            self.discover(Element::Class(super_name));
        }
        self.sets.classes.insert(name);
    }

    fn process_method(&mut self, sig: MethodSig) {
        let Some(method) = self.program.method(&sig) else {
            warn!("undeclared method {} reached, dropped", sig);
            return;
        };
        debug!("reachable method {}", sig);
        self.discover(Element::Class(sig.class.clone()));

        let leaf = method.is_native() || self.overrides.method_overridden(&sig);
        if !leaf {
            if let Some(body) = method.body.as_ref() {
                for target in self.graph.successors_of(body) {
                    self.discover(Element::Method(target));
                }
                if let Some(cached) = self.cache.and_then(|c| c.edges_for(&sig)) {
                    for target in cached.to_vec() {
                        self.discover(Element::Method(target));
                    }
                }
                self.scan_body(body);
            }
            for exception in &method.exceptions {
                self.discover(Element::Class(exception.clone()));
            }
            for trap in method.body.iter().flat_map(|b| b.traps.iter()) {
                self.discover(Element::Class(trap.exception.clone()));
            }
        }
        self.sets.methods.insert(sig);
    }

    /// Literal body scan: everything a unit names directly, independent of
    /// what the call-graph oracle resolves.
    fn scan_body(&mut self, body: &crate::ir::MethodBody) {
        let program = self.program;
        let mut discovered = Vec::new();
        for unit in &body.units {
            for value in unit.values() {
                value.for_each(&mut |v| match v {
                    Value::InstanceField { field, .. } | Value::StaticField { field } => {
                        discovered.push(Element::Field(field.clone()));
                    }
                    Value::Invoke(invoke) => {
                        // A virtual call may name a class that only inherits
                        // the method; record the declaring class's signature
                        // when it resolves.
                        let target = program
                            .resolve_method(&invoke.method)
                            .map(|(class, method)| method.sig(&class.name))
                            .unwrap_or_else(|| invoke.method.clone());
                        discovered.push(Element::Method(target));
                    }
                    Value::InstanceOf { check, .. } => {
                        if let Some(class) = check.referenced_class() {
                            discovered.push(Element::Class(class.to_string()));
                        }
                    }
                    Value::New { class } => {
                        discovered.push(Element::Class(class.clone()));
                    }
                    Value::NewArray { elem, .. } => {
                        if let Some(class) = elem.referenced_class() {
                            discovered.push(Element::Class(class.to_string()));
                        }
                    }
                    Value::Cast { ty, .. } => {
                        if let Some(class) = ty.referenced_class() {
                            discovered.push(Element::Class(class.to_string()));
                        }
                    }
                    _ => {}
                });
            }
            if let Unit::Invoke(invoke) = unit {
                let target = program
                    .resolve_method(&invoke.method)
                    .map(|(class, method)| method.sig(&class.name))
                    .unwrap_or_else(|| invoke.method.clone());
                discovered.push(Element::Method(target));
            }
        }
        for element in discovered {
            self.discover(element);
        }
    }

    fn process_field(&mut self, sig: FieldSig) {
        if self.program.field(&sig).is_none() {
            warn!("undeclared field {} reached, dropped", sig);
            return;
        }
        debug!("reachable field {}", sig);
        self.discover(Element::Class(sig.class.clone()));
        if let Some(class) = sig.ty().as_ref().and_then(Ty::referenced_class) {
            self.discover(Element::Class(class.to_string()));
        }
        self.sets.fields.insert(sig);
    }
}
