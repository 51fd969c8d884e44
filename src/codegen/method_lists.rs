/// Per-class method partition.
///
/// Dispatch through function-pointer tables only works if a method's slot
/// index is identical everywhere in the hierarchy, so a class's table starts
/// with its superclass's layout (inherited plus new, in that order) and an
/// override replaces its slot in place instead of appending. New methods,
/// constructors, and private methods follow the inherited block.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;

use crate::analysis::Required;
use crate::ir::{MethodSig, Program};

use super::{GenError, GenResult};

/// The ordered method lists of one class.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MethodPartition {
    /// At most one; a second is malformed input.
    pub class_initializer: Option<MethodSig>,
    /// Slot-indexed to match the superclass's (inherited + new) list.
    /// Entries carry the signature of the most-derived declaration at or
    /// above this class.
    pub inherited: Vec<MethodSig>,
    pub new_methods: Vec<MethodSig>,
    pub constructors: Vec<MethodSig>,
    pub private_methods: Vec<MethodSig>,
}

impl MethodPartition {
    /// What a subclass inherits: this class's inherited block followed by
    /// its new block, slot positions preserved.
    pub fn inheritable(&self) -> Vec<MethodSig> {
        let mut out = self.inherited.clone();
        out.extend(self.new_methods.iter().cloned());
        out
    }

    /// Function-pointer table order: inherited, new, constructors, private.
    pub fn table(&self) -> Vec<MethodSig> {
        let mut out = self.inheritable();
        out.extend(self.constructors.iter().cloned());
        out.extend(self.private_methods.iter().cloned());
        out
    }

    /// Slot index of a sub-signature in the table, if it has one.
    pub fn slot_index(&self, sig: &MethodSig) -> Option<usize> {
        self.table().iter().position(|m| m.matches_sub_signature(sig))
    }

    /// The inherited entry matching a sub-signature: the ancestor slot an
    /// override would replace. Drives ABI-compatible receiver casts.
    pub fn inherited_match(&self, sig: &MethodSig) -> Option<&MethodSig> {
        self.inherited.iter().find(|m| m.matches_sub_signature(sig))
    }
}

/// Builds and memoizes partitions per class within one run.
pub struct MethodListBuilder<'p> {
    program: &'p Program,
    required: &'p Required,
    memo: RefCell<BTreeMap<String, Rc<MethodPartition>>>,
}

impl<'p> MethodListBuilder<'p> {
    pub fn new(program: &'p Program, required: &'p Required) -> Self {
        MethodListBuilder {
            program,
            required,
            memo: RefCell::new(BTreeMap::new()),
        }
    }

    /// Partition a class's declared methods. The superclass partition is
    /// computed first (recursively) to seed the inherited slots.
    pub fn partition(&self, class_name: &str) -> GenResult<Rc<MethodPartition>> {
        if let Some(hit) = self.memo.borrow().get(class_name) {
            return Ok(hit.clone());
        }

        let mut partition = MethodPartition {
            inherited: match self.program.superclass_of(class_name) {
                Some(super_name) if self.program.contains_class(&super_name) => {
                    self.partition(&super_name)?.inheritable()
                }
                _ => Vec::new(),
            },
            ..Default::default()
        };

        if let Some(class) = self.program.class(class_name) {
            for method in &class.methods {
                let sig = method.sig(class_name);
                if method.is_class_initializer() {
                    if partition.class_initializer.is_some() {
                        return Err(GenError::DuplicateClassInitializer {
                            class: class_name.to_string(),
                        });
                    }
                    partition.class_initializer = Some(sig);
                } else if method.is_constructor() {
                    partition.constructors.push(sig);
                } else if method.is_private() {
                    partition.private_methods.push(sig);
                } else if let Some(slot) = partition
                    .inherited
                    .iter()
                    .position(|m| m.matches_sub_signature(&sig))
                {
                    // Override: same slot, new declaration.
                    partition.inherited[slot] = sig;
                } else if self.required.method(&sig) {
                    partition.new_methods.push(sig);
                } else {
                    debug!("method {} not required, left out of the table", sig);
                }
            }
        }

        let partition = Rc::new(partition);
        self.memo
            .borrow_mut()
            .insert(class_name.to_string(), partition.clone());
        Ok(partition)
    }
}
