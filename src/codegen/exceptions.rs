/// Exception program-counter tracking.
///
/// The target has no unwinding, so protected regions are linearized into an
/// integer counter ("epc") the emitted body keeps up to date: entering or
/// leaving a trap region each bump the counter by one, and the generated
/// code stores the new value at that point. A throw longjmps back to the
/// method's checkpoint carrying the counter, and a switch on it consults the
/// snapshot of regions that were active there, testing the thrown object
/// against each trap innermost-first. No match restores the caller's
/// checkpoint and re-raises.
///
/// This object is the generator-side model: it precomputes the transition
/// schedule and the per-counter active lists for one body; the lowering pass
/// only queries it.

use std::collections::BTreeMap;

use crate::ir::{MethodBody, TrapRegion, UnitId};

#[derive(Clone, Debug, Default)]
pub struct ExceptionTracker {
    traps: Vec<TrapRegion>,
    /// New counter values taken when control reaches a unit, in event order.
    transitions: BTreeMap<UnitId, Vec<usize>>,
    /// `history[epc]` = trap indices active at that counter value,
    /// most-recently-entered first. `history[0]` is always empty.
    history: Vec<Vec<usize>>,
}

impl ExceptionTracker {
    /// Precompute the schedule for one body. Exits are processed before
    /// entries when both land on the same unit, matching the half-open
    /// `[begin, end)` region shape.
    pub fn build(body: &MethodBody) -> Self {
        let traps = body.traps.clone();
        let mut transitions: BTreeMap<UnitId, Vec<usize>> = BTreeMap::new();
        let mut history: Vec<Vec<usize>> = vec![Vec::new()];
        let mut active: Vec<usize> = Vec::new();
        let mut counter = 0usize;

        for unit in 0..=body.units.len() {
            for (index, trap) in traps.iter().enumerate() {
                if trap.end == unit {
                    active.retain(|t| *t != index);
                    counter += 1;
                    history.push(active.iter().rev().copied().collect());
                    transitions.entry(unit).or_default().push(counter);
                }
            }
            for (index, trap) in traps.iter().enumerate() {
                if trap.begin == unit {
                    active.push(index);
                    counter += 1;
                    history.push(active.iter().rev().copied().collect());
                    transitions.entry(unit).or_default().push(counter);
                }
            }
        }

        ExceptionTracker {
            traps,
            transitions,
            history,
        }
    }

    pub fn has_traps(&self) -> bool {
        !self.traps.is_empty()
    }

    pub fn trap(&self, index: usize) -> &TrapRegion {
        &self.traps[index]
    }

    /// Counter values stored when control reaches `unit`, oldest first.
    pub fn transitions_at(&self, unit: UnitId) -> &[usize] {
        self.transitions.get(&unit).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Traps active at a counter value, innermost (most recently entered)
    /// first.
    pub fn active_at(&self, epc: usize) -> &[usize] {
        self.history.get(epc).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Largest counter value the body can hold.
    pub fn max_epc(&self) -> usize {
        self.history.len() - 1
    }

    /// Counter values with at least one active trap; these are the arms of
    /// the dispatch switch.
    pub fn dispatch_points(&self) -> Vec<usize> {
        (1..self.history.len())
            .filter(|epc| !self.history[*epc].is_empty())
            .collect()
    }
}
