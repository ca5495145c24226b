pub mod nearest;
pub mod ordinal;

use crate::core::model::{Assignment, AssignmentResult, LabelHint, Region};

pub trait LabelAssigner {
    /// `regions` must already be in reading order.
    fn assign(&self, hints: &[LabelHint], regions: &[Region]) -> AssignmentResult;
}

/// Nth label to the Nth region.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrdinalAssigner;

/// Greedy closest-region matching for labels carrying a position.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestAssigner;

/// Nearest-position matching for hinted labels, then reading order for the
/// rest. Pages without any positions reduce to [`OrdinalAssigner`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleAssigner;

impl SimpleAssigner {
    pub fn new() -> Self {
        Self
    }
}

impl LabelAssigner for OrdinalAssigner {
    fn assign(&self, hints: &[LabelHint], regions: &[Region]) -> AssignmentResult {
        let refs: Vec<&LabelHint> = hints.iter().collect();
        let mut claimed = vec![false; regions.len()];
        collect(hints, ordinal::ordinal_slots(&refs, regions, &mut claimed))
    }
}

impl LabelAssigner for NearestAssigner {
    fn assign(&self, hints: &[LabelHint], regions: &[Region]) -> AssignmentResult {
        let refs: Vec<&LabelHint> = hints.iter().collect();
        let mut claimed = vec![false; regions.len()];
        collect(hints, nearest::nearest_slots(&refs, regions, &mut claimed))
    }
}

impl LabelAssigner for SimpleAssigner {
    fn assign(&self, hints: &[LabelHint], regions: &[Region]) -> AssignmentResult {
        if hints.iter().all(|h| h.position().is_none()) {
            return OrdinalAssigner.assign(hints, regions);
        }

        let (hinted, unhinted): (Vec<usize>, Vec<usize>) =
            (0..hints.len()).partition(|&idx| hints[idx].position().is_some());

        let mut claimed = vec![false; regions.len()];
        let hinted_refs: Vec<&LabelHint> = hinted.iter().map(|&idx| &hints[idx]).collect();
        let unhinted_refs: Vec<&LabelHint> = unhinted.iter().map(|&idx| &hints[idx]).collect();
        let near = nearest::nearest_slots(&hinted_refs, regions, &mut claimed);
        let rest = ordinal::ordinal_slots(&unhinted_refs, regions, &mut claimed);

        let mut slots: Vec<Option<Assignment>> = vec![None; hints.len()];
        for (idx, slot) in hinted.into_iter().zip(near).chain(unhinted.into_iter().zip(rest)) {
            slots[idx] = slot;
        }
        collect(hints, slots)
    }
}

fn collect(hints: &[LabelHint], slots: Vec<Option<Assignment>>) -> AssignmentResult {
    let mut result = AssignmentResult::default();
    for (hint, slot) in hints.iter().zip(slots) {
        match slot {
            Some(assignment) => result.assigned.push(assignment),
            None => result.unassigned.push(hint.label.clone()),
        }
    }
    result
}
