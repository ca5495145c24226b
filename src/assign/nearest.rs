use crate::core::model::{Assignment, LabelHint, Region};

/// Visits labels in order; each hinted label takes the unclaimed region
/// whose center is closest to its hint. Greedy: an earlier label can take a
/// region a later label was closer to. Ties go to the earlier region.
/// Labels without a position get `None`.
pub(crate) fn nearest_slots(
    hints: &[&LabelHint],
    regions: &[Region],
    claimed: &mut [bool],
) -> Vec<Option<Assignment>> {
    hints
        .iter()
        .map(|hint| {
            let target = hint.position()?;

            let mut best: Option<(usize, f32)> = None;
            for (idx, region) in regions.iter().enumerate() {
                if claimed[idx] {
                    continue;
                }
                let dist = region.bbox.distance_to(target);
                if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                    best = Some((idx, dist));
                }
            }

            let (idx, dist) = best?;
            claimed[idx] = true;
            Some(Assignment {
                label: hint.label.clone(),
                region: regions[idx],
                distance: Some(dist),
            })
        })
        .collect()
}
