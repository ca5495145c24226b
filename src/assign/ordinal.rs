use crate::core::model::{Assignment, LabelHint, Region};

/// Pairs the Nth label with the Nth unclaimed region. Labels past the last
/// free region get `None`.
pub(crate) fn ordinal_slots(
    hints: &[&LabelHint],
    regions: &[Region],
    claimed: &mut [bool],
) -> Vec<Option<Assignment>> {
    let free: Vec<usize> = (0..regions.len()).filter(|&idx| !claimed[idx]).collect();
    let mut free = free.into_iter();

    hints
        .iter()
        .map(|hint| {
            let idx = free.next()?;
            claimed[idx] = true;
            Some(Assignment {
                label: hint.label.clone(),
                region: regions[idx],
                distance: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::{LabelAssigner, OrdinalAssigner};
    use crate::core::geometry::BBox;
    use pretty_assertions::assert_eq;

    fn regions(n: u32) -> Vec<Region> {
        (0..n)
            .map(|i| Region::new(BBox::new(i * 100, 0, 20, 60), 1200.0))
            .collect()
    }

    fn labels(names: &[&str]) -> Vec<LabelHint> {
        names.iter().map(|n| LabelHint::new(*n)).collect()
    }

    #[test]
    fn more_regions_than_labels_assigns_in_order() {
        let regions = regions(4);
        let result = OrdinalAssigner.assign(&labels(&["N", "NG", "L"]), &regions);

        assert!(result.is_complete());
        let pairs: Vec<(&str, u32)> = result
            .assigned
            .iter()
            .map(|a| (a.label.as_str(), a.region.bbox.x))
            .collect();
        assert_eq!(pairs, vec![("N", 0), ("NG", 100), ("L", 200)]);
    }

    #[test]
    fn fewer_regions_leaves_trailing_labels() {
        let regions = regions(2);
        let result = OrdinalAssigner.assign(&labels(&["L", "W", "Y", "H"]), &regions);

        assert_eq!(result.assigned.len(), 2);
        assert_eq!(result.unassigned, vec!["Y".to_string(), "H".to_string()]);
    }

    #[test]
    fn skips_claimed_regions() {
        let regions = regions(3);
        let mut claimed = vec![true, false, false];
        let hint = LabelHint::new("K");
        let slots = ordinal_slots(&[&hint], &regions, &mut claimed);
        assert_eq!(slots[0].as_ref().map(|a| a.region.bbox.x), Some(100));
        assert_eq!(claimed, vec![true, true, false]);
    }
}
