use crate::region::RawRegion;

/// Orders regions by area, largest first.
///
/// The sort is stable: regions with equal area keep their input order, so
/// identical input always ranks identically.
pub fn rank(mut regions: Vec<RawRegion>) -> Vec<RawRegion> {
    regions.sort_by(|a, b| b.area.cmp(&a.area));
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Mask;

    fn region(area: u64, tag: &str) -> RawRegion {
        RawRegion::new(Mask::from_elem((1, 1), false), area).with_label(tag)
    }

    fn tags(regions: &[RawRegion]) -> Vec<&str> {
        regions.iter().map(|r| r.label.as_deref().unwrap_or_default()).collect()
    }

    #[test]
    fn equal_areas_keep_input_order() {
        let input = vec![region(5, "a"), region(5, "b"), region(3, "c"), region(5, "d"), region(1, "e")];
        let ranked = rank(input);
        assert_eq!(tags(&ranked), ["a", "b", "d", "c", "e"]);
        let areas: Vec<u64> = ranked.iter().map(|r| r.area).collect();
        assert_eq!(areas, [5, 5, 5, 3, 1]);
    }

    #[test]
    fn empty_input_ranks_to_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn ranking_is_repeatable() {
        let input = vec![region(2, "x"), region(9, "y"), region(2, "z"), region(9, "w")];
        let first = rank(input.clone());
        let second = rank(input);
        assert_eq!(first, second);
        assert_eq!(tags(&first), ["y", "w", "x", "z"]);
    }
}
