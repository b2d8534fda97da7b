//! Style aggregation for merged edge visuals.
//!
//! When several original edges are represented by a single hyperedge, one
//! emphasis must stand for all of them. The rule is a fixed priority:
//! warning beats thick beats highlighted beats plain.

use flowview_core::EdgeEmphasis;

/// Fold contributing edge styles into a single representative emphasis.
/// Pure; an empty contributor set yields the plain style.
pub fn aggregate_emphasis(contributors: impl IntoIterator<Item = EdgeEmphasis>) -> EdgeEmphasis {
    contributors.into_iter().max().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_contributors_are_plain() {
        assert_eq!(aggregate_emphasis([]), EdgeEmphasis::Plain);
    }

    #[test]
    fn test_warning_dominates() {
        let styles = [
            EdgeEmphasis::Highlighted,
            EdgeEmphasis::Warning,
            EdgeEmphasis::Thick,
        ];
        assert_eq!(aggregate_emphasis(styles), EdgeEmphasis::Warning);
    }

    #[test]
    fn test_ties_keep_the_shared_style() {
        let styles = [EdgeEmphasis::Thick, EdgeEmphasis::Thick];
        assert_eq!(aggregate_emphasis(styles), EdgeEmphasis::Thick);
    }

    // ========================================================================
    // Property-Based Tests
    // ========================================================================

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn emphasis_strategy() -> impl Strategy<Value = EdgeEmphasis> {
            prop_oneof![
                Just(EdgeEmphasis::Plain),
                Just(EdgeEmphasis::Highlighted),
                Just(EdgeEmphasis::Thick),
                Just(EdgeEmphasis::Warning),
            ]
        }

        proptest! {
            /// The aggregate dominates every contributor and is itself one
            /// of the contributors (or plain for an empty set).
            #[test]
            fn prop_aggregate_is_dominant_contributor(
                styles in proptest::collection::vec(emphasis_strategy(), 0..=8)
            ) {
                let aggregate = aggregate_emphasis(styles.iter().copied());
                for style in &styles {
                    prop_assert!(aggregate >= *style);
                }
                if styles.is_empty() {
                    prop_assert_eq!(aggregate, EdgeEmphasis::Plain);
                } else {
                    prop_assert!(styles.contains(&aggregate));
                }
            }

            /// Contribution order never changes the result.
            #[test]
            fn prop_aggregate_is_order_independent(
                styles in proptest::collection::vec(emphasis_strategy(), 0..=8)
            ) {
                let forward = aggregate_emphasis(styles.iter().copied());
                let reversed = aggregate_emphasis(styles.iter().rev().copied());
                prop_assert_eq!(forward, reversed);
            }
        }
    }
}
