mod scenarios;

use super::MatchRange;

/// Assert the renderer contract: ascending, non-overlapping, merged and
/// inside `0..len`.
pub(super) fn assert_well_formed(ranges: &[MatchRange], len: usize) {
    assert!(!ranges.is_empty(), "a match has at least one range");
    for r in ranges {
        assert!(r.start <= r.end, "inverted range {r:?}");
        assert!(r.end < len, "range {r:?} outside text of {len} chars");
    }
    for w in ranges.windows(2) {
        assert!(
            w[0].end + 1 < w[1].start,
            "ranges {:?} and {:?} overlap or touch",
            w[0],
            w[1]
        );
    }
}
