//! Next-offset cursor computation.

/// Sentinel returned when there are no further pages.
pub const NO_MORE_PAGES: i64 = -1;

/// Offset of the next page, or [`NO_MORE_PAGES`].
///
/// The next page starts at `limit + offset` whenever the total hit count
/// extends past it. Values are not range-checked; addition saturates.
pub fn next_offset(total: u64, limit: i64, offset: i64) -> i64 {
    let end = limit.saturating_add(offset);
    if i128::from(total) > i128::from(end) {
        end
    } else {
        NO_MORE_PAGES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_next_page_exists() {
        assert_eq!(next_offset(5, 2, 0), 2);
        assert_eq!(next_offset(5, 2, 2), 4);
    }

    #[test]
    fn test_last_page() {
        assert_eq!(next_offset(5, 2, 4), NO_MORE_PAGES);
        assert_eq!(next_offset(4, 2, 2), NO_MORE_PAGES);
    }

    #[test]
    fn test_zero_limit() {
        assert_eq!(next_offset(5, 0, 3), 3);
        assert_eq!(next_offset(3, 0, 3), NO_MORE_PAGES);
    }

    #[test]
    fn test_offset_beyond_total() {
        assert_eq!(next_offset(5, 20, 100), NO_MORE_PAGES);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        assert_eq!(next_offset(u64::MAX, i64::MAX, 1), i64::MAX);
        assert_eq!(next_offset(10, -5, 0), -5);
    }

    proptest! {
        #[test]
        fn test_next_offset_property(
            total in 0u64..1_000_000,
            limit in 0i64..10_000,
            offset in 0i64..1_000_000,
        ) {
            let result = next_offset(total, limit, offset);
            if total as i64 > limit + offset {
                prop_assert_eq!(result, limit + offset);
            } else {
                prop_assert_eq!(result, NO_MORE_PAGES);
            }
        }
    }
}
