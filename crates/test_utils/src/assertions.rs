//! Assertions over generated XML text
//!
//! Failure messages print the whole document, which is what you want when a
//! golden comparison breaks.

/// Asserts that `haystack` contains `needle` exactly `count` times
pub fn assert_occurrences(haystack: &str, needle: &str, count: usize) {
    let found = haystack.matches(needle).count();
    assert_eq!(
        found, count,
        "Expected {count} occurrence(s) of {needle:?}, found {found} in:\n{haystack}"
    );
}

/// Asserts that `haystack` contains each needle, in the given order
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match haystack[from..].find(needle) {
            Some(offset) => from += offset + needle.len(),
            None => panic!("Expected {needle:?} after byte {from} in:\n{haystack}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_occurrences() {
        assert_occurrences("<a/><b/><a/>", "<a/>", 2);
        assert_occurrences("<a/>", "<c/>", 0);
    }

    #[test]
    #[should_panic(expected = "Expected 1 occurrence(s)")]
    fn test_assert_occurrences_reports_count() {
        assert_occurrences("<a/><a/>", "<a/>", 1);
    }

    #[test]
    fn test_assert_in_order() {
        assert_in_order("<a><b/><c/></a>", &["<a>", "<b/>", "<c/>", "</a>"]);
    }

    #[test]
    #[should_panic(expected = "Expected \"<a>\"")]
    fn test_assert_in_order_rejects_reordering() {
        assert_in_order("<b/><a>", &["<b/>", "<a>"]);
    }
}
