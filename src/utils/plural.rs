//! Pluralization for log lines.

/// `"s"` unless `n == 1`.
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// `plural_count(3, "document")` -> `"3 documents"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "bundle"), "0 bundles");
        assert_eq!(plural_count(1, "document"), "1 document");
        assert_eq!(plural_count(12, "file"), "12 files");
    }
}
