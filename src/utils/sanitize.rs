use std::collections::HashSet;

/// Reduce user text to plain text: every tag is stripped, entities kept.
///
/// Applied to forum posts, submission text entries and grading feedback,
/// which are displayed as-is by clients.
pub fn strip_tags(input: &str) -> String {
    ammonia::Builder::default()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
}

/// Clean HTML content with a small safe-tag allowlist.
///
/// Used for profile bios, where light formatting is tolerated but
/// anything script-bearing is removed.
pub fn clean_html(input: &str) -> String {
    let tags: HashSet<&str> = ["b", "i", "em", "strong", "p", "br"].into_iter().collect();
    ammonia::Builder::default()
        .tags(tags)
        .clean(input)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("hello <b>world</b>"), "hello world");
        assert_eq!(strip_tags("<script>alert(1)</script>ok"), "ok");
    }

    #[test]
    fn clean_html_keeps_safe_tags_only() {
        assert_eq!(clean_html("<b>hi</b>"), "<b>hi</b>");
        assert_eq!(clean_html("<img src=x onerror=alert(1)>hi"), "hi");
    }
}
