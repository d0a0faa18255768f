//! Output document composition: the replaceable overview header span and the
//! appended per-file sections.

pub const OVERVIEW_START_MARKER: &str = "--- PROJECT OVERVIEW START ---";
pub const OVERVIEW_END_MARKER: &str = "--- PROJECT OVERVIEW END ---";

pub const FILE_START_MARKER: &str = "--- START FILE ---";
pub const FILE_CONTENT_MARKER: &str = "--- FILE CONTENT ---";
pub const FILE_END_MARKER: &str = "--- END FILE ---";

pub fn format_file_section(file_name: &str, relative_path: &str, content: &str) -> String {
    format!(
        "\n{}\nFilename: {}\nPath: {}\n{}\n{}\n{}\n",
        FILE_START_MARKER, file_name, relative_path, FILE_CONTENT_MARKER, content, FILE_END_MARKER
    )
}

/// Removes the first well-formed overview span (start marker through end
/// marker, inclusive, plus one immediately following blank line) and returns
/// the remaining body. Malformed markers (either absent, or the end marker
/// before the start marker) never cause data loss: the content is returned
/// untouched.
pub fn strip_overview_block(content: &str) -> String {
    let start = content.find(OVERVIEW_START_MARKER);
    let end = content.find(OVERVIEW_END_MARKER);
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) if start <= end => (start, end),
        _ => return content.to_string(),
    };

    let mut cut = end + OVERVIEW_END_MARKER.len();
    // The end-marker line's own newline.
    if content[cut..].starts_with('\n') {
        cut += 1;
    }
    // One immediately following blank line.
    if content[cut..].starts_with('\n') {
        cut += 1;
    }

    let mut body = String::with_capacity(content.len() - (cut - start));
    body.push_str(&content[..start]);
    body.push_str(&content[cut..]);
    body
}

/// Replaces any prior overview block with the new one (when generated this
/// run) and appends the new file sections after the preserved body. An absent
/// new overview is not resurrected from the old document.
pub fn compose_document(
    existing: &str,
    overview: Option<&str>,
    file_sections: &str,
) -> String {
    let body = strip_overview_block(existing);
    let mut document =
        String::with_capacity(overview.map_or(0, str::len) + body.len() + file_sections.len() + 1);
    if let Some(block) = overview {
        document.push_str(block);
        if !body.is_empty() && !body.starts_with('\n') && !document.ends_with('\n') {
            document.push('\n');
        }
    }
    document.push_str(&body);
    document.push_str(file_sections);
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> String {
        format!(
            "{}\nProject: demo\n{}\n\n",
            OVERVIEW_START_MARKER, OVERVIEW_END_MARKER
        )
    }

    fn sample_section(name: &str) -> String {
        format_file_section(name, name, "content")
    }

    #[test]
    fn file_section_framing_is_exact() {
        let section = format_file_section("a.rs", "src/a.rs", "fn main() {}");
        assert_eq!(
            section,
            "\n--- START FILE ---\nFilename: a.rs\nPath: src/a.rs\n--- FILE CONTENT ---\nfn main() {}\n--- END FILE ---\n"
        );
    }

    #[test]
    fn strip_removes_block_and_following_blank_line() {
        let document = format!("{}{}", sample_block(), sample_section("a.rs"));
        assert_eq!(strip_overview_block(&document), sample_section("a.rs"));
    }

    #[test]
    fn strip_without_markers_is_identity() {
        let document = sample_section("a.rs");
        assert_eq!(strip_overview_block(&document), document);
    }

    #[test]
    fn start_marker_without_end_leaves_content_untouched() {
        let document = format!("{}\nsome text\n", OVERVIEW_START_MARKER);
        assert_eq!(strip_overview_block(&document), document);
    }

    #[test]
    fn end_marker_before_start_leaves_content_untouched() {
        let document = format!(
            "{}\ngarbage\n{}\n",
            OVERVIEW_END_MARKER, OVERVIEW_START_MARKER
        );
        assert_eq!(strip_overview_block(&document), document);
    }

    #[test]
    fn compose_replaces_the_block_and_preserves_sections() {
        let existing = format!(
            "{}{}{}",
            sample_block(),
            sample_section("a.rs"),
            sample_section("b.rs")
        );
        let new_block = format!(
            "{}\nProject: demo\nFiles: 2\n{}\n\n",
            OVERVIEW_START_MARKER, OVERVIEW_END_MARKER
        );
        let composed = compose_document(&existing, Some(&new_block), "");
        assert_eq!(
            composed,
            format!(
                "{}{}{}",
                new_block,
                sample_section("a.rs"),
                sample_section("b.rs")
            )
        );
    }

    #[test]
    fn compose_appends_after_malformed_markers_unchanged() {
        let existing = format!("{}\norphaned\n", OVERVIEW_START_MARKER);
        let composed = compose_document(&existing, None, &sample_section("new.rs"));
        assert_eq!(
            composed,
            format!("{}{}", existing, sample_section("new.rs"))
        );
    }

    #[test]
    fn absent_overview_is_not_resurrected() {
        let existing = format!("{}{}", sample_block(), sample_section("a.rs"));
        let composed = compose_document(&existing, None, "");
        assert_eq!(composed, sample_section("a.rs"));
        assert!(!composed.contains(OVERVIEW_START_MARKER));
    }

    #[test]
    fn repeated_replacement_is_idempotent() {
        let block = sample_block();
        let first = compose_document("", Some(&block), &sample_section("a.rs"));
        let second = compose_document(&first, Some(&block), "");
        let third = compose_document(&second, Some(&block), "");
        assert_eq!(second, third);
        assert_eq!(second, first);
    }
}
