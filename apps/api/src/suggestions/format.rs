//! Turns the plain-text suggestion response into styled HTML. Rules run in a
//! fixed order: header wrapping must see `<br>` markers and never the emphasis
//! delimiters stripped before it.

use std::sync::LazyLock;

use regex::Regex;

const SECTION_STYLE: &str = "font-size: 1.3em; color: #4f46e5; border-bottom: 2px solid #e5e7eb; \
padding-bottom: 5px; display: block; margin-bottom: 15px;";
const SUBSECTION_STYLE: &str = "font-size: 1.1em; color: #059669; display: block; margin-bottom: 10px;";
const CONTAINER_STYLE: &str = "line-height: 1.7; font-size: 15px; color: #374151; padding: 20px; \
background: #fafafa; border-radius: 8px; border-left: 4px solid #4f46e5; width: 100%;";

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#+\s*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.*?)`").unwrap());
static SECTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(Analysis|Suggestions)").unwrap());
static SUBSECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Strengths:|Areas for Enhancement:|Key Improvements:)").unwrap()
});
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(^|<br>)- ").unwrap());
static BREAK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(<br>){3,}").unwrap());

pub fn format(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = CODE.replace_all(&text, "$1");
    let text = escape_html(&text);
    let text = text.replace('\n', "<br>");
    let text = SECTION.replace_all(
        &text,
        format!(r#"<br><br><strong style="{SECTION_STYLE}">${{1}}</strong>"#).as_str(),
    );
    let text = SUBSECTION.replace_all(
        &text,
        format!(r#"<br><br><strong style="{SUBSECTION_STYLE}">${{1}}</strong>"#).as_str(),
    );
    let text = LIST_MARKER.replace_all(&text, "${1}• ");
    let text = BREAK_RUN.replace_all(&text, "<br><br>");

    format!(r#"<div style="{CONTAINER_STYLE}">{text}</div>"#)
}

/// Model output is untrusted: only markup added here may reach the page.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inner(formatted: &str) -> &str {
        let start = formatted.find("\">").unwrap() + 2;
        &formatted[start..formatted.len() - "</div>".len()]
    }

    #[test]
    fn test_strips_emphasis_keeping_inner_text() {
        let out = format("**Bold** and *italic* and `code` here");
        assert_eq!(inner(&out), "Bold and italic and code here");
    }

    #[test]
    fn test_removes_heading_markers() {
        let out = format("## Overview\nText");
        assert_eq!(inner(&out), "Overview<br>Text");
    }

    #[test]
    fn test_wraps_section_and_subsection_headers() {
        let out = format("Analysis\nStrengths:\n- Clear layout");
        assert!(out.contains(&format!(
            r#"<strong style="{SECTION_STYLE}">Analysis</strong>"#
        )));
        assert!(out.contains(&format!(
            r#"<strong style="{SUBSECTION_STYLE}">Strengths:</strong>"#
        )));
        assert!(out.contains("<br>• Clear layout"));
        assert!(!out.contains("- Clear"));
    }

    #[test]
    fn test_bold_header_is_wrapped_once() {
        let out = format("**Suggestions**");
        assert_eq!(out.matches("<strong").count(), 1);
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_leading_dash_at_start_of_text() {
        assert_eq!(inner(&format("- first")), "• first");
        // Dashes inside a line are untouched.
        assert_eq!(inner(&format("state-of-the-art - yes")), "state-of-the-art - yes");
    }

    #[test]
    fn test_collapses_break_runs() {
        let out = format("one\n\n\n\n\ntwo");
        assert_eq!(inner(&out), "one<br><br>two");
        assert!(!format("Analysis\n\nStrengths:").contains("<br><br><br>"));
    }

    #[test]
    fn test_wrapped_in_styled_container() {
        let out = format("plain");
        assert!(out.starts_with(&format!(r#"<div style="{CONTAINER_STYLE}">"#)));
        assert!(out.ends_with("</div>"));
    }

    #[test]
    fn test_model_markup_is_escaped() {
        let out = format("<script>alert(1)</script>\nFish & <b>chips</b>");
        assert_eq!(
            inner(&out),
            "&lt;script&gt;alert(1)&lt;/script&gt;<br>Fish &amp; &lt;b&gt;chips&lt;/b&gt;"
        );
        assert!(!out.contains("<script"));
    }

    #[test]
    fn test_empty_input_is_empty_container() {
        assert_eq!(inner(&format("")), "");
    }
}
