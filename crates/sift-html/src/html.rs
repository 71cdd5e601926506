//! Escaped-source page rendering with style runs merged in.

use crate::style::{StyleKind, StyleRun};

/// Merge style runs into an escaped copy of `source` and wrap it in a
/// minimal page.
pub fn render_page(title: &str, source: &str, styles: Vec<StyleRun>) -> String {
    let body = apply_styles(source, styles);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n<pre>{}</pre>\n</body>\n</html>\n",
        escape(title),
        PAGE_CSS,
        body
    )
}

const PAGE_CSS: &str = "\
body { background: #fdfdfd; font-size: 13px; }
pre { font-family: monospace; line-height: 1.35; }
.kw { color: #00007c; font-weight: bold; }
.str { color: #3f7f5f; }
.doc { color: #5f9f5f; font-style: italic; }
.num { color: #7f0055; }
.param { color: #555500; }
.type { color: #2b91af; }
.const { color: #760a85; }
.builtin { color: #760a85; font-weight: bold; }
.fn { color: #00627a; font-weight: bold; }
a.def { color: inherit; text-decoration: none; border-bottom: 1px dotted #999; }
a.ref { color: #0b5394; text-decoration: none; }
a.ref:hover { text-decoration: underline; }";

/// Merge accepted style runs into escaped source text.
///
/// Runs must nest to render as HTML tags; a run that partially overlaps an
/// already-accepted run is dropped. Within a position, outer (longer) runs
/// open first and close last.
pub fn apply_styles(source: &str, mut styles: Vec<StyleRun>) -> String {
    let len = source.len() as u32;
    styles.retain(|s| s.end() <= len && s.len > 0);
    // Longest-first so containers are accepted before their contents.
    styles.sort_by_key(|s| (s.start, std::cmp::Reverse(s.len)));

    let mut accepted: Vec<StyleRun> = Vec::new();
    for s in styles {
        let nests = accepted.iter().all(|a| {
            s.end() <= a.start || s.start >= a.end() || (s.start >= a.start && s.end() <= a.end())
        });
        // Never nest one hyperlink element inside another.
        let clashes = matches!(s.kind, StyleKind::Anchor | StyleKind::Link)
            && accepted.iter().any(|a| {
                matches!(a.kind, StyleKind::Anchor | StyleKind::Link)
                    && s.start >= a.start
                    && s.end() <= a.end()
            });
        if nests && !clashes {
            accepted.push(s);
        }
    }

    // Open/close events per byte offset.
    let mut opens: Vec<Vec<&StyleRun>> = vec![Vec::new(); source.len() + 1];
    let mut closes: Vec<u32> = vec![0; source.len() + 1];
    for s in &accepted {
        opens[s.start as usize].push(s);
        closes[s.end() as usize] += 1;
    }
    for list in opens.iter_mut() {
        list.sort_by_key(|s| std::cmp::Reverse(s.len));
    }

    // Emit with an explicit element stack: runs ending at an offset are
    // the innermost open ones, so popping matches tags correctly.
    let mut out = String::with_capacity(source.len() * 2);
    let mut stack: Vec<&'static str> = Vec::new();
    for (i, b) in source.bytes().enumerate() {
        for _ in 0..closes[i] {
            if let Some(tag) = stack.pop() {
                out.push_str(tag);
            }
        }
        for s in &opens[i] {
            out.push_str(&open_tag(s));
            stack.push(close_tag(s.kind));
        }
        match b {
            b'&' => out.push_str("&amp;"),
            b'<' => out.push_str("&lt;"),
            b'>' => out.push_str("&gt;"),
            _ => out.push(b as char),
        }
    }
    for _ in 0..closes[source.len()] {
        if let Some(tag) = stack.pop() {
            out.push_str(tag);
        }
    }
    out
}

fn close_tag(kind: StyleKind) -> &'static str {
    match kind {
        StyleKind::Anchor | StyleKind::Link => "</a>",
        _ => "</span>",
    }
}

fn open_tag(s: &StyleRun) -> String {
    let title = s
        .message
        .as_deref()
        .map(|m| format!(" title=\"{}\"", escape(m)))
        .unwrap_or_default();
    match s.kind {
        StyleKind::Anchor => {
            let id = s.id.as_deref().unwrap_or("");
            format!("<a class=\"def\" id=\"{}\"{}>", escape(id), title)
        }
        StyleKind::Link => {
            let href = s.url.as_deref().unwrap_or("#");
            format!("<a class=\"ref\" href=\"{}\"{}>", escape(href), title)
        }
        _ => format!("<span class=\"{}\"{}>", s.kind.css_class(), title),
    }
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_source_text() {
        let out = apply_styles("a < b\n", vec![]);
        assert_eq!(out, "a &lt; b\n");
    }

    #[test]
    fn wraps_styled_ranges() {
        let styles = vec![StyleRun::new(StyleKind::Number, 4, 1)];
        let out = apply_styles("x = 1\n", styles);
        assert_eq!(out, "x = <span class=\"num\">1</span>\n");
    }

    #[test]
    fn partial_overlaps_are_dropped() {
        let styles = vec![
            StyleRun::new(StyleKind::Number, 0, 3),
            StyleRun::new(StyleKind::String, 2, 3),
        ];
        let out = apply_styles("abcde", styles);
        assert_eq!(out, "<span class=\"num\">abc</span>de");
    }

    #[test]
    fn nested_runs_nest_tags() {
        let styles = vec![
            StyleRun::new(StyleKind::String, 0, 5),
            StyleRun::new(StyleKind::Number, 1, 2),
        ];
        let out = apply_styles("abcde", styles);
        assert_eq!(
            out,
            "<span class=\"str\">a<span class=\"num\">bc</span>de</span>"
        );
    }

    #[test]
    fn anchor_and_link_tags() {
        let mut def = StyleRun::new(StyleKind::Anchor, 0, 1);
        def.id = Some("m.x".to_string());
        let out = apply_styles("x", vec![def]);
        assert_eq!(out, "<a class=\"def\" id=\"m.x\">x</a>");
    }
}
