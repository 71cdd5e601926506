//! Problem records and rendering.
//!
//! Every semantic problem is recoverable: the transform substitutes
//! Unknown and keeps going, so diagnostics are uniformly warning-level.
//! Rendering goes through ariadne for humans and JSON lines for tools.

use std::fmt;
use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use sift_common::{LineIndex, Span};

/// One problem attached to a node or a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub file: String,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            file: file.into(),
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.span.start, self.message)
    }
}

/// Output controls, populated from CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticOptions {
    pub color: bool,
    pub json: bool,
}

/// Render one diagnostic against its source text.
///
/// JSON mode emits a single self-contained line; otherwise an ariadne
/// report with a labeled span.
pub fn render_diagnostic(diag: &Diagnostic, source: &str, options: &DiagnosticOptions) -> String {
    if options.json {
        return render_json(diag, source);
    }
    let config = Config::default().with_color(options.color);
    let span = clamp(diag.span, source.len());

    let mut out: Vec<u8> = Vec::new();
    let result = Report::<Range<usize>>::build(ReportKind::Warning, (), span.start)
        .with_message(&diag.message)
        .with_config(config)
        .with_label(Label::new(span).with_message(&diag.message))
        .finish()
        .write(Source::from(source), &mut out);
    match result {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => format!("warning: {}\n", diag),
    }
}

fn render_json(diag: &Diagnostic, source: &str) -> String {
    let index = LineIndex::new(source);
    let (line, col) = index.line_col(diag.span.start);
    let payload = serde_json::json!({
        "severity": "warning",
        "message": diag.message,
        "file": diag.file,
        "line": line,
        "col": col,
        "spans": [{
            "start": diag.span.start,
            "end": diag.span.end,
            "label": diag.message,
        }],
    });
    format!("{payload}\n")
}

/// Keep the labeled range inside the source and at least one byte wide, as
/// ariadne requires.
fn clamp(span: Span, source_len: usize) -> Range<usize> {
    let start = (span.start as usize).min(source_len);
    let end = (span.end as usize).min(source_len).max(start);
    if start == end {
        start..end.saturating_add(1).min(source_len.max(1))
    } else {
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rendering_is_one_line() {
        let d = Diagnostic::new("m.py", Span::new(4, 5), "undefined name: y");
        let out = render_json(&d, "x = y\n");
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("\"undefined name: y\""));
        assert!(out.contains("\"line\":1"));
    }

    #[test]
    fn human_rendering_includes_message() {
        let d = Diagnostic::new("m.py", Span::new(4, 5), "undefined name: y");
        let out = render_diagnostic(
            &d,
            "x = y\n",
            &DiagnosticOptions {
                color: false,
                json: false,
            },
        );
        assert!(out.contains("undefined name: y"));
    }

    #[test]
    fn clamp_handles_out_of_range_spans() {
        let r = clamp(Span::new(100, 200), 5);
        assert_eq!(r, 5..5);
        let r = clamp(Span::new(2, 2), 5);
        assert_eq!(r, 2..3);
    }
}
