//! Diagnostic formatting for the Quill CLI.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use quill_core::{CompilationPhase, Diagnostic, DiagnosticSeverity};

/// Get the display color for a compilation phase.
pub fn phase_color(phase: &CompilationPhase) -> Color {
    match phase {
        CompilationPhase::Parsing => Color::Red,
        CompilationPhase::NameResolution => Color::Yellow,
        CompilationPhase::Binding => Color::Magenta,
        CompilationPhase::Conversion => Color::Cyan,
    }
}

fn report_kind(severity: DiagnosticSeverity) -> ReportKind<'static> {
    match severity {
        DiagnosticSeverity::Error => ReportKind::Error,
        DiagnosticSeverity::Warning => ReportKind::Warning,
        DiagnosticSeverity::Info => ReportKind::Advice,
    }
}

/// Normalize a span to ensure end > start (required by ariadne).
pub fn normalize_span(start: usize, end: usize) -> (usize, usize) {
    (start, end.max(start + 1))
}

fn build_report<'a>(
    diag: &'a Diagnostic,
    file_path: &'a str,
    color: bool,
) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
    let (start, end) = normalize_span(diag.span.start, diag.span.end);
    Report::build(report_kind(diag.severity), (file_path, start..end))
        .with_config(Config::default().with_color(color))
        .with_code(format!("QS{:04}", diag.code))
        .with_message(&diag.message)
        .with_label(
            Label::new((file_path, start..end))
                .with_message(format!("{:?}", diag.phase))
                .with_color(phase_color(&diag.phase)),
        )
        .finish()
}

/// Print a diagnostic using ariadne for pretty output.
pub fn print_diagnostic(diag: &Diagnostic, source: &str, file_path: &str) {
    build_report(diag, file_path, true)
        .eprint((file_path, Source::from(source.to_owned())))
        .ok();
}

/// Render a diagnostic without colors, as printed for non-terminal output
/// and in tests.
pub fn render_diagnostic(diag: &Diagnostic, source: &str, file_path: &str) -> String {
    let mut buffer = Vec::new();
    build_report(diag, file_path, false)
        .write((file_path, Source::from(source.to_owned())), &mut buffer)
        .ok();
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Span;
    use quill_core::diagnostic::codes;

    #[test]
    fn test_phase_color_parsing() {
        assert_eq!(phase_color(&CompilationPhase::Parsing), Color::Red);
    }

    #[test]
    fn test_phase_color_name_resolution() {
        assert_eq!(
            phase_color(&CompilationPhase::NameResolution),
            Color::Yellow
        );
    }

    #[test]
    fn test_phase_color_binding() {
        assert_eq!(phase_color(&CompilationPhase::Binding), Color::Magenta);
    }

    #[test]
    fn test_normalize_span_valid() {
        assert_eq!(normalize_span(0, 10), (0, 10));
        assert_eq!(normalize_span(5, 15), (5, 15));
    }

    #[test]
    fn test_normalize_span_zero_length() {
        assert_eq!(normalize_span(5, 5), (5, 6));
        assert_eq!(normalize_span(0, 0), (0, 1));
    }

    #[test]
    fn test_render_diagnostic_names_code_and_message() {
        let source = "using Supremacy.Game;\nSector";
        let diag = Diagnostic::error(
            codes::AMBIGUOUS_REFERENCE,
            "'Sector' is an ambiguous reference",
            Span::new(22, 28),
            CompilationPhase::NameResolution,
        );
        let rendered = render_diagnostic(&diag, source, "script.qs");
        assert!(rendered.contains("[QS0104]"), "{rendered}");
        assert!(rendered.contains("'Sector' is an ambiguous reference"), "{rendered}");
        assert!(rendered.contains("script.qs"), "{rendered}");
    }
}
