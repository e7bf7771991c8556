//! Analyzer output → diagnostics.
//!
//! `luau-analyze` prints one report per line. Two shapes are recognized:
//!
//! ```text
//! src/init.luau:3.7-3.12: TypeError: Unknown global 'foo'      (--formatter=gnu)
//! src/init.luau(3,7): LocalUnused: Variable 'x' is never used  (default)
//! ```
//!
//! Anything else (blank lines, continuation lines of multi-line messages,
//! summary output) is skipped.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use luau_watch_types::{Diagnostic, Position, Range, Severity};
use regex::Regex;

static GNU_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<file>.+?):(?P<l1>\d+)\.(?P<c1>\d+)-(?P<l2>\d+)\.(?P<c2>\d+): (?P<cat>[A-Za-z]+): (?P<msg>.*)$")
        .expect("gnu report pattern is valid")
});

static DEFAULT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\): (?P<cat>[A-Za-z]+): (?P<msg>.*)$")
        .expect("default report pattern is valid")
});

/// One recognized report line, before file scoping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Report {
    pub file: String,
    pub diagnostic: Diagnostic,
}

fn number(caps: &regex::Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

pub(crate) fn parse_line(line: &str) -> Option<Report> {
    let line = line.trim_end_matches('\r');

    let (caps, range) = if let Some(caps) = GNU_LINE.captures(line) {
        // Begin is 1-based; the printed end column is the exclusive 0-based one.
        let start = Position::new(
            number(&caps, "l1")?.saturating_sub(1),
            number(&caps, "c1")?.saturating_sub(1),
        );
        let end = Position::new(number(&caps, "l2")?.saturating_sub(1), number(&caps, "c2")?);
        (caps, Range::new(start, end.max(start)))
    } else if let Some(caps) = DEFAULT_LINE.captures(line) {
        let start = Position::new(
            number(&caps, "line")?.saturating_sub(1),
            number(&caps, "col")?.saturating_sub(1),
        );
        (caps, Range::point(start))
    } else {
        return None;
    };

    let category = caps["cat"].to_string();
    Some(Report {
        file: caps["file"].to_string(),
        diagnostic: Diagnostic::new(
            range,
            Severity::from_category(&category),
            category,
            caps["msg"].trim().to_string(),
        ),
    })
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for c in path.components() {
        match c {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Whether a file name printed by the analyzer refers to `target`.
///
/// The analyzer echoes the path it was given. Relative reports are resolved
/// against `base`, the directory the analyzer ran in; without one they never
/// match.
fn is_same_file(reported: &str, target: &Path, base: Option<&Path>) -> bool {
    let reported = Path::new(reported);
    if reported == target {
        return true;
    }
    if reported.is_relative() {
        return base.is_some_and(|base| normalize(&base.join(reported)) == normalize(target));
    }
    normalize(reported) == normalize(target)
}

/// Parse all reports in `output` that belong to `file`.
///
/// `base` is the analyzer's working directory.
pub fn parse_output(output: &str, file: &Path, base: Option<&Path>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for line in output.lines() {
        let Some(report) = parse_line(line) else {
            if !line.trim().is_empty() {
                tracing::trace!(line, "Skipping unrecognized analyzer output");
            }
            continue;
        };
        if !is_same_file(&report.file, file, base) {
            tracing::trace!(reported = %report.file, "Skipping report for another file");
            continue;
        }
        diagnostics.push(report.diagnostic);
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gnu_line() {
        let report = parse_line("/w/src/a.luau:3.7-3.12: TypeError: Unknown global 'foo'").unwrap();
        assert_eq!(report.file, "/w/src/a.luau");
        let d = report.diagnostic;
        assert_eq!(d.range().start, Position::new(2, 6));
        assert_eq!(d.range().end, Position::new(2, 12));
        assert_eq!(d.severity(), Severity::Error);
        assert_eq!(d.category(), "TypeError");
        assert_eq!(d.message(), "Unknown global 'foo'");
    }

    #[test]
    fn test_parse_default_line() {
        let report =
            parse_line("src/a.lua(10,1): LocalUnused: Variable 'x' is never used; prefix with '_' to silence")
                .unwrap();
        assert_eq!(report.file, "src/a.lua");
        let d = report.diagnostic;
        assert_eq!(d.range(), Range::point(Position::new(9, 0)));
        assert_eq!(d.severity(), Severity::Warning);
        assert_eq!(
            d.message(),
            "Variable 'x' is never used; prefix with '_' to silence"
        );
    }

    #[test]
    fn test_message_keeps_inner_colons() {
        let report = parse_line("a.luau(1,1): TypeError: Type 'a' could not be converted into 'b': caused by x")
            .unwrap();
        assert_eq!(
            report.diagnostic.message(),
            "Type 'a' could not be converted into 'b': caused by x"
        );
    }

    #[test]
    fn test_windows_drive_path_gnu() {
        let report = parse_line(r"C:\w\a.luau:1.1-1.4: SyntaxError: Expected identifier").unwrap();
        assert_eq!(report.file, r"C:\w\a.luau");
        assert_eq!(report.diagnostic.severity(), Severity::Error);
    }

    #[test]
    fn test_crlf_tolerated() {
        assert!(parse_line("a.luau(2,3): TypeError: bad\r").is_some());
    }

    #[test]
    fn test_empty_output_yields_nothing() {
        assert!(parse_output("", Path::new("/w/a.luau"), None).is_empty());
    }

    #[test]
    fn test_unrecognized_lines_skipped() {
        let output = "\
/w/a.luau:1.1-1.5: TypeError: first
caused by:
  Property 'x' is not compatible
Analysis done

/w/a.luau(4,2): ImplicitReturn: second
";
        let diags = parse_output(output, Path::new("/w/a.luau"), None);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message(), "first");
        assert_eq!(diags[1].message(), "second");
    }

    #[test]
    fn test_reports_for_other_files_dropped() {
        let output = "\
/w/other.luau:1.1-1.2: TypeError: not mine
/w/a.luau:2.1-2.2: TypeError: mine
";
        let diags = parse_output(output, Path::new("/w/a.luau"), None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message(), "mine");
    }

    #[test]
    fn test_relative_report_resolved_against_working_dir() {
        let diags = parse_output(
            "./src/a.luau(1,1): TypeError: rel",
            Path::new("/w/src/a.luau"),
            Some(Path::new("/w")),
        );
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_relative_report_for_same_name_elsewhere_dropped() {
        // `a.luau` relative to /w is /w/a.luau, not /w/src/a.luau.
        let output = "a.luau:1.1-1.2: TypeError: top-level file";
        let target = Path::new("/w/src/a.luau");
        assert!(parse_output(output, target, Some(Path::new("/w"))).is_empty());
        assert_eq!(
            parse_output(output, target, Some(Path::new("/w/src"))).len(),
            1
        );
    }

    #[test]
    fn test_relative_report_without_working_dir_dropped() {
        let diags = parse_output(
            "src/a.luau(1,1): TypeError: rel",
            Path::new("/w/src/a.luau"),
            None,
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_absolute_report_with_dot_segments_matches() {
        let diags = parse_output(
            "/w/src/../src/a.luau(1,1): TypeError: abs",
            Path::new("/w/src/a.luau"),
            None,
        );
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_inverted_gnu_range_clamped() {
        // Multi-line reports whose end precedes start must not produce a negative range.
        let report = parse_line("a.luau:5.9-5.0: TypeError: odd").unwrap();
        let range = report.diagnostic.range();
        assert!(range.end >= range.start);
    }
}
