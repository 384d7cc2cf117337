//! HTML report accumulation.
//!
//! A report is a single HTML file that grows while tests run:
//!
//! 1. [`Report::initialize`] writes the head, styles and page header.
//! 2. [`Report::append_result`] appends one block per test result.
//! 3. [`Report::insert_summary_table`] injects the summary table right after
//!    `<body>`, ahead of every result block, and closes the document.

use std::{
    fmt::Write as _,
    fs::{self, OpenOptions},
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::result::{TestResult, Verdict};

const BODY_MARKER: &str = "<body>";
const DOCUMENT_END: &str = "</body>\n</html>";
const COMPACT_DOCUMENT_END: &str = "</body></html>";

const STYLE: &str = r"
        body {
            font-family: 'Inter', 'Segoe UI', Arial, sans-serif;
            background: #181c24;
            color: #f4f6fb;
            margin: 0;
            padding: 0;
        }
        .header {
            background: #232a36;
            color: #4f8cff;
            padding: 24px 0;
            text-align: center;
            font-size: 2.2rem;
            font-weight: 700;
            letter-spacing: 2px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.12);
        }
        .generated, .footer {
            text-align: center;
            color: #b0b8c1;
            font-size: 0.9rem;
        }
        h2 {
            color: #4f8cff;
            text-align: center;
        }
        .report-block {
            background: #232a36;
            border-left: 6px solid #4f8cff;
            padding: 20px 28px;
            margin: 32px auto;
            box-shadow: 0 4px 24px rgba(0,0,0,0.18);
            border-radius: 12px;
            max-width: 700px;
        }
        .label {
            font-weight: bold;
            color: #b0b8c1;
        }
        table {
            width: 90%;
            margin: 32px auto 24px auto;
            border-collapse: collapse;
            background: #232a36;
        }
        th, td {
            border: 1px solid #2c3440;
            padding: 10px;
            text-align: left;
        }
        th {
            color: #4f8cff;
        }
        tr:nth-child(even) {
            background-color: #181c24;
        }
        img {
            max-width: 100%;
            margin-top: 18px;
            border-radius: 8px;
            background: #fff;
        }
";

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub hypothesis: String,
    pub test: String,
    pub p_value: f64,
    pub verdict: Verdict,
}

/// Escapes text for embedding in HTML content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Formats a number with four decimal places; NaN is shown as `-`.
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "-".to_owned()
    } else {
        format!("{value:.4}")
    }
}

/// A report file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    path: PathBuf,
}

impl Report {
    /// Refers to a report at `path` without touching the file system.
    pub fn open<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }

    /// Creates (or truncates) the report at `path` and writes the document head.
    ///
    /// Parent directories are created as needed.
    pub fn initialize<P>(path: P) -> io::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let report = Self::open(path);
        report.write_header()?;
        Ok(report)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_header(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let header = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"utf-8\">\n    \
             <title>Stats Court Report</title>\n    <style>{STYLE}    </style>\n</head>\n\
             {BODY_MARKER}\n    <div class=\"header\">Stats Court Report</div>\n    \
             <p class=\"generated\">Generated {generated}</p>\n"
        );
        fs::write(&self.path, header)?;
        log::info!("Initialized new report at {}", self.path.display());
        Ok(())
    }

    /// Appends one result block to the end of the document.
    ///
    /// The plot, if any, is referenced as `/plots/<file name>`.
    pub fn append_result(
        &self,
        hypothesis: &str,
        test_name: &str,
        result: &TestResult,
    ) -> io::Result<()> {
        let mut block = String::new();
        let _ = write!(
            block,
            r#"
    <div class="report-block">
        <p><span class="label">Hypothesis:</span> <strong>{hypothesis}</strong></p>
        <p><span class="label">Test Used:</span> {test_name}</p>
        <p><span class="label">Test Statistic:</span> {statistic}</p>
        <p><span class="label">p-value:</span> {p_value}</p>
        <p><span class="label">Conclusion:</span> <strong>{verdict}</strong></p>
        <p><span class="label">Interpretation:</span> {interpretation}</p>
"#,
            hypothesis = escape_html(hypothesis),
            test_name = escape_html(test_name),
            statistic = format_value(result.statistic),
            p_value = format_value(result.p_value),
            verdict = escape_html(&result.verdict.to_string()),
            interpretation = escape_html(&result.interpretation),
        );
        if let Some(file_name) = result.plot.as_deref().and_then(Path::file_name) {
            let _ = writeln!(
                block,
                r#"        <img src="/plots/{}" alt="plot" />"#,
                escape_html(&file_name.to_string_lossy())
            );
        }
        block.push_str("    </div>\n");

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        log::debug!("Appended result block for '{hypothesis}'");
        Ok(())
    }

    /// Inserts the summary table right after `<body>` and closes the document
    /// if it is not closed yet.
    ///
    /// A missing report file is initialized first.
    pub fn insert_summary_table(&self, rows: &[SummaryRow]) -> io::Result<()> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "Report file {} not found; initializing a new report",
                    self.path.display()
                );
                self.write_header()?;
                fs::read_to_string(&self.path)?
            }
            Err(err) => return Err(err),
        };

        let table = summary_table_html(rows);
        let mut updated = content.replacen(BODY_MARKER, &format!("{BODY_MARKER}\n{table}"), 1);

        let trimmed = updated.trim_end();
        if !trimmed.ends_with(DOCUMENT_END) && !trimmed.ends_with(COMPACT_DOCUMENT_END) {
            updated.push_str(
                "\n    <footer class=\"footer\">Generated by statcourt</footer>\n",
            );
            updated.push_str(DOCUMENT_END);
            updated.push('\n');
        }

        fs::write(&self.path, updated)?;
        log::info!("Summary table with {} row(s) added to top of report", rows.len());
        Ok(())
    }
}

fn summary_table_html(rows: &[SummaryRow]) -> String {
    let mut html = String::from(
        "    <h2>Summary of Tests</h2>
    <table>
        <tr>
            <th>Hypothesis</th>
            <th>Test</th>
            <th>p-value</th>
            <th>Verdict</th>
        </tr>
",
    );
    for row in rows {
        let _ = write!(
            html,
            "        <tr>
            <td>{}</td>
            <td>{}</td>
            <td>{}</td>
            <td><strong>{}</strong></td>
        </tr>
",
            escape_html(&row.hypothesis),
            escape_html(&row.test),
            format_value(row.p_value),
            escape_html(&row.verdict.to_string()),
        );
    }
    html.push_str("    </table>\n    <hr/>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(p_value: f64, plot: Option<&str>) -> TestResult {
        TestResult {
            statistic: 2.345_678_9,
            p_value,
            verdict: Verdict::from_p_value(p_value),
            interpretation: "a < b & c".to_owned(),
            plot: plot.map(PathBuf::from),
        }
    }

    fn row(hypothesis: &str, p_value: f64) -> SummaryRow {
        SummaryRow {
            hypothesis: hypothesis.to_owned(),
            test: "T-test".to_owned(),
            p_value,
            verdict: Verdict::from_p_value(p_value),
        }
    }

    fn data_rows(content: &str) -> usize {
        content.matches("<td><strong>").count()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.123_456), "0.1235");
        assert_eq!(format_value(3.0), "3.0000");
        assert_eq!(format_value(f64::NAN), "-");
    }

    #[test]
    fn test_initialize_creates_parent_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results/nested/report.html");
        let report = Report::initialize(&path).unwrap();
        report.append_result("h", "t", &result(0.5, None)).unwrap();

        let report = Report::initialize(&path).unwrap();
        let content = fs::read_to_string(report.path()).unwrap();
        assert!(content.contains(BODY_MARKER));
        assert!(!content.contains("report-block\">"));
    }

    #[test]
    fn test_append_result() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::initialize(dir.path().join("report.html")).unwrap();
        report
            .append_result(
                "x <b>",
                "Chi-square Test",
                &result(0.012_34, Some("/tmp/out/plots/chi2_a_vs_b.png")),
            )
            .unwrap();

        let content = fs::read_to_string(report.path()).unwrap();
        assert!(content.contains("<strong>x &lt;b&gt;</strong>"));
        assert!(content.contains("Test Statistic:</span> 2.3457"));
        assert!(content.contains("p-value:</span> 0.0123"));
        assert!(content.contains("<strong>Reject H₀</strong>"));
        assert!(content.contains("a &lt; b &amp; c"));
        assert!(content.contains(r#"<img src="/plots/chi2_a_vs_b.png" alt="plot" />"#));
    }

    #[test]
    fn test_append_without_plot() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::initialize(dir.path().join("report.html")).unwrap();
        report.append_result("h", "t", &result(0.5, None)).unwrap();
        let content = fs::read_to_string(report.path()).unwrap();
        assert!(!content.contains("<img"));
        assert!(content.contains("Fail to Reject H₀"));
    }

    #[test]
    fn test_empty_summary_table() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::initialize(dir.path().join("report.html")).unwrap();
        report.insert_summary_table(&[]).unwrap();

        let content = fs::read_to_string(report.path()).unwrap();
        assert!(content.contains("<th>Hypothesis</th>"));
        assert_eq!(data_rows(&content), 0);
        assert!(content.trim_end().ends_with(DOCUMENT_END));
        assert_eq!(content.matches("<html>").count(), 1);
        assert_eq!(content.matches("</html>").count(), 1);
    }

    #[test]
    fn test_summary_precedes_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::initialize(dir.path().join("report.html")).unwrap();
        report.append_result("first", "t", &result(0.5, None)).unwrap();
        report.append_result("second", "t", &result(0.01, None)).unwrap();
        report
            .insert_summary_table(&[row("first", 0.5), row("second", 0.01)])
            .unwrap();

        let content = fs::read_to_string(report.path()).unwrap();
        let body = content.find(BODY_MARKER).unwrap();
        let table = content.find("Summary of Tests").unwrap();
        let first_block = content.find("report-block\">").unwrap();
        assert!(body < table && table < first_block);
        assert_eq!(data_rows(&content), 2);
        let first_row = content.find("<td>first</td>").unwrap();
        let second_row = content.find("<td>second</td>").unwrap();
        assert!(first_row < second_row && second_row < first_block);
    }

    #[test]
    fn test_summary_auto_initializes_missing_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::open(dir.path().join("missing/report.html"));
        report.insert_summary_table(&[row("h", 0.2)]).unwrap();

        let content = fs::read_to_string(report.path()).unwrap();
        assert!(content.contains("Stats Court Report"));
        assert_eq!(data_rows(&content), 1);
        assert!(content.trim_end().ends_with(DOCUMENT_END));
    }

    #[test]
    fn test_closed_document_is_not_closed_again() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::initialize(dir.path().join("report.html")).unwrap();
        report.insert_summary_table(&[]).unwrap();
        report.insert_summary_table(&[]).unwrap();

        let content = fs::read_to_string(report.path()).unwrap();
        assert_eq!(content.matches("</html>").count(), 1);
    }
}
