//! JSON results and the self-contained HTML report

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::E2eResult;
use crate::runner::{TestResult, TestStatus, TestSuiteResult};

pub const RESULTS_FILE: &str = "test-results.json";
pub const REPORT_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Write `test-results.json` and `index.html` into `dir`.
pub fn write_reports(results: &TestSuiteResult, dir: &Path) -> E2eResult<ReportPaths> {
    std::fs::create_dir_all(dir)?;

    let json = dir.join(RESULTS_FILE);
    std::fs::write(&json, serde_json::to_string_pretty(results)?)?;
    info!("Results written to: {}", json.display());

    let html = dir.join(REPORT_FILE);
    std::fs::write(&html, render_html(results))?;
    info!("Report written to: {}", html.display());

    Ok(ReportPaths { json, html })
}

/// Render every result, failures first.
pub fn render_html(results: &TestSuiteResult) -> String {
    let title = html_escape::encode_text(&results.title);
    let mut out = String::new();

    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
.summary span {{ margin-right: 1.5rem; }}
.test {{ border-left: 4px solid #ccc; padding: 0.5rem 1rem; margin: 0.75rem 0; }}
.passed {{ border-color: #2e7d32; }}
.flaky {{ border-color: #f9a825; }}
.failed {{ border-color: #c62828; }}
pre {{ background: #f5f5f5; padding: 0.5rem; white-space: pre-wrap; }}
img {{ max-width: 640px; border: 1px solid #ddd; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{base_url} &middot; {started}</p>
<div class="summary"><span>Total: {total}</span><span>Passed: {passed}</span><span>Flaky: {flaky}</span><span>Failed: {failed}</span><span>Skipped: {skipped}</span><span>{duration} ms</span></div>
"#,
        title = title,
        base_url = html_escape::encode_text(&results.base_url),
        started = results.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        total = results.total,
        passed = results.passed,
        flaky = results.flaky,
        failed = results.failed,
        skipped = results.skipped,
        duration = results.duration_ms,
    );

    let mut ordered: Vec<&TestResult> = results.results.iter().collect();
    ordered.sort_by_key(|r| match r.status {
        TestStatus::Failed => 0,
        TestStatus::Flaky => 1,
        TestStatus::Passed => 2,
    });
    for result in ordered {
        render_test(&mut out, result);
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_test(out: &mut String, result: &TestResult) {
    let class = match result.status {
        TestStatus::Passed => "passed",
        TestStatus::Flaky => "flaky",
        TestStatus::Failed => "failed",
    };
    let _ = writeln!(
        out,
        r#"<div class="test {class}"><h3>{suite} &rsaquo; {name}</h3><p>{class} in {ms} ms, {n} attempt(s)</p>"#,
        class = class,
        suite = html_escape::encode_text(&result.suite),
        name = html_escape::encode_text(&result.name),
        ms = result.duration_ms,
        n = result.attempts.len(),
    );

    for attempt in result.attempts.iter().filter(|a| !a.success) {
        let _ = write!(out, "<h4>Attempt {}</h4>", attempt.attempt);
        if let Some(step) = &attempt.failed_step {
            let _ = write!(out, "<p>Step {}</p>", html_escape::encode_text(step));
        }
        if let Some(error) = &attempt.error {
            let _ = write!(out, "<pre>{}</pre>", html_escape::encode_text(error));
        }
        if let Some(path) = &attempt.screenshot {
            render_screenshot(out, path);
        }
    }
    out.push_str("</div>\n");
}

fn render_screenshot(out: &mut String, path: &Path) {
    match std::fs::read(path) {
        Ok(bytes) => {
            let _ = write!(
                out,
                r#"<img alt="{}" src="data:image/png;base64,{}">"#,
                html_escape::encode_double_quoted_attribute(&path.display().to_string()),
                BASE64.encode(bytes)
            );
        }
        Err(e) => {
            warn!("Screenshot {} not embedded: {}", path.display(), e);
            let _ = write!(
                out,
                "<p>Screenshot unavailable: {}</p>",
                html_escape::encode_text(&path.display().to_string())
            );
        }
    }
}
