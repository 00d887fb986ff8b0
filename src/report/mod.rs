//! Report assembly and rendering
//!
//! Combines profile, allocation, narrative and the optional SIP figure
//! into an immutable report, then renders it as a fixed-layout
//! paginated byte stream for the report sink. Rendering carries no
//! business logic and cannot fail for a well-formed report.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::models::{AdvisoryReport, Allocation, SipResult, UserProfile};
use crate::Result;

/// Fixed file name at the sink; each render overwrites the previous one.
pub const REPORT_FILE_NAME: &str = "wealth_report.txt";

const PAGE_WIDTH: usize = 72;
const LINES_PER_PAGE: usize = 54;

//
// ================= Assembly =================
//

pub fn assemble(
    profile: UserProfile,
    allocation: Allocation,
    narrative: impl Into<String>,
    sip: Option<SipResult>,
) -> AdvisoryReport {
    AdvisoryReport {
        report_id: Uuid::new_v4(),
        profile,
        allocation,
        narrative: narrative.into(),
        sip,
        created_at: Utc::now(),
    }
}

//
// ================= Rendering =================
//

/// Render the report as a paginated plain-text document.
pub fn render(report: &AdvisoryReport) -> Vec<u8> {
    let mut lines: Vec<String> = Vec::new();

    lines.push(center("WEALTH ADVISOR REPORT"));
    lines.push(center(&report.created_at.format("%Y-%m-%d").to_string()));
    lines.push(String::new());

    lines.push(format!(
        "Age: {} | Monthly Income: {:.2}",
        report.profile.age, report.profile.monthly_income
    ));
    lines.push(format!(
        "Risk Tolerance: {} | Goal: {}",
        report.profile.risk, report.profile.goal
    ));
    lines.push(String::new());

    lines.push("Portfolio Allocation:".to_string());
    for (class, percent) in report.allocation.entries() {
        lines.push(format!("  {}: {}%", class, percent));
    }
    lines.push(String::new());

    lines.push("Advisor's Explanation:".to_string());
    for paragraph in report.narrative.lines() {
        if paragraph.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(wrap(paragraph, PAGE_WIDTH));
        }
    }

    if let Some(sip) = &report.sip {
        lines.push(String::new());
        lines.push(format!(
            "Goal: {:.2} in {} years.",
            sip.target_amount, sip.years
        ));
        lines.push(format!(
            "Monthly SIP Needed: {:.2}",
            sip.monthly_contribution
        ));
    }

    paginate(lines).into_bytes()
}

fn center(text: &str) -> String {
    // Character count, not byte length: titles and narratives may
    // carry multi-byte currency symbols.
    let width = text.chars().count();
    if width >= PAGE_WIDTH {
        return text.to_string();
    }
    let pad = (PAGE_WIDTH - width) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Word-wrap one paragraph to the page width. Words longer than the
/// width are emitted on their own line rather than split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
        } else if line.len() + 1 + word.len() <= width {
            line.push(' ');
            line.push_str(word);
        } else {
            out.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        out.push(line);
    }
    out
}

/// Join lines into pages separated by form feeds, with a page footer.
fn paginate(lines: Vec<String>) -> String {
    let page_count = lines.len().div_ceil(LINES_PER_PAGE).max(1);
    let mut out = String::new();

    for (page, chunk) in lines.chunks(LINES_PER_PAGE).enumerate() {
        if page > 0 {
            out.push('\u{0c}');
        }
        for line in chunk {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&center(&format!("- Page {} of {} -", page + 1, page_count)));
        out.push('\n');
    }

    if lines.is_empty() {
        out.push_str(&center("- Page 1 of 1 -"));
        out.push('\n');
    }

    out
}

//
// ================= Report Sink =================
//

/// Write-once-per-render destination for the assembled document.
pub trait ReportSink: Send + Sync {
    fn publish(&self, bytes: &[u8]) -> Result<PathBuf>;
}

/// Overwrites a fixed file name in a configured directory.
pub struct FileReportSink {
    dir: PathBuf,
}

impl FileReportSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ReportSink for FileReportSink {
    fn publish(&self, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(REPORT_FILE_NAME);
        fs::write(&path, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Report published");
        Ok(path)
    }
}
