//! Boundary codecs for job files: delimited rows and fixed-width rows.

use coder_core::{Job, JobId};
use thiserror::Error;

const ID_END: usize = 7;
const DESCRIPTION_END: usize = 49;

/// Egress column widths for fixed-width output, in output order.
pub const FIXED_WIDTHS: FixedWidths = FixedWidths {
    id: 7,
    description: 42,
    code: 4,
    code_description: 60,
    code_score: 6,
    code_rank: 4,
};

pub const NULL_SENTINEL: &str = "Null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidths {
    pub id: usize,
    pub description: usize,
    pub code: usize,
    pub code_description: usize,
    pub code_score: usize,
    pub code_rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Delimited { delimiter: char, has_header: bool },
    FixedWidth,
}

impl FileFormat {
    pub fn csv() -> Self {
        FileFormat::Delimited {
            delimiter: ',',
            has_header: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}

pub fn parse_jobs(text: &str, format: FileFormat) -> Result<Vec<Job>, FormatError> {
    match format {
        FileFormat::Delimited {
            delimiter,
            has_header,
        } => parse_delimited(text, delimiter, has_header),
        FileFormat::FixedWidth => parse_fixed_width(text),
    }
}

pub fn render_jobs(jobs: &[Job], format: FileFormat) -> String {
    match format {
        FileFormat::Delimited {
            delimiter,
            has_header,
        } => render_delimited(jobs, delimiter, has_header),
        FileFormat::FixedWidth => render_fixed_width(jobs, FIXED_WIDTHS),
    }
}

/// Rows of `[id, description, ...extra]`; extra columns are kept in `excess`.
pub fn parse_delimited(text: &str, delimiter: char, has_header: bool) -> Result<Vec<Job>, FormatError> {
    let mut jobs = Vec::new();
    for (index, raw) in text.lines().enumerate().skip(usize::from(has_header)) {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let mut fields = split_fields(raw, delimiter, line)?.into_iter();
        let id = fields
            .next()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(FormatError::MissingField { line, field: "id" })?;
        let description = fields
            .next()
            .ok_or(FormatError::MissingField {
                line,
                field: "description",
            })?
            .trim()
            .to_string();
        let extra: Vec<String> = fields.filter(|field| !field.trim().is_empty()).collect();

        let mut job = Job::new(JobId::new(id), description);
        if !extra.is_empty() {
            job.excess = Some(extra.join(&delimiter.to_string()));
        }
        jobs.push(job);
    }
    Ok(jobs)
}

/// Rows with the id in columns 0..7 and the description in 7..49.
pub fn parse_fixed_width(text: &str) -> Result<Vec<Job>, FormatError> {
    let mut jobs = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let chars: Vec<char> = raw.chars().collect();
        let id = column(&chars, 0, ID_END);
        if id.is_empty() {
            return Err(FormatError::MissingField { line, field: "id" });
        }
        let description = column(&chars, ID_END, DESCRIPTION_END);
        let excess = column(&chars, DESCRIPTION_END, chars.len());

        let mut job = Job::new(JobId::new(id), description);
        if !excess.is_empty() {
            job.excess = Some(excess);
        }
        jobs.push(job);
    }
    Ok(jobs)
}

pub fn render_delimited(jobs: &[Job], delimiter: char, has_header: bool) -> String {
    let mut out = String::new();
    if has_header {
        let header = [
            "id",
            "description",
            "description_orig",
            "code",
            "code_description",
            "code_score",
            "code_rank",
        ];
        out.push_str(&header.join(&delimiter.to_string()));
        out.push('\n');
    }
    for job in jobs {
        let fields = [
            job.id.to_string(),
            job.description.clone(),
            job.description_orig.clone(),
            job.code.clone(),
            job.code_description.clone(),
            job.code_score.map(|score| score.to_string()).unwrap_or_default(),
            job.code_rank.map(|rank| rank.to_string()).unwrap_or_default(),
        ];
        let quoted: Vec<String> = fields
            .iter()
            .map(|field| quote_field(field, delimiter))
            .collect();
        out.push_str(&quoted.join(&delimiter.to_string()));
        out.push('\n');
    }
    out
}

pub fn render_fixed_width(jobs: &[Job], widths: FixedWidths) -> String {
    let mut out = String::new();
    for job in jobs {
        let score = job.code_score.map(|score| format!("{score:.4}"));
        let rank = job.code_rank.map(|rank| rank.to_string());
        out.push_str(&fit(Some(job.id.as_str()), widths.id));
        out.push_str(&fit(Some(job.description.as_str()), widths.description));
        out.push_str(&fit(Some(job.code.as_str()), widths.code));
        out.push_str(&fit(Some(job.code_description.as_str()), widths.code_description));
        out.push_str(&fit(score.as_deref(), widths.code_score));
        out.push_str(&fit(rank.as_deref(), widths.code_rank));
        out.push('\n');
    }
    out
}

fn column(chars: &[char], start: usize, end: usize) -> String {
    let end = end.min(chars.len());
    if start >= end {
        return String::new();
    }
    chars[start..end].iter().collect::<String>().trim().to_string()
}

/// Pads or truncates to exactly `width` characters; blanks become the null sentinel.
fn fit(value: Option<&str>, width: usize) -> String {
    let value = match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => NULL_SENTINEL,
    };
    let truncated: String = value.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn split_fields(raw: &str, delimiter: char, line: usize) -> Result<Vec<String>, FormatError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(FormatError::UnterminatedQuote { line });
    }
    fields.push(current);
    Ok(fields)
}
