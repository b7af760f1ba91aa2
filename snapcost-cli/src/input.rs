use anyhow::anyhow;
use snapcost_core::{ResourceRequest, Result, SizeInput, SnapcostError};
use std::path::Path;
use tracing::debug;

const TYPE_COLUMNS: &[&str] = &["type", "storage_type"];
const SIZE_COLUMNS: &[&str] = &["size_gb", "size"];
const JOB_COLUMNS: &[&str] = &["job", "schedule"];

/// Reads resource requests from a CSV, JSON or YAML file, picked by
/// extension. Rows are not validated here; bad rows fail individually when
/// projected.
pub fn load_requests(path: &Path) -> Result<Vec<ResourceRequest>> {
    let content = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let requests = match extension.as_str() {
        "csv" => parse_csv(&content)?,
        "json" => serde_json::from_str(&content)?,
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        other => {
            return Err(SnapcostError::Other(anyhow!(
                "Unsupported resource file '{}' (extension '{}'); use .csv, .json or .yaml",
                path.display(),
                other
            )));
        }
    };

    debug!("Read {} resources from {}", requests.len(), path.display());
    Ok(requests)
}

pub fn parse_csv(content: &str) -> Result<Vec<ResourceRequest>> {
    let mut records = read_records(content)?.into_iter();

    let (_, header) = records
        .next()
        .ok_or_else(|| SnapcostError::Other(anyhow!("CSV file has no header row")))?;
    let header: Vec<String> = header
        .into_iter()
        .map(|column| column.trim().to_lowercase())
        .collect();

    let column = |names: &[&str]| header.iter().position(|c| names.contains(&c.as_str()));
    let type_col = column(TYPE_COLUMNS)
        .ok_or_else(|| SnapcostError::Other(anyhow!("CSV header has no 'type' column")))?;
    let size_col = column(SIZE_COLUMNS)
        .ok_or_else(|| SnapcostError::Other(anyhow!("CSV header has no 'size_gb' column")))?;
    let job_col = column(JOB_COLUMNS);

    let mut requests = Vec::new();
    for (line_no, fields) in records {
        let field = |index: usize| fields.get(index).map(|f| f.trim()).unwrap_or("");

        if fields.len() > header.len() {
            debug!(
                "Line {} has {} fields, header has {}",
                line_no,
                fields.len(),
                header.len()
            );
        }

        let job = job_col.map(field).filter(|job| !job.is_empty());
        requests.push(ResourceRequest {
            storage_type: field(type_col).to_string(),
            size_gb: SizeInput::Text(field(size_col).to_string()),
            job: job.map(str::to_string),
        });
    }

    Ok(requests)
}

/// Splits CSV content into records, each tagged with the line it starts on.
/// Quoted fields may contain commas and line breaks, and `""` inside quotes
/// is a literal quote. Blank lines are skipped.
fn read_records(content: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut line_no = 1;
    let mut record_start = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            '\r' if !quoted && chars.peek() == Some(&'\n') => {}
            '\n' if !quoted => {
                fields.push(std::mem::take(&mut current));
                push_record(&mut records, record_start, std::mem::take(&mut fields));
                line_no += 1;
                record_start = line_no;
            }
            '\n' => {
                current.push(c);
                line_no += 1;
            }
            _ => current.push(c),
        }
    }

    if quoted {
        return Err(SnapcostError::Other(anyhow!(
            "Unterminated quoted field starting on line {record_start}"
        )));
    }
    fields.push(current);
    push_record(&mut records, record_start, fields);

    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line_no: usize, fields: Vec<String>) {
    let blank = fields.iter().all(|field| field.trim().is_empty()) && fields.len() == 1;
    if !blank {
        records.push((line_no, fields));
    }
}
