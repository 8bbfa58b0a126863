//! Writing downloaded exports to disk
//!
//! The portal serves every export as tab-separated text. `XLS` exports are
//! re-packed into an `.xlsx` workbook, one worksheet row per line; `TSV`
//! exports are written back out line by line.

use crate::errors::ConnectMlsError;
use log::info;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File formats `download` can write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xls,
    Tsv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xls => "xlsx",
            ExportFormat::Tsv => "tsv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ConnectMlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "XLS" => Ok(ExportFormat::Xls),
            "TSV" => Ok(ExportFormat::Tsv),
            _ => Err(ConnectMlsError::UnsupportedExportType(s.to_string())),
        }
    }
}

fn output_path(name: &str, format: ExportFormat, dir: Option<&Path>) -> PathBuf {
    let file_name = format!("{}.{}", name, format.extension());
    match dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Split tab-separated export bytes into rows of cells
///
/// Each line is one row; a blank line is an empty row. Quoted cells follow the
/// usual CSV quoting rules within a line, and rows may differ in length.
pub fn parse_tsv_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, ConnectMlsError> {
    let text = std::str::from_utf8(bytes)?;
    text.lines().map(parse_tsv_line).collect()
}

fn parse_tsv_line(line: &str) -> Result<Vec<String>, ConnectMlsError> {
    if line.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

/// Write an export as `<name>.xlsx`
///
/// # Arguments
/// * `name` - file name without extension
/// * `bytes` - tab-separated export content
/// * `dir` - target directory; the working directory when `None`
///
/// # Returns
/// * the path written
pub fn convert_to_excel(name: &str, bytes: &[u8], dir: Option<&Path>) -> Result<PathBuf, ConnectMlsError> {
    let rows = parse_tsv_rows(bytes)?;
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r)
            .map_err(|_| ConnectMlsError::GenericError("too many rows for a worksheet".to_string()))?;
        for (c, cell) in row.iter().enumerate() {
            let c = u16::try_from(c).map_err(|_| {
                ConnectMlsError::GenericError("too many columns for a worksheet".to_string())
            })?;
            worksheet.write_string(r, c, cell.as_str())?;
        }
    }

    let path = output_path(name, ExportFormat::Xls, dir);
    workbook.save(&path)?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Write an export as `<name>.tsv`
///
/// Every line is written back terminated by `\n`.
pub fn convert_to_tsv(name: &str, bytes: &[u8], dir: Option<&Path>) -> Result<PathBuf, ConnectMlsError> {
    let text = std::str::from_utf8(bytes)?;
    let mut out = String::with_capacity(text.len() + 1);
    for line in text.strip_suffix('\n').unwrap_or(text).split('\n') {
        out.push_str(line);
        out.push('\n');
    }

    let path = output_path(name, ExportFormat::Tsv, dir);
    fs::write(&path, out)?;
    info!("Wrote {}", path.display());
    Ok(path)
}

/// Write an export in the given format
pub fn write_export(
    format: ExportFormat,
    name: &str,
    bytes: &[u8],
    dir: Option<&Path>,
) -> Result<PathBuf, ConnectMlsError> {
    match format {
        ExportFormat::Xls => convert_to_excel(name, bytes, dir),
        ExportFormat::Tsv => convert_to_tsv(name, bytes, dir),
    }
}
