//! Delimited-text and workbook parser.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use super::source::{FileInfo, FileKind, SourceMetadata, extension_of, normalize_extension};
use super::table::{Column, DataTable, Value};
use super::values::{is_null_token, parse_date_loose};
use crate::config::ParserConfig;
use crate::error::{IntakeError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Reads spreadsheet and delimited-text files into a [`DataTable`].
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file, deriving the format from its extension.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        self.parse_file(path, &extension_of(path))
    }

    /// Parse a file whose format is given by `extension` (e.g. `.csv`).
    ///
    /// The extension is passed separately so stored uploads whose on-disk
    /// name lost the original suffix can still be read.
    pub fn parse_file(
        &self,
        path: impl AsRef<Path>,
        extension: &str,
    ) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(IntakeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let kind = file_kind(extension)?;
        let contents = std::fs::read(path).map_err(|e| IntakeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let (table, metadata) = match kind {
            FileKind::Delimited => {
                let (table, delimiter) = self.parse_delimited(&contents)?;
                let format = delimited_format(delimiter).to_string();
                let meta = SourceMetadata::new(
                    path.to_path_buf(),
                    &contents,
                    format,
                    table.row_count(),
                    table.column_count(),
                );
                (table, meta)
            }
            FileKind::Workbook => {
                let (table, sheet) =
                    self.parse_workbook(&contents, self.config.sheet.as_deref())?;
                let meta = SourceMetadata::new(
                    path.to_path_buf(),
                    &contents,
                    normalize_extension(extension),
                    table.row_count(),
                    table.column_count(),
                )
                .with_sheet(sheet);
                (table, meta)
            }
        };

        tracing::info!(
            "Parsed {} ({}): {} rows x {} columns",
            metadata.file,
            metadata.format,
            table.row_count(),
            table.column_count()
        );

        Ok((table, metadata))
    }

    /// Parse delimited text, trying each configured delimiter in order.
    ///
    /// The first delimiter yielding more than one column and at least one
    /// non-empty row wins. Returns the table and the delimiter used.
    pub fn parse_delimited(&self, bytes: &[u8]) -> Result<(DataTable, u8)> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(IntakeError::Parse("File is empty".to_string()));
        }

        let mut header_only = false;
        for &delimiter in &self.config.delimiters {
            let delimiter = delimiter as u8;
            match self.try_delimiter(bytes, delimiter) {
                Ok(Some(table)) if table.row_count() > 0 => {
                    tracing::debug!(
                        "Delimiter {:?} accepted with {} columns",
                        delimiter as char,
                        table.column_count()
                    );
                    return Ok((table, delimiter));
                }
                Ok(Some(_)) => {
                    header_only = true;
                    tracing::debug!("Delimiter {:?} found no data rows", delimiter as char);
                }
                Ok(None) => {
                    tracing::debug!("Delimiter {:?} yields a single column", delimiter as char);
                }
                Err(e) => {
                    tracing::debug!("Delimiter {:?} rejected: {}", delimiter as char, e);
                }
            }
        }

        if header_only {
            return Err(IntakeError::Parse("File has no data rows".to_string()));
        }

        let tried: Vec<String> = self
            .config
            .delimiters
            .iter()
            .map(|d| format!("{:?}", d))
            .collect();
        Err(IntakeError::Parse(format!(
            "Could not parse delimited file. Tried delimiters: {}",
            tried.join(", ")
        )))
    }

    /// Read with one delimiter. `Ok(None)` means it produced a single column.
    fn try_delimiter(&self, bytes: &[u8], delimiter: u8) -> Result<Option<DataTable>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote as u8)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = normalize_headers(reader.headers()?.iter().map(str::to_string).collect());
        if headers.len() < 2 {
            return Ok(None);
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            if record.iter().skip(width).any(|cell| !cell.trim().is_empty()) {
                return Err(IntakeError::Parse(format!(
                    "Expected {} fields in line {}, saw {}",
                    width,
                    row_idx + 2,
                    record.len()
                )));
            }
            let row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            rows.push(row);
        }

        Ok(Some(DataTable::from_rows(&headers, &rows).drop_empty_rows()))
    }

    /// Parse one workbook sheet (first sheet when `sheet` is None).
    ///
    /// Returns the table and the sheet name read.
    pub fn parse_workbook(&self, bytes: &[u8], sheet: Option<&str>) -> Result<(DataTable, String)> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let sheet_names = workbook.sheet_names().to_vec();

        let sheet_name = match sheet {
            Some(wanted) => sheet_names
                .iter()
                .find(|name| name.as_str() == wanted)
                .cloned()
                .ok_or_else(|| {
                    IntakeError::Parse(format!(
                        "Sheet '{}' not found. Available: {}",
                        wanted,
                        sheet_names.join(", ")
                    ))
                })?,
            None => sheet_names
                .first()
                .cloned()
                .ok_or_else(|| IntakeError::Parse("Workbook has no sheets".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(cells) => cells
                .iter()
                .map(|cell| match cell {
                    Data::String(s) => s.trim().to_string(),
                    Data::Empty => String::new(),
                    other => other.to_string().trim().to_string(),
                })
                .collect(),
            None => {
                return Err(IntakeError::Parse(format!(
                    "Sheet '{}' is empty",
                    sheet_name
                )));
            }
        };
        let headers = normalize_headers(headers);

        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for row in rows {
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(row.get(idx).map_or(Value::Empty, cell_value));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::from_cells(name, values))
            .collect();
        let table = DataTable::new(columns).drop_empty_rows();

        if table.row_count() == 0 {
            return Err(IntakeError::Parse(format!(
                "Sheet '{}' has no data rows",
                sheet_name
            )));
        }

        Ok((table, sheet_name))
    }

    /// List the sheet names of a workbook.
    pub fn sheet_names(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(IntakeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read(path).map_err(|e| IntakeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let workbook = open_workbook_auto_from_rs(Cursor::new(contents))?;
        Ok(workbook.sheet_names().to_vec())
    }

    /// Summarize a file without failing.
    pub fn file_info(&self, path: impl AsRef<Path>) -> FileInfo {
        let path = path.as_ref();
        let extension = extension_of(path);
        let mut info = FileInfo {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_extension: format!(".{}", extension),
            file_size_bytes: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            ..FileInfo::default()
        };

        match self.parse_file(path, &extension) {
            Ok((table, _)) => {
                info.row_count = Some(table.row_count());
                info.column_count = Some(table.column_count());
                info.columns = Some(table.headers().into_iter().map(String::from).collect());
                if FileKind::from_extension(&extension) == Some(FileKind::Workbook) {
                    match self.sheet_names(path) {
                        Ok(names) => info.sheet_names = Some(names),
                        Err(e) => info.error = Some(e.to_string()),
                    }
                }
            }
            Err(e) => info.error = Some(e.to_string()),
        }

        info
    }
}

fn file_kind(extension: &str) -> Result<FileKind> {
    FileKind::from_extension(extension).ok_or_else(|| {
        let supported: Vec<String> = FileKind::DELIMITED_EXTENSIONS
            .iter()
            .chain(FileKind::WORKBOOK_EXTENSIONS)
            .map(|e| format!(".{}", e))
            .collect();
        IntakeError::UnsupportedFormat(format!(
            "'{}'. Supported: {}",
            extension,
            supported.join(", ")
        ))
    })
}

fn delimited_format(delimiter: u8) -> &'static str {
    match delimiter {
        b',' => "csv",
        b';' => "csv-semicolon",
        b'\t' => "tsv",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Trim headers, name blank ones `Unnamed: {i}` and suffix duplicates.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let trimmed = header.trim();
            let base = if trimmed.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                trimmed.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Empty,
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::String(s) if is_null_token(s) => Value::Empty,
        Data::String(s) => Value::Text(s.trim().to_string()),
        Data::DateTime(dt) => dt.as_datetime().map_or(Value::Empty, Value::Date),
        Data::DateTimeIso(s) => {
            parse_date_loose(s).map_or_else(|| Value::Text(s.clone()), Value::Date)
        }
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ColumnKind;

    #[test]
    fn test_comma_wins_first() {
        let parser = Parser::new();
        let (table, delimiter) = parser
            .parse_delimited(b"name,age,city\nAlice,30,NYC\nBob,25,LA")
            .unwrap();
        assert_eq!(delimiter, b',');
        assert_eq!(table.headers(), vec!["name", "age", "city"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("age").unwrap().kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_falls_through_to_semicolon() {
        let parser = Parser::new();
        let data = "Datum;Betrag;Text\n2025-01-01;12,50;Miete\n2025-01-02;3,10;Brot";
        let (table, delimiter) = parser.parse_delimited(data.as_bytes()).unwrap();
        assert_eq!(delimiter, b';');
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_ragged_rows_reject_delimiter() {
        let parser = Parser::new();
        // Comma-split gives a ragged table; pipe gives a clean one.
        let data = "a,b|c\n1,2|3\n4,5,6|7";
        let (table, delimiter) = parser.parse_delimited(data.as_bytes()).unwrap();
        assert_eq!(delimiter, b'|');
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_tab_delimited() {
        let parser = Parser::new();
        let (table, delimiter) = parser.parse_delimited(b"a\tb\tc\n1\t2\t3\n4\t5\t6").unwrap();
        assert_eq!(delimiter, b'\t');
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_header_only_is_parse_error() {
        let parser = Parser::new();
        let err = parser.parse_delimited(b"Date,Amount,Memo\n").unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_single_column_is_parse_error() {
        let parser = Parser::new();
        let err = parser.parse_delimited(b"only\n1\n2\n").unwrap_err();
        assert!(err.to_string().contains("Tried delimiters"));
    }

    #[test]
    fn test_empty_rows_and_bom_are_dropped() {
        let parser = Parser::new();
        let data = b"\xEF\xBB\xBF Date , Amount \n2025-01-01,1\n,\n2025-01-02,2\n";
        let (table, _) = parser.parse_delimited(data).unwrap();
        assert_eq!(table.headers(), vec!["Date", "Amount"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_normalize_headers() {
        let headers = normalize_headers(vec![
            "Amount".into(),
            " ".into(),
            "Amount".into(),
            "Amount ".into(),
        ]);
        assert_eq!(headers, vec!["Amount", "Unnamed: 1", "Amount.1", "Amount.2"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = Parser::new().parse_path(file.path()).unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Parser::new().parse_file("/no/such/file.csv", ".csv").unwrap_err();
        assert_eq!(err.kind(), "file_not_found");
    }

    #[test]
    fn test_cell_value_conversion() {
        assert_eq!(cell_value(&Data::Int(3)), Value::Number(3.0));
        assert_eq!(cell_value(&Data::String(" N/A ".into())), Value::Empty);
        assert_eq!(cell_value(&Data::String(" Rent ".into())), Value::Text("Rent".into()));
        assert!(matches!(
            cell_value(&Data::DateTimeIso("2025-01-15T00:00:00".into())),
            Value::Date(_)
        ));
    }

    #[test]
    fn test_file_info_reports_errors_instead_of_failing() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        std::fs::write(file.path(), "a,b\n1,2\n").unwrap();
        let info = Parser::new().file_info(file.path());
        assert_eq!(info.row_count, Some(1));
        assert_eq!(info.columns, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(info.error.is_none());

        let missing = Parser::new().file_info("/no/such/file.csv");
        assert!(missing.error.is_some());
    }
}
