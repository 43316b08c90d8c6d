//! Output rendering and row parsing.
//!
//! `json` writes the whole [`CoveringArray`]; `csv`/`tsv` write a `p0,p1,..`
//! header followed by one line per row; `table` is a right-aligned view for
//! terminals and cannot be read back.

use frankenpict_core::CoveringArray;
use serde::Deserialize;

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Tsv,
    Table,
}

impl OutputFormat {
    /// Parse format with loose casing.
    #[must_use]
    pub fn from_str_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "table" | "text" => Some(Self::Table),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Table => "table",
        }
    }

    /// Guess from a file extension.
    #[must_use]
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_str_loose)
    }

    const fn delimiter(self) -> Option<u8> {
        match self {
            Self::Csv => Some(b','),
            Self::Tsv => Some(b'\t'),
            Self::Json | Self::Table => None,
        }
    }
}

pub fn render(array: &CoveringArray, format: OutputFormat) -> Result<String> {
    let out = match (format, format.delimiter()) {
        (OutputFormat::Json, _) => {
            let mut json = serde_json::to_string_pretty(array)?;
            json.push('\n');
            json
        }
        (_, Some(delimiter)) => render_delimited(array, delimiter)?,
        _ => render_table(array),
    };
    Ok(out)
}

fn render_delimited(array: &CoveringArray, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(header(array.value_counts().len()))?;
    for row in array.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| HarnessError::parse(format!("flush rows: {}", err.error())))?;
    String::from_utf8(bytes).map_err(|err| HarnessError::parse(err.to_string()))
}

fn header(width: usize) -> Vec<String> {
    (0..width).map(|p| format!("p{p}")).collect()
}

fn render_table(array: &CoveringArray) -> String {
    let mut columns = vec!["#".to_string()];
    columns.extend(header(array.value_counts().len()));
    let mut lines = vec![columns];
    for (idx, row) in array.rows().iter().enumerate() {
        let mut line = vec![(idx + 1).to_string()];
        line.extend(row.iter().map(ToString::to_string));
        lines.push(line);
    }

    let mut widths = vec![0; lines[0].len()];
    for line in &lines {
        for (w, cell) in widths.iter_mut().zip(line) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    for line in &lines {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:>w$}"))
            .collect();
        out.push_str(&cells.join("  "));
        out.push('\n');
    }
    out
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowsDocument {
    Array(CoveringArray),
    Bare(Vec<Vec<usize>>),
}

/// Read rows back from `json`, `csv` or `tsv` text.
///
/// JSON may be a full covering array document or a bare array of rows. For
/// the delimited formats only the first record may be a header, and only when
/// none of its cells is numeric; any other non-numeric cell is an error.
/// Shape is not checked here; the validator does that.
pub fn parse_rows(text: &str, format: OutputFormat) -> Result<Vec<Vec<usize>>> {
    let Some(delimiter) = format.delimiter() else {
        return match format {
            OutputFormat::Json => match serde_json::from_str::<RowsDocument>(text)? {
                RowsDocument::Array(array) => Ok(array.into_rows()),
                RowsDocument::Bare(rows) => Ok(rows),
            },
            _ => Err(HarnessError::parse(format!(
                "{} output cannot be read back",
                format.as_str()
            ))),
        };
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut first = true;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, csv::Position::line);
        let parsed: std::result::Result<Vec<usize>, _> =
            record.iter().map(str::parse::<usize>).collect();
        match parsed {
            Ok(row) => rows.push(row),
            Err(_) if first && record.iter().all(|cell| cell.parse::<usize>().is_err()) => {}
            Err(err) => return Err(HarnessError::parse(format!("line {line}: {err}"))),
        }
        first = false;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frankenpict_core::Row;

    fn array() -> CoveringArray {
        CoveringArray::new(
            vec![2, 11],
            1,
            0,
            vec![Row::new(vec![0, 10]), Row::new(vec![1, 3])],
        )
    }

    #[test]
    fn format_names() {
        assert_eq!(OutputFormat::from_str_loose(" CSV "), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_str_loose("tab"), Some(OutputFormat::Tsv));
        assert_eq!(OutputFormat::from_str_loose("xml"), None);
        assert_eq!(
            OutputFormat::from_path(std::path::Path::new("out/rows.json")),
            Some(OutputFormat::Json)
        );
        for f in [
            OutputFormat::Json,
            OutputFormat::Csv,
            OutputFormat::Tsv,
            OutputFormat::Table,
        ] {
            assert_eq!(OutputFormat::from_str_loose(f.as_str()), Some(f));
        }
    }

    #[test]
    fn csv_and_tsv_layout() {
        assert_eq!(
            render(&array(), OutputFormat::Csv).unwrap(),
            "p0,p1\n0,10\n1,3\n"
        );
        assert_eq!(
            render(&array(), OutputFormat::Tsv).unwrap(),
            "p0\tp1\n0\t10\n1\t3\n"
        );
    }

    #[test]
    fn table_is_right_aligned() {
        assert_eq!(
            render(&array(), OutputFormat::Table).unwrap(),
            "#  p0  p1\n1   0  10\n2   1   3\n"
        );
    }

    #[test]
    fn rows_read_back() {
        let a = array();
        for f in [OutputFormat::Json, OutputFormat::Csv, OutputFormat::Tsv] {
            let text = render(&a, f).unwrap();
            assert_eq!(parse_rows(&text, f).unwrap(), a.clone().into_rows(), "{f:?}");
        }
        assert_eq!(
            parse_rows("[[0,1],[1,0]]", OutputFormat::Json).unwrap(),
            vec![vec![0, 1], vec![1, 0]]
        );
        assert_eq!(
            parse_rows("0,1\n\n1,0\n", OutputFormat::Csv).unwrap(),
            vec![vec![0, 1], vec![1, 0]]
        );
    }

    #[test]
    fn bad_rows_are_parse_errors() {
        let err = parse_rows("p0,p1\n0,1\n1,x\n", OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, HarnessError::Parse(ref m) if m.starts_with("line 3:")));
        assert!(parse_rows("#  p0\n1   0\n", OutputFormat::Table).is_err());
        assert!(parse_rows("{", OutputFormat::Json).is_err());
    }

    #[test]
    fn quoted_cells_and_crlf_are_read() {
        let text = "\"p0\",\"p1\"\r\n\"0\",\"1\"\r\n\"1\",\"0\"\r\n";
        assert_eq!(
            parse_rows(text, OutputFormat::Csv).unwrap(),
            vec![vec![0, 1], vec![1, 0]]
        );
        assert_eq!(
            parse_rows("p0\tp1\r\n1\t1\r\n", OutputFormat::Tsv).unwrap(),
            vec![vec![1, 1]]
        );
    }

    #[test]
    fn only_the_first_record_can_be_a_header() {
        let err = parse_rows("p0,p1\nq0,q1\n0,1\n", OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, HarnessError::Parse(ref m) if m.starts_with("line 2:")));

        let err = parse_rows("0,1\np0,p1\n", OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, HarnessError::Parse(ref m) if m.starts_with("line 2:")));

        let err = parse_rows("p0,1\n0,1\n", OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, HarnessError::Parse(ref m) if m.starts_with("line 1:")));
    }
}
