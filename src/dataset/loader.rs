use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;

use super::model::{Cell, Dataset, StudentRecord};
use super::{CLASS_ID_COLUMN, STUDENT_ID_COLUMN, UNKNOWN_ID};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a score sheet from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row, one student per row
/// * `.json` – `[{ "MaHS": "...", "lop": "...", "Toan": 8.5, ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parse: fn(&str) -> Result<Dataset> = match ext.as_str() {
        "csv" => parse_csv_str,
        "json" => parse_json_str,
        other => bail!(
            "Unsupported file extension: .{other} (expected .csv or .json): {}",
            path.display()
        ),
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    parse(&decode_text(&bytes))
        .with_context(|| format!("Failed to parse {}: {}", ext.to_ascii_uppercase(), path.display()))
}

/// UTF-8 when valid, Latin-1 otherwise. A leading BOM is dropped.
fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::debug!("input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse CSV text with a header row. Id columns stay text; every other column
/// is kept as raw cells and coerced only when analyzed. Short rows are allowed
/// and read as blanks.
pub fn parse_csv_str(text: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let id_idx = headers.iter().position(|h| h == STUDENT_ID_COLUMN);
    let class_idx = headers.iter().position(|h| h == CLASS_ID_COLUMN);

    let mut dataset = Dataset::new(headers.clone());

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {}", row_no + 1))?;

        let id_at = |idx: Option<usize>| -> String {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_ID)
                .to_string()
        };
        let mut record = StudentRecord::new(id_at(id_idx), id_at(class_idx));

        for (col_idx, column) in headers.iter().enumerate() {
            if Some(col_idx) == id_idx || Some(col_idx) == class_idx {
                continue;
            }
            let cell = row.get(col_idx).map(Cell::parse).unwrap_or(Cell::Empty);
            record.set_cell(column.clone(), cell);
        }

        dataset.push(record);
    }

    Ok(dataset)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (the default `df.to_json(orient='records')`).
/// Columns are the union of keys across all objects.
pub fn parse_json_str(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }

        let mut record = StudentRecord::new(
            json_to_id(obj.get(STUDENT_ID_COLUMN)),
            json_to_id(obj.get(CLASS_ID_COLUMN)),
        );
        for (key, val) in obj {
            if key == STUDENT_ID_COLUMN || key == CLASS_ID_COLUMN {
                continue;
            }
            record.set_cell(key.clone(), json_to_cell(val));
        }
        records.push(record);
    }

    let mut dataset = Dataset::new(columns);
    for record in records {
        dataset.push(record);
    }
    Ok(dataset)
}

fn json_to_id(val: Option<&JsonValue>) -> String {
    match val {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => UNKNOWN_ID.to_string(),
    }
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        JsonValue::String(s) if s.trim().is_empty() => Cell::Empty,
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Null => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_csv_basic() {
        let ds = parse_csv_str("STT,MaHS,lop,GK,CK\n1,HS01,10A1,7.5,\n2,HS02,10A1,abc,9\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.has_identity_columns());
        let first = &ds.records()[0];
        assert_eq!(first.student_id, "HS01");
        assert_eq!(first.class_id, "10A1");
        assert_eq!(first.score("GK"), Some(7.5));
        assert_eq!(first.cell("CK"), &Cell::Empty);
        assert_eq!(ds.records()[1].score("GK"), None);
        assert_eq!(ds.records()[1].score("CK"), Some(9.0));
    }

    #[test]
    fn test_parse_csv_short_row_and_blank_id() {
        let ds = parse_csv_str("MaHS,lop,TX1,TX2\n,10A2,5\n").unwrap();
        let r = &ds.records()[0];
        assert_eq!(r.student_id, UNKNOWN_ID);
        assert_eq!(r.score("TX1"), Some(5.0));
        assert_eq!(r.cell("TX2"), &Cell::Empty);
    }

    #[test]
    fn test_parse_csv_numeric_ids_stay_text() {
        let ds = parse_csv_str("MaHS,lop,Toan\n00123,11,8\n").unwrap();
        assert_eq!(ds.records()[0].student_id, "00123");
        assert_eq!(ds.records()[0].class_id, "11");
    }

    #[test]
    fn test_decode_latin1_and_bom() {
        let bytes = b"\xef\xbb\xbfMaHS,lop\n";
        assert_eq!(decode_text(bytes), "MaHS,lop\n");
        let latin1 = [b'L', 0xF4, b'p'];
        assert_eq!(decode_text(&latin1), "Lôp");
    }

    #[test]
    fn test_parse_json_records() {
        let ds = parse_json_str(
            r#"[
                {"MaHS": 101, "lop": "12A", "Toan": 8.5, "Van": "7", "Ly": null},
                {"MaHS": "HS02", "lop": "12A", "Toan": "", "Hoa": 6}
            ]"#,
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.has_column("Hoa"));
        let first = &ds.records()[0];
        assert_eq!(first.student_id, "101");
        assert_eq!(first.score("Toan"), Some(8.5));
        assert_eq!(first.score("Van"), Some(7.0));
        assert_eq!(first.cell("Ly"), &Cell::Empty);
        assert_eq!(ds.records()[1].cell("Toan"), &Cell::Empty);
    }

    #[test]
    fn test_parse_json_rejects_non_array() {
        assert!(parse_json_str(r#"{"MaHS": 1}"#).is_err());
        assert!(parse_json_str(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_load_file_dispatch() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(b"MaHS,lop,GK\nHS01,10A1,6\n").unwrap();
        file.flush().unwrap();
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 1);

        let mut xlsx = NamedTempFile::with_suffix(".xlsx").unwrap();
        xlsx.write_all(b"PK").unwrap();
        xlsx.flush().unwrap();
        let err = load_file(xlsx.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
