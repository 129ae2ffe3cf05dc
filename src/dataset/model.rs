use std::collections::HashMap;

use crate::analyzer::stats::SampleStats;

use super::{CLASS_ID_COLUMN, STUDENT_ID_COLUMN};

// ---------------------------------------------------------------------------
// Cell – a raw score cell as it arrived from the sheet
// ---------------------------------------------------------------------------

/// A score cell before coercion. Sheets mix numbers, numeric text, blanks and
/// free text in the same column.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl Cell {
    /// Classify raw text from a CSV field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// The numeric score, or `None` when the cell holds no usable value.
    ///
    /// This is the only coercion rule in the crate: blanks, free text and
    /// non-finite numbers are all "no value", never zero.
    pub fn score(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Number(_) => None,
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Cell::Empty => None,
        }
    }
}

// ---------------------------------------------------------------------------
// StudentRecord – one row of the sheet
// ---------------------------------------------------------------------------

static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    /// `MaHS`; not guaranteed unique across a file
    pub student_id: String,
    /// `lop`
    pub class_id: String,
    cells: HashMap<String, Cell>,
}

impl StudentRecord {
    pub fn new(student_id: impl Into<String>, class_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            class_id: class_id.into(),
            cells: HashMap::new(),
        }
    }

    pub fn with_cell(mut self, column: impl Into<String>, cell: Cell) -> Self {
        self.set_cell(column, cell);
        self
    }

    pub fn set_cell(&mut self, column: impl Into<String>, cell: Cell) {
        self.cells.insert(column.into(), cell);
    }

    /// Cell for `column`; an absent column reads as empty.
    pub fn cell(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn score(&self, column: &str) -> Option<f64> {
        self.cell(column).score()
    }
}

// ---------------------------------------------------------------------------
// Dataset – header plus ordered rows, read-only during analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<StudentRecord>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: StudentRecord) {
        self.records.push(record);
    }

    pub fn with_record(mut self, record: StudentRecord) -> Self {
        self.push(record);
        self
    }

    /// Header columns in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Whether both the student-id and class-id columns exist
    pub fn has_identity_columns(&self) -> bool {
        self.has_column(STUDENT_ID_COLUMN) && self.has_column(CLASS_ID_COLUMN)
    }

    /// Members of `family` that this dataset carries, in family order
    pub fn present_columns(&self, family: &'static [&'static str]) -> Vec<&'static str> {
        family
            .iter()
            .copied()
            .filter(|col| self.has_column(col))
            .collect()
    }

    /// Coerced scores of one column, one entry per row
    pub fn column_scores(&self, column: &str) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.score(column)).collect()
    }
}

// ---------------------------------------------------------------------------
// Column distribution
// ---------------------------------------------------------------------------

/// Distribution of the valid values in one column
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; None with fewer than two values
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Summarize one column. `None` if the column is absent or has no valid values.
pub fn column_distribution(dataset: &Dataset, column: &str) -> Option<ColumnStats> {
    if !dataset.has_column(column) {
        return None;
    }
    let values: Vec<f64> = dataset.column_scores(column).into_iter().flatten().collect();
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let std_dev = SampleStats::from_values(&values).map(|s| s.std_dev);
    Some(ColumnStats {
        column: column.to_string(),
        count: values.len(),
        mean,
        std_dev,
        min,
        max,
    })
}
