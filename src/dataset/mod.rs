//! Score sheet data: in-memory model and file loaders

pub mod loader;
pub mod model;

pub use loader::{load_file, parse_csv_str, parse_json_str};
pub use model::{column_distribution, Cell, ColumnStats, Dataset, StudentRecord};

/// Student identifier column
pub const STUDENT_ID_COLUMN: &str = "MaHS";

/// Class identifier column
pub const CLASS_ID_COLUMN: &str = "lop";

/// Placeholder used when a row has no id cell
pub const UNKNOWN_ID: &str = "N/A";
