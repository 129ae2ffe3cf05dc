//! Reporter module for output formatting

pub mod console;
pub mod csv;
pub mod json;

pub use self::csv::CsvReporter;
pub use console::ConsoleReporter;
pub use json::JsonReporter;
