//! Result output
//!
//! Load test results are appended to one CSV file per sweep, named after the
//! run timestamp.

pub mod csv_writer;

pub use csv_writer::CsvResultWriter;
