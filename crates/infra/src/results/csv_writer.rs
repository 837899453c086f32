//! CSV result sink

use std::fs::File;
use std::path::{Path, PathBuf};

use bulkload_core::ResultSink;
use bulkload_domain::{BulkLoadError, LoadResult, Result};
use tracing::{debug, info};

use crate::errors::InfraError;

/// Appends one row per load test to `{results_dir}/{timestamp}.csv`
///
/// The header is written and flushed on creation. Every row is flushed as
/// soon as it is recorded, so an aborted sweep keeps its completed rows.
pub struct CsvResultWriter {
    path: PathBuf,
    header: Vec<String>,
    writer: csv::Writer<File>,
}

impl CsvResultWriter {
    /// Create the results file for a sweep over `data_files`.
    ///
    /// # Errors
    /// `BulkLoadError::Resource` if the directory or file cannot be created.
    pub fn create<S: AsRef<str>>(results_dir: &Path, timestamp: &str, data_files: &[S]) -> Result<Self> {
        std::fs::create_dir_all(results_dir).map_err(|e| {
            BulkLoadError::Resource(format!(
                "Failed to create results dir {}: {e}",
                results_dir.display()
            ))
        })?;

        let path = results_dir.join(format!("{timestamp}.csv"));
        let mut writer = csv::Writer::from_path(&path).map_err(InfraError::from)?;
        let header = LoadResult::header(data_files);
        writer.write_record(&header).map_err(InfraError::from)?;
        writer.flush().map_err(InfraError::from)?;

        info!(path = %path.display(), columns = header.len(), "Results file created");
        Ok(Self { path, header, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvResultWriter {
    fn record(&mut self, result: &LoadResult) -> Result<()> {
        let record = result.record();
        let columns_match = record.len() == self.header.len()
            && record.iter().zip(&self.header).all(|((column, _), expected)| column == expected);
        if !columns_match {
            let columns: Vec<&str> = record.iter().map(|(column, _)| column.as_str()).collect();
            return Err(BulkLoadError::InvalidInput(format!(
                "Result columns [{}] do not match header [{}]",
                columns.join(", "),
                self.header.join(", ")
            )));
        }

        self.writer
            .write_record(record.iter().map(|(_, value)| value))
            .map_err(InfraError::from)?;
        self.writer.flush().map_err(InfraError::from)?;
        debug!(
            batch_size = ?result.batch_size,
            transaction_count = result.transaction_count,
            "Result row written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bulkload_domain::{FileMetrics, LoaderKind};

    use super::*;

    fn result(files: &[(&str, u64)]) -> LoadResult {
        let mut result = LoadResult::new(LoaderKind::Carousel, Some(50), 2);
        for (file, count) in files {
            result.files.push(FileMetrics {
                file: (*file).to_string(),
                count: *count,
                elapsed: Duration::from_millis(250),
            });
        }
        result
    }

    #[test]
    fn header_is_flushed_on_create() {
        let dir = tempfile::tempdir().unwrap();

        let writer = CsvResultWriter::create(dir.path(), "26-01-02_03-04-05", &["entities"]).unwrap();

        assert_eq!(writer.path(), dir.path().join("26-01-02_03-04-05.csv"));
        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            contents,
            "loader_type,batch_size,transaction_count,entities_count,entities_time\n"
        );
    }

    #[test]
    fn rows_follow_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            CsvResultWriter::create(dir.path(), "run", &["entities", "relations"]).unwrap();

        writer.record(&result(&[("entities", 10), ("relations", 4)])).unwrap();

        let contents = std::fs::read_to_string(writer.path()).unwrap();
        let rows: Vec<&str> = contents.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], "carousel,50,2,10,0.25,4,0.25");
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            CsvResultWriter::create(dir.path(), "run", &["entities", "relations"]).unwrap();

        let err = writer.record(&result(&[("relations", 4), ("entities", 10)])).unwrap_err();

        assert!(matches!(err, BulkLoadError::InvalidInput(_)));
        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
