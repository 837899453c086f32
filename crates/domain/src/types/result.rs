//! Load result records
//!
//! A [`LoadResult`] is produced once per successful load test and flattened
//! into an ordered record for the result writer:
//! `loader_type, batch_size, transaction_count` followed by
//! `{file}_count, {file}_time` for every data file in load order.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::LoaderKind;

/// Metrics for one data file loaded during an attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    /// Data file name as configured (without directory or extension)
    pub file: String,
    /// Statements read from the file and handed to the loader
    pub count: u64,
    /// Wall-clock time spent building and running the loader
    pub elapsed: Duration,
}

/// Outcome of one successful load test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub loader_type: LoaderKind,
    pub batch_size: Option<usize>,
    pub transaction_count: usize,
    pub files: Vec<FileMetrics>,
}

impl LoadResult {
    pub fn new(loader_type: LoaderKind, batch_size: Option<usize>, transaction_count: usize) -> Self {
        Self { loader_type, batch_size, transaction_count, files: Vec::new() }
    }

    /// Column names for results covering `data_files`, in record order.
    pub fn header<S: AsRef<str>>(data_files: &[S]) -> Vec<String> {
        let mut header = vec![
            "loader_type".to_string(),
            "batch_size".to_string(),
            "transaction_count".to_string(),
        ];
        for file in data_files {
            header.push(format!("{}_count", file.as_ref()));
            header.push(format!("{}_time", file.as_ref()));
        }
        header
    }

    /// Ordered `(column, value)` pairs matching [`LoadResult::header`].
    ///
    /// Times are seconds as floating point; an unset batch size is empty.
    pub fn record(&self) -> Vec<(String, String)> {
        let mut record = vec![
            ("loader_type".to_string(), self.loader_type.to_string()),
            (
                "batch_size".to_string(),
                self.batch_size.map(|size| size.to_string()).unwrap_or_default(),
            ),
            ("transaction_count".to_string(), self.transaction_count.to_string()),
        ];
        for metrics in &self.files {
            record.push((format!("{}_count", metrics.file), metrics.count.to_string()));
            record.push((format!("{}_time", metrics.file), metrics.elapsed.as_secs_f64().to_string()));
        }
        record
    }

    /// Metrics recorded for `file`, if it was loaded.
    pub fn file(&self, file: &str) -> Option<&FileMetrics> {
        self.files.iter().find(|metrics| metrics.file == file)
    }

    pub fn total_count(&self) -> u64 {
        self.files.iter().map(|metrics| metrics.count).sum()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.files.iter().map(|metrics| metrics.elapsed).sum()
    }

    /// Mean seconds per statement across all files, `None` when nothing ran.
    pub fn seconds_per_statement(&self) -> Option<f64> {
        let total = self.total_count();
        if total == 0 {
            return None;
        }
        Some(self.total_elapsed().as_secs_f64() / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoadResult {
        let mut result = LoadResult::new(LoaderKind::Pool, Some(128), 4);
        result.files.push(FileMetrics {
            file: "entities".into(),
            count: 400,
            elapsed: Duration::from_millis(1500),
        });
        result.files.push(FileMetrics {
            file: "relations".into(),
            count: 100,
            elapsed: Duration::from_millis(500),
        });
        result
    }

    #[test]
    fn header_lists_fixed_columns_then_file_pairs() {
        assert_eq!(
            LoadResult::header(&["entities", "relations"]),
            vec![
                "loader_type",
                "batch_size",
                "transaction_count",
                "entities_count",
                "entities_time",
                "relations_count",
                "relations_time",
            ]
        );
    }

    #[test]
    fn record_follows_header_order() {
        let result = sample();
        let keys: Vec<String> = result.record().into_iter().map(|(key, _)| key).collect();

        assert_eq!(keys, LoadResult::header(&["entities", "relations"]));
    }

    #[test]
    fn record_formats_values() {
        let record = sample().record();

        assert_eq!(record[0].1, "pool");
        assert_eq!(record[1].1, "128");
        assert_eq!(record[2].1, "4");
        assert_eq!(record[3].1, "400");
        assert_eq!(record[4].1, "1.5");
    }

    #[test]
    fn unset_batch_size_is_blank() {
        let result = LoadResult::new(LoaderKind::Carousel, None, 1);
        assert_eq!(result.record()[1].1, "");
    }

    #[test]
    fn throughput_summary() {
        let result = sample();

        assert_eq!(result.total_count(), 500);
        assert_eq!(result.total_elapsed(), Duration::from_secs(2));
        assert_eq!(result.seconds_per_statement(), Some(0.004));
        assert_eq!(result.file("relations").map(|m| m.count), Some(100));
        assert_eq!(LoadResult::new(LoaderKind::Pool, Some(1), 1).seconds_per_statement(), None);
    }
}
