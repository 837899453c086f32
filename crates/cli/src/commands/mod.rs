//! Commands behind the `bulkload` binary

pub mod generate;
pub mod load;
pub mod run;

pub use generate::generate_dataset;
pub use load::{run_single, SingleLoad};
pub use run::run_sweep;
