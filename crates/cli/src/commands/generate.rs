//! Dataset generation

use bulkload_domain::{Config, Result};
use bulkload_infra::{DatasetGenerator, DatasetSummary};
use tracing::info;

/// Write schema, entity and relation files into `project.dataset_dir`.
pub fn generate_dataset(config: &Config) -> Result<DatasetSummary> {
    let generation = &config.generation;
    info!(
        entities = generation.entity_count,
        relations = generation.relation_count,
        seed = generation.random_seed,
        dir = %config.dataset_dir().display(),
        "Generating dataset"
    );

    DatasetGenerator::new(generation).write_to(config.dataset_dir(), &config.loading.statement_extension)
}
