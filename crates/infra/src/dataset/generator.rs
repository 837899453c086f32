//! Seeded statement generator

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bulkload_domain::{BulkLoadError, GenerationConfig, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::errors::InfraError;

const CODE_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_LENGTH: usize = 8;

pub const SCHEMA_FILE: &str = "schema";
pub const ENTITY_FILE: &str = "entities";
pub const RELATION_FILE: &str = "relations";

const SCHEMA: &str = "CREATE TABLE users (id BIGINT PRIMARY KEY, invite_codes TEXT[] NOT NULL); \
CREATE TABLE friendships (user_a BIGINT NOT NULL REFERENCES users (id), \
user_b BIGINT NOT NULL REFERENCES users (id));";

/// Files written by [`DatasetGenerator::write_to`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub schema: PathBuf,
    pub entities: PathBuf,
    pub relations: PathBuf,
    pub entity_count: u64,
    pub relation_count: u64,
}

/// Deterministic generator; the same seed always yields the same files.
pub struct DatasetGenerator {
    entity_count: u64,
    relation_count: u64,
    attributes_per_entity: usize,
    rng: StdRng,
}

impl DatasetGenerator {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            entity_count: config.entity_count,
            relation_count: config.relation_count,
            attributes_per_entity: config.attributes_per_entity,
            rng: StdRng::seed_from_u64(config.random_seed),
        }
    }

    /// Schema statement, applied as a single line.
    pub fn schema(&self) -> &'static str {
        SCHEMA
    }

    /// Insert for user `id` with freshly drawn invite codes.
    pub fn entity_statement(&mut self, id: u64) -> String {
        let codes: Vec<String> =
            (0..self.attributes_per_entity).map(|_| format!("'{}'", self.invite_code())).collect();
        let array = if codes.is_empty() {
            "ARRAY[]::TEXT[]".to_string()
        } else {
            format!("ARRAY[{}]", codes.join(", "))
        };
        format!("INSERT INTO users (id, invite_codes) VALUES ({id}, {array});")
    }

    /// Insert of a friendship between two random existing users.
    ///
    /// # Errors
    /// `BulkLoadError::InvalidInput` when there are no entities to relate.
    pub fn relation_statement(&mut self) -> Result<String> {
        if self.entity_count == 0 {
            return Err(BulkLoadError::InvalidInput(
                "relations need at least one entity".to_string(),
            ));
        }
        let a = self.rng.gen_range(1..=self.entity_count);
        let b = self.rng.gen_range(1..=self.entity_count);
        Ok(format!(
            "INSERT INTO friendships (user_a, user_b) SELECT a.id, b.id FROM users a, users b \
WHERE a.id = {a} AND b.id = {b};"
        ))
    }

    /// Write schema, entity and relation files into `dir`.
    ///
    /// # Errors
    /// `BulkLoadError::Resource` on any file system failure and
    /// `BulkLoadError::InvalidInput` for relations without entities.
    pub fn write_to(&mut self, dir: &Path, extension: &str) -> Result<DatasetSummary> {
        if self.relation_count > 0 && self.entity_count == 0 {
            return Err(BulkLoadError::InvalidInput(
                "relation_count is positive but entity_count is zero".to_string(),
            ));
        }
        std::fs::create_dir_all(dir).map_err(InfraError::from)?;

        let schema = dir.join(format!("{SCHEMA_FILE}.{extension}"));
        std::fs::write(&schema, format!("{SCHEMA}\n")).map_err(InfraError::from)?;

        let entities = dir.join(format!("{ENTITY_FILE}.{extension}"));
        let mut out = create(&entities)?;
        for id in 1..=self.entity_count {
            let statement = self.entity_statement(id);
            writeln!(out, "{statement}").map_err(InfraError::from)?;
        }
        out.flush().map_err(InfraError::from)?;
        info!(path = %entities.display(), count = self.entity_count, "Entities written");

        let relations = dir.join(format!("{RELATION_FILE}.{extension}"));
        let mut out = create(&relations)?;
        for _ in 0..self.relation_count {
            let statement = self.relation_statement()?;
            writeln!(out, "{statement}").map_err(InfraError::from)?;
        }
        out.flush().map_err(InfraError::from)?;
        info!(path = %relations.display(), count = self.relation_count, "Relations written");

        Ok(DatasetSummary {
            schema,
            entities,
            relations,
            entity_count: self.entity_count,
            relation_count: self.relation_count,
        })
    }

    fn invite_code(&mut self) -> String {
        (0..CODE_LENGTH)
            .map(|_| char::from(CODE_CHARSET[self.rng.gen_range(0..CODE_CHARSET.len())]))
            .collect()
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path).map(BufWriter::new).map_err(|e| {
        BulkLoadError::Resource(format!("Failed to create {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation(entity_count: u64, attributes_per_entity: usize) -> GenerationConfig {
        GenerationConfig { entity_count, relation_count: 5, attributes_per_entity, random_seed: 7 }
    }

    #[test]
    fn entity_statements_carry_eight_char_codes() {
        let mut generator = DatasetGenerator::new(&generation(10, 3));

        let statement = generator.entity_statement(4);

        assert!(statement.starts_with("INSERT INTO users (id, invite_codes) VALUES (4, ARRAY['"));
        let codes: Vec<&str> = statement.split('\'').skip(1).step_by(2).collect();
        assert_eq!(codes.len(), 3);
        assert!(codes
            .iter()
            .all(|code| code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())));
    }

    #[test]
    fn entities_without_attributes_use_empty_array() {
        let mut generator = DatasetGenerator::new(&generation(1, 0));
        assert_eq!(
            generator.entity_statement(1),
            "INSERT INTO users (id, invite_codes) VALUES (1, ARRAY[]::TEXT[]);"
        );
    }

    #[test]
    fn relations_reference_existing_ids() {
        let mut generator = DatasetGenerator::new(&generation(3, 0));
        for _ in 0..50 {
            let statement = generator.relation_statement().unwrap();
            let ids: Vec<u64> = statement
                .split("id = ")
                .skip(1)
                .map(|rest| rest.trim_end_matches(';').split(' ').next().unwrap().parse().unwrap())
                .collect();
            assert_eq!(ids.len(), 2);
            assert!(ids.iter().all(|id| (1..=3).contains(id)), "{statement}");
        }
    }

    #[test]
    fn relations_need_entities() {
        let mut generator = DatasetGenerator::new(&generation(0, 0));
        assert!(matches!(generator.relation_statement(), Err(BulkLoadError::InvalidInput(_))));
    }
}
