//! Bulk loading engine
//!
//! - [`ports`]: the transactional client the loaders drive
//! - [`source`] and [`batcher`]: statement stream and fixed-size batching
//! - [`carousel`] and [`pool`]: the two loading strategies, selected through
//!   [`Loader`]

pub mod batcher;
pub mod carousel;
pub mod pool;
pub mod ports;
pub mod source;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use bulkload_domain::{LoaderKind, Result};

pub use self::batcher::{Batch, Batcher};
pub use self::carousel::{CarouselLoader, TransactionRing};
pub use self::pool::PoolLoader;
pub use self::ports::{Connection, Connector, Session, WriteTransaction};
pub use self::source::{StatementCounter, StatementSource};

/// Parameters shared by both loading strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSettings {
    pub kind: LoaderKind,
    /// Statements per batch; the carousel treats `None` as unbounded
    pub batch_size: Option<NonZeroUsize>,
    /// Ring size for the carousel, worker count for the pool
    pub transaction_count: usize,
}

/// A loader ready to run over one set of statement files
pub enum Loader {
    Carousel(CarouselLoader),
    Pool(PoolLoader),
}

impl Loader {
    /// Build the loader selected by `settings.kind`.
    ///
    /// The carousel connects and opens its ring here; the pool defers all
    /// database work to [`Loader::load`].
    pub async fn build(
        connector: Arc<dyn Connector>,
        paths: Vec<PathBuf>,
        settings: LoaderSettings,
    ) -> Result<Self> {
        match settings.kind {
            LoaderKind::Carousel => Ok(Self::Carousel(
                CarouselLoader::open(
                    connector,
                    paths,
                    settings.batch_size,
                    settings.transaction_count,
                )
                .await?,
            )),
            LoaderKind::Pool => Ok(Self::Pool(PoolLoader::new(
                connector,
                paths,
                settings.batch_size,
                settings.transaction_count,
            )?)),
        }
    }

    pub fn kind(&self) -> LoaderKind {
        match self {
            Self::Carousel(_) => LoaderKind::Carousel,
            Self::Pool(_) => LoaderKind::Pool,
        }
    }

    /// Load every statement.
    pub async fn load(&mut self) -> Result<()> {
        match self {
            Self::Carousel(loader) => loader.load().await,
            Self::Pool(loader) => loader.load().await,
        }
    }

    /// Statements read from the source so far.
    pub fn queries_run(&self) -> u64 {
        match self {
            Self::Carousel(loader) => loader.queries_run(),
            Self::Pool(loader) => loader.queries_run(),
        }
    }
}
