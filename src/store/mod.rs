//! Record store: the organism/chromosome registry and the sink for parsed
//! sequences and orphaned CDS features.

mod json;
mod memory;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::chromosome::Chromosome;
use crate::error::Error;
use crate::organism::Organism;
use crate::sequence::Sequence;

pub use json::{
    JsonLinesStore, ORGANISMS_FILE, ORIGINS_DIR, ORPHANS_FILE, SEQUENCES_FILE, StoreSummary,
};
pub use memory::MemoryStore;

/// A CDS feature that could not be matched to a gene or an mRNA isoform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedCds {
    pub source_file: String,
    /// Line on which the feature key appeared.
    pub start_line: u64,
    /// Last line of the feature.
    pub end_line: u64,
    pub ref_seq_id: String,
    pub db_xref: Option<String>,
    pub product: Option<String>,
}

/// Storage shared by every worker of a batch.
///
/// Organisms and chromosomes are deduplicated by name; the returned handles are
/// shared between workers.
pub trait Store: Send + Sync {
    fn find_or_create_organism(&self, name: &str) -> Result<Arc<Organism>, Error>;

    fn find_or_create_chromosome(
        &self,
        name: &str,
        organism: &Organism,
    ) -> Result<Arc<Chromosome>, Error>;

    fn add_orphaned_cds(&self, orphan: OrphanedCds) -> Result<(), Error>;

    fn store_origin(&self, sequence: &Sequence) -> Result<(), Error>;

    fn add_sequence(&self, sequence: Sequence) -> Result<(), Error>;

    fn update_organism(&self, organism: &Organism) -> Result<(), Error>;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
