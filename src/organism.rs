//! Organism registry entries shared across worker threads.
//!
//! Several input files can describe the same organism, so an `Organism` lives
//! behind an `Arc` in the store registry. Counters are atomics exposed only
//! through [`Organism::increment`]; the descriptive fields sit behind one mutex
//! that is held only for the duration of a single update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Per-organism feature counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Cds,
    Rna,
    UnknownProtGenes,
    UnknownProtCds,
}

#[derive(Debug, Default)]
struct Counters {
    cds: AtomicU64,
    rna: AtomicU64,
    unknown_prot_genes: AtomicU64,
    unknown_prot_cds: AtomicU64,
}

impl Counters {
    fn get(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::Cds => &self.cds,
            Counter::Rna => &self.rna,
            Counter::UnknownProtGenes => &self.unknown_prot_genes,
            Counter::UnknownProtCds => &self.unknown_prot_cds,
        }
    }
}

#[derive(Debug, Default)]
struct Details {
    taxonomy: Vec<String>,
    mitochondrial: bool,
    taxonomy_xref: Option<String>,
}

#[derive(Debug)]
pub struct Organism {
    name: String,
    counters: Counters,
    details: Mutex<Details>,
}

/// Point-in-time copy of an organism for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganismSnapshot {
    pub name: String,
    pub taxonomy: Vec<String>,
    pub mitochondrial: bool,
    pub taxonomy_xref: Option<String>,
    pub cds_count: u64,
    pub rna_count: u64,
    pub unknown_prot_genes_count: u64,
    pub unknown_prot_cds_count: u64,
}

impl Organism {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            counters: Counters::default(),
            details: Mutex::new(Details::default()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn increment(&self, counter: Counter) {
        self.counters.get(counter).fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self, counter: Counter) -> u64 {
        self.counters.get(counter).load(Ordering::Relaxed)
    }

    /// Store the taxonomy unless one was already recorded. Returns whether it was stored.
    pub fn set_taxonomy_if_empty(&self, taxonomy: Vec<String>) -> bool {
        let mut details = self.lock();
        if !details.taxonomy.is_empty() || taxonomy.is_empty() {
            return false;
        }
        details.taxonomy = taxonomy;
        true
    }

    #[must_use]
    pub fn taxonomy(&self) -> Vec<String> {
        self.lock().taxonomy.clone()
    }

    pub fn set_mitochondrial(&self, mitochondrial: bool) {
        self.lock().mitochondrial = mitochondrial;
    }

    #[must_use]
    pub fn is_mitochondrial(&self) -> bool {
        self.lock().mitochondrial
    }

    pub fn set_taxonomy_xref(&self, xref: &str) {
        self.lock().taxonomy_xref = Some(xref.to_string());
    }

    #[must_use]
    pub fn taxonomy_xref(&self) -> Option<String> {
        self.lock().taxonomy_xref.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> OrganismSnapshot {
        let details = self.lock();
        OrganismSnapshot {
            name: self.name.clone(),
            taxonomy: details.taxonomy.clone(),
            mitochondrial: details.mitochondrial,
            taxonomy_xref: details.taxonomy_xref.clone(),
            cds_count: self.count(Counter::Cds),
            rna_count: self.count(Counter::Rna),
            unknown_prot_genes_count: self.count(Counter::UnknownProtGenes),
            unknown_prot_cds_count: self.count(Counter::UnknownProtCds),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Details> {
        self.details.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
