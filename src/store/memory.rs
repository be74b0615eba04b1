//! In-memory store. Also serves as the registry behind [`super::JsonLinesStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{OrphanedCds, Store, lock};
use crate::chromosome::Chromosome;
use crate::error::Error;
use crate::organism::{Organism, OrganismSnapshot};
use crate::sequence::Sequence;

#[derive(Debug, Default)]
pub struct MemoryStore {
    organisms: Mutex<HashMap<String, Arc<Organism>>>,
    /// Keyed by (organism, chromosome).
    chromosomes: Mutex<HashMap<(String, String), Arc<Chromosome>>>,
    sequences: Mutex<Vec<Sequence>>,
    orphans: Mutex<Vec<OrphanedCds>>,
    origin_ids: Mutex<Vec<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn organism(&self, name: &str) -> Option<Arc<Organism>> {
        lock(&self.organisms).get(name).cloned()
    }

    /// Snapshots of every registered organism, sorted by name.
    #[must_use]
    pub fn organisms(&self) -> Vec<OrganismSnapshot> {
        let mut snapshots: Vec<_> = lock(&self.organisms)
            .values()
            .map(|organism| organism.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Registered chromosomes, sorted by organism then name.
    #[must_use]
    pub fn chromosomes(&self) -> Vec<Chromosome> {
        let mut chromosomes: Vec<_> = lock(&self.chromosomes)
            .values()
            .map(|c| Chromosome::clone(c))
            .collect();
        chromosomes.sort_by(|a, b| (&a.organism, &a.name).cmp(&(&b.organism, &b.name)));
        chromosomes
    }

    #[must_use]
    pub fn sequences(&self) -> Vec<Sequence> {
        lock(&self.sequences).clone()
    }

    #[must_use]
    pub fn orphans(&self) -> Vec<OrphanedCds> {
        lock(&self.orphans).clone()
    }

    /// Ids of sequences whose origin was handed to the store.
    #[must_use]
    pub fn origin_ids(&self) -> Vec<String> {
        lock(&self.origin_ids).clone()
    }
}

impl Store for MemoryStore {
    fn find_or_create_organism(&self, name: &str) -> Result<Arc<Organism>, Error> {
        let mut organisms = lock(&self.organisms);
        let organism = organisms
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Organism::new(name)));
        Ok(Arc::clone(organism))
    }

    fn find_or_create_chromosome(
        &self,
        name: &str,
        organism: &Organism,
    ) -> Result<Arc<Chromosome>, Error> {
        let mut chromosomes = lock(&self.chromosomes);
        let key = (organism.name().to_string(), name.to_string());
        let chromosome = chromosomes
            .entry(key)
            .or_insert_with(|| Arc::new(Chromosome::new(name, organism.name())));
        Ok(Arc::clone(chromosome))
    }

    fn add_orphaned_cds(&self, orphan: OrphanedCds) -> Result<(), Error> {
        lock(&self.orphans).push(orphan);
        Ok(())
    }

    fn store_origin(&self, sequence: &Sequence) -> Result<(), Error> {
        lock(&self.origin_ids).push(sequence.ref_seq_id.clone());
        Ok(())
    }

    fn add_sequence(&self, sequence: Sequence) -> Result<(), Error> {
        lock(&self.sequences).push(sequence);
        Ok(())
    }

    fn update_organism(&self, _organism: &Organism) -> Result<(), Error> {
        // registry entries are shared handles, already up to date
        Ok(())
    }
}
