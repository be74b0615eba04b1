//! JSON-lines output store.
//!
//! Layout of the output directory:
//!
//! - `sequences.jsonl`: one sequence per line, origin omitted
//! - `orphaned_cds.jsonl`: one orphaned CDS per line
//! - `organisms.json`: organism counters and chromosomes, written by [`JsonLinesStore::finish`]
//! - `origins/<id>.fa.zst`: zstd-compressed FASTA origin, when enabled

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use super::{MemoryStore, OrphanedCds, Store, lock};
use crate::chromosome::Chromosome;
use crate::error::Error;
use crate::organism::{Organism, OrganismSnapshot};
use crate::sequence::Sequence;

pub const SEQUENCES_FILE: &str = "sequences.jsonl";
pub const ORPHANS_FILE: &str = "orphaned_cds.jsonl";
pub const ORGANISMS_FILE: &str = "organisms.json";
pub const ORIGINS_DIR: &str = "origins";

const FASTA_LINE_WIDTH: usize = 70;
const ZSTD_LEVEL: i32 = 19;

#[derive(Serialize)]
struct Registry {
    organisms: Vec<OrganismSnapshot>,
    chromosomes: Vec<Chromosome>,
}

/// Totals reported when the store is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub sequences: u64,
    pub orphans: u64,
    pub organisms: usize,
}

pub struct JsonLinesStore {
    registry: MemoryStore,
    dir: PathBuf,
    sequences: Mutex<LineWriter>,
    orphans: Mutex<LineWriter>,
    origins_dir: Option<PathBuf>,
}

struct LineWriter {
    writer: BufWriter<File>,
    count: u64,
}

impl LineWriter {
    fn create(path: &Path) -> Result<Self, Error> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            count: 0,
        })
    }

    fn write<T: Serialize>(&mut self, value: &T) -> Result<(), Error> {
        serde_json::to_writer(&mut self.writer, value).map_err(json_error)?;
        self.writer.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }
}

fn json_error(e: serde_json::Error) -> Error {
    Error::Store(format!("JSON serialization failed: {e}"))
}

impl JsonLinesStore {
    /// Create the output directory and open the line files.
    pub fn create(dir: &Path, store_origins: bool) -> Result<Self, Error> {
        fs::create_dir_all(dir)?;
        let origins_dir = if store_origins {
            let path = dir.join(ORIGINS_DIR);
            fs::create_dir_all(&path)?;
            Some(path)
        } else {
            None
        };
        Ok(Self {
            registry: MemoryStore::new(),
            dir: dir.to_path_buf(),
            sequences: Mutex::new(LineWriter::create(&dir.join(SEQUENCES_FILE))?),
            orphans: Mutex::new(LineWriter::create(&dir.join(ORPHANS_FILE))?),
            origins_dir,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Flush the line files and write the organism registry.
    pub fn finish(self) -> Result<StoreSummary, Error> {
        let mut sequences = self.sequences.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut orphans = self.orphans.into_inner().unwrap_or_else(PoisonError::into_inner);
        sequences.writer.flush()?;
        orphans.writer.flush()?;

        let registry = Registry {
            organisms: self.registry.organisms(),
            chromosomes: self.registry.chromosomes(),
        };
        let mut writer = BufWriter::new(File::create(self.dir.join(ORGANISMS_FILE))?);
        serde_json::to_writer_pretty(&mut writer, &registry).map_err(json_error)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(StoreSummary {
            sequences: sequences.count,
            orphans: orphans.count,
            organisms: registry.organisms.len(),
        })
    }
}

/// FASTA file name for a sequence id; path separators are replaced.
fn origin_file_name(ref_seq_id: &str) -> String {
    let stem = if ref_seq_id.is_empty() {
        "unnamed".to_string()
    } else {
        ref_seq_id.replace(['/', '\\'], "_")
    };
    format!("{stem}.fa.zst")
}

fn to_fasta(sequence: &Sequence) -> Vec<u8> {
    let line_count = sequence.origin.len() / FASTA_LINE_WIDTH + 1;
    let mut fasta = Vec::with_capacity(sequence.origin.len() + line_count + 64);
    fasta.push(b'>');
    fasta.extend_from_slice(sequence.ref_seq_id.as_bytes());
    if !sequence.description.is_empty() {
        fasta.push(b' ');
        fasta.extend_from_slice(sequence.description.as_bytes());
    }
    fasta.push(b'\n');
    for line in sequence.origin.chunks(FASTA_LINE_WIDTH) {
        fasta.extend_from_slice(line);
        fasta.push(b'\n');
    }
    fasta
}

impl Store for JsonLinesStore {
    fn find_or_create_organism(&self, name: &str) -> Result<Arc<Organism>, Error> {
        self.registry.find_or_create_organism(name)
    }

    fn find_or_create_chromosome(
        &self,
        name: &str,
        organism: &Organism,
    ) -> Result<Arc<Chromosome>, Error> {
        self.registry.find_or_create_chromosome(name, organism)
    }

    fn add_orphaned_cds(&self, orphan: OrphanedCds) -> Result<(), Error> {
        lock(&self.orphans).write(&orphan)
    }

    fn store_origin(&self, sequence: &Sequence) -> Result<(), Error> {
        let Some(dir) = &self.origins_dir else {
            return Ok(());
        };
        let compressed = zstd::encode_all(to_fasta(sequence).as_slice(), ZSTD_LEVEL)?;
        fs::write(dir.join(origin_file_name(&sequence.ref_seq_id)), compressed)?;
        Ok(())
    }

    fn add_sequence(&self, sequence: Sequence) -> Result<(), Error> {
        lock(&self.sequences).write(&sequence)
    }

    fn update_organism(&self, organism: &Organism) -> Result<(), Error> {
        self.registry.update_organism(organism)
    }
}
