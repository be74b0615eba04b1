//! Batch processing: input files are split into contiguous ranges, one per
//! worker thread. Workers share only the store and its organism registry.

use std::io::BufRead;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::error::Error;
use crate::genbank::{GenBankReader, open_genbank};
use crate::store::Store;

/// Totals over a batch of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub files_processed: u64,
    pub files_skipped: u64,
    /// Files that failed to read partway; their earlier records were stored.
    pub files_incomplete: u64,
    pub sequences: u64,
    pub genes: u64,
    pub isoforms: u64,
}

impl BatchStats {
    pub fn merge(&mut self, other: &BatchStats) {
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.files_incomplete += other.files_incomplete;
        self.sequences += other.sequences;
        self.genes += other.genes;
        self.isoforms += other.isoforms;
    }
}

/// Worker count for a batch: `0` means one per available core, and there are
/// never more workers than files.
#[must_use]
pub fn resolve_threads(requested: usize, file_count: usize) -> usize {
    let threads = if requested == 0 {
        thread::available_parallelism().map_or(1, usize::from)
    } else {
        requested
    };
    threads.min(file_count).max(1)
}

/// Split `count` items into `threads` contiguous ranges. Each worker gets
/// `count / threads` items and the last one also takes the remainder.
#[must_use]
pub fn partition(count: usize, threads: usize) -> Vec<Range<usize>> {
    if count == 0 {
        return Vec::new();
    }
    let threads = threads.clamp(1, count);
    let per_worker = count / threads;
    (0..threads)
        .map(|worker| {
            let start = worker * per_worker;
            let end = if worker == threads - 1 {
                count
            } else {
                start + per_worker
            };
            start..end
        })
        .collect()
}

/// Parse every file, handing sequences to the store. Store failures abort the
/// batch; unreadable files are logged and skipped.
pub fn run_batch<S: Store + ?Sized>(
    files: &[PathBuf],
    threads: usize,
    store: &S,
    config: &BatchConfig,
) -> Result<BatchStats, Error> {
    let ranges = partition(files.len(), threads);
    info!(files = files.len(), workers = ranges.len(), "starting batch");

    thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .into_iter()
            .map(|range| {
                let chunk = &files[range];
                scope.spawn(move || process_files(chunk, store, config))
            })
            .collect();

        let mut stats = BatchStats::default();
        let mut first_error = None;
        for handle in handles {
            let result = match handle.join() {
                Ok(result) => result,
                Err(payload) => {
                    let msg = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    Err(Error::Worker(msg))
                }
            };
            match result {
                Ok(worker_stats) => stats.merge(&worker_stats),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    })
}

fn process_files<S: Store + ?Sized>(
    files: &[PathBuf],
    store: &S,
    config: &BatchConfig,
) -> Result<BatchStats, Error> {
    let mut stats = BatchStats::default();
    for path in files {
        let mut file_stats = BatchStats::default();
        let result = process_file(path, store, config, &mut file_stats);
        stats.merge(&file_stats);
        match result {
            Ok(()) => {}
            Err(Error::Io(e)) if file_stats.files_processed == 0 => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                stats.files_skipped += 1;
            }
            Err(Error::Io(e)) => {
                warn!(
                    file = %path.display(),
                    error = %e,
                    sequences = file_stats.sequences,
                    "read failed partway, keeping records stored so far"
                );
                stats.files_incomplete += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(stats)
}

/// Parse one file and store its sequences, adding to `stats` as each
/// sequence is stored. The file counts as processed once it is open.
pub fn process_file<S: Store + ?Sized>(
    path: &Path,
    store: &S,
    config: &BatchConfig,
    stats: &mut BatchStats,
) -> Result<(), Error> {
    let reader = open_genbank(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(file = %path.display(), "processing");
    stats.files_processed += 1;
    process_reader(reader, &file_name, store, config, stats)
}

fn process_reader<R: BufRead, S: Store + ?Sized>(
    reader: R,
    file_name: &str,
    store: &S,
    config: &BatchConfig,
    stats: &mut BatchStats,
) -> Result<(), Error> {
    let sequences = GenBankReader::new(reader, file_name, store)
        .with_organism_override(config.organism_name.as_deref());
    for sequence in sequences {
        let sequence = sequence?;
        let organism = match &sequence.organism {
            Some(name) => Some(store.find_or_create_organism(name)?),
            None => None,
        };
        if let Some(organism) = &organism {
            config.apply_taxonomy(organism);
        }

        let genes = sequence.genes.len() as u64;
        let isoforms = sequence.isoform_count() as u64;
        store.store_origin(&sequence)?;
        store.add_sequence(sequence)?;
        stats.sequences += 1;
        stats.genes += genes;
        stats.isoforms += isoforms;

        if let Some(organism) = &organism {
            store.update_organism(organism)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::fs;
    use std::io::{self, BufReader, Read};

    /// Yields its bytes, then fails every further read.
    struct FailingTail {
        data: io::Cursor<Vec<u8>>,
    }

    impl Read for FailingTail {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::other("device went away")),
                n => Ok(n),
            }
        }
    }

    fn record(accession: &str, organism: &str) -> String {
        let mut text = format!("{:<12}{accession}   12 bp    DNA\n", "LOCUS");
        text += &format!("{:<12}{organism} test record.\n", "DEFINITION");
        text += &format!("  {:<10}{organism}\n", "ORGANISM");
        text += "FEATURES             Location/Qualifiers\n";
        text += &format!("     {:<16}1..12\n", "gene");
        text += &format!("     {:<16}1..12\n", "mRNA");
        text += &format!("     {:<16}1..12\n", "CDS");
        text += "ORIGIN\n";
        text += "        1 atgaaaccct aa\n";
        text += "//\n";
        text
    }

    #[test]
    fn partition_gives_remainder_to_last_worker() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
        assert_eq!(partition(4, 4), vec![0..1, 1..2, 2..3, 3..4]);
        assert_eq!(partition(2, 8), vec![0..1, 1..2]);
        assert_eq!(partition(5, 0), vec![0..5]);
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn thread_resolution() {
        assert_eq!(resolve_threads(4, 2), 2);
        assert_eq!(resolve_threads(2, 10), 2);
        assert_eq!(resolve_threads(3, 0), 1);
        assert!(resolve_threads(0, 100) >= 1);
    }

    #[test]
    fn batch_over_files_with_missing_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        let organisms = ["Homo sapiens", "Homo sapiens", "Mus musculus"];
        for (i, organism) in organisms.iter().enumerate() {
            let path = dir.path().join(format!("chr{}.gbk", i + 1));
            fs::write(&path, record(&format!("NT_00000{i}"), organism)).unwrap();
            files.push(path);
        }
        files.push(dir.path().join("missing.gbk"));

        let store = MemoryStore::new();
        let config = BatchConfig {
            taxonomy: vec!["Eukaryota".to_string()],
            ..Default::default()
        };
        let stats = run_batch(&files, 3, &store, &config).unwrap();

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.sequences, 3);
        assert_eq!(stats.genes, 3);
        assert_eq!(stats.isoforms, 3);
        assert_eq!(store.sequences().len(), 3);
        assert_eq!(store.origin_ids().len(), 3);

        let organisms = store.organisms();
        assert_eq!(organisms.len(), 2);
        let human = store.organism("Homo sapiens").unwrap();
        assert_eq!(human.count(crate::organism::Counter::Cds), 2);
        assert_eq!(human.taxonomy(), vec!["Eukaryota"]);
    }

    #[test]
    fn organism_override_applies_to_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chr1.gbk");
        fs::write(&path, record("NT_000010", "Mus musculus")).unwrap();

        let store = MemoryStore::new();
        let config = BatchConfig {
            organism_name: Some("Rattus norvegicus".to_string()),
            ..Default::default()
        };
        let mut stats = BatchStats::default();
        process_file(&path, &store, &config, &mut stats).unwrap();
        assert_eq!(stats.files_processed, 1);
        assert!(store.organism("Rattus norvegicus").is_some());
        assert!(store.organism("Mus musculus").is_none());
    }

    #[test]
    fn read_failure_keeps_counts_of_stored_records() {
        let text = record("NT_000021", "Homo sapiens") + &record("NT_000022", "Homo sapiens");
        let reader = BufReader::new(FailingTail {
            data: io::Cursor::new(text.into_bytes()),
        });
        let store = MemoryStore::new();
        let mut stats = BatchStats::default();
        let config = BatchConfig::default();
        let result = process_reader(reader, "chr1.gbk", &store, &config, &mut stats);

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(stats.sequences, 2);
        assert_eq!(stats.genes, 2);
        assert_eq!(stats.isoforms, 2);
        assert_eq!(store.sequences().len(), 2);
    }

    #[test]
    fn file_failing_after_open_is_incomplete_not_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("chr1.gbk");
        fs::write(&good, record("NT_000031", "Homo sapiens")).unwrap();
        // opening a directory succeeds, reading it does not
        let unreadable = dir.path().join("chr2.gbk");
        fs::create_dir(&unreadable).unwrap();

        let store = MemoryStore::new();
        let stats = run_batch(&[good, unreadable], 1, &store, &BatchConfig::default()).unwrap();
        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.files_incomplete, 1);
        assert_eq!(stats.files_skipped, 0);
        assert_eq!(stats.sequences, 1);
    }
}
