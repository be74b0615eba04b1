//! GenBank flat file reader: tokenizes records, parses the header fields and
//! reconciles features into [`Sequence`] records.

pub mod header;
pub mod location;
pub mod qualifiers;
pub mod tokenizer;

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::error::Error;
use crate::sequence::{GbkDate, Sequence};
use crate::store::Store;
use crate::transcript::finish_sequence;
use crate::transcript::reconcile::Reconciler;

use location::{Location, parse_location};
use qualifiers::Qualifiers;
use tokenizer::{Event, Field, FieldKind, Tokenizer};

/// One entry of the feature table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub key: String,
    pub location: Location,
    pub qualifiers: Qualifiers,
    /// Line on which the feature key appeared.
    pub start_line: u64,
    /// Last line belonging to the feature.
    pub end_line: u64,
}

impl Feature {
    /// Parse a feature from its key and folded value.
    #[must_use]
    pub fn parse(key: &str, value: &str, start_line: u64, end_line: u64) -> Self {
        Self {
            key: key.to_string(),
            location: parse_location(value),
            qualifiers: Qualifiers::parse(value),
            start_line,
            end_line,
        }
    }

    fn from_field(field: &Field) -> Self {
        Self::parse(&field.name, &field.value, field.start_line, field.end_line)
    }
}

/// Open a GenBank file, decompressing `.gz` input.
pub fn open_genbank(path: &Path) -> Result<Box<dyn BufRead + Send>, Error> {
    let file = File::open(path)?;
    let is_gzip = path.extension().is_some_and(|ext| ext == "gz");
    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Streaming reader yielding one reconciled [`Sequence`] per GenBank record.
///
/// Records with neither genes nor a description are skipped. Malformed text
/// never fails the reader, and bytes that are not UTF-8 are replaced; only
/// I/O errors are returned.
pub struct GenBankReader<'s, R: BufRead, S: Store + ?Sized> {
    reader: R,
    line: Vec<u8>,
    tokenizer: Tokenizer,
    pending: Vec<Event>,
    events: VecDeque<Event>,
    source_file: String,
    store: &'s S,
    organism_override: Option<String>,
    exhausted: bool,
}

impl<'s, R: BufRead, S: Store + ?Sized> GenBankReader<'s, R, S> {
    pub fn new(reader: R, source_file: &str, store: &'s S) -> Self {
        Self {
            reader,
            line: Vec::new(),
            tokenizer: Tokenizer::new(),
            pending: Vec::new(),
            events: VecDeque::new(),
            source_file: source_file.to_string(),
            store,
            organism_override: None,
            exhausted: false,
        }
    }

    /// Replace the organism name declared in the file. Blank names are ignored.
    #[must_use]
    pub fn with_organism_override(mut self, name: Option<&str>) -> Self {
        self.organism_override = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub fn line_no(&self) -> u64 {
        self.tokenizer.line_no()
    }

    /// Read the next non-empty record, or `None` at end of input.
    pub fn read_sequence(&mut self) -> Result<Option<Sequence>, Error> {
        loop {
            let Some(sequence) = self.read_record()? else {
                return Ok(None);
            };
            if sequence.is_empty_record() {
                debug!(
                    file = %self.source_file,
                    ref_seq_id = %sequence.ref_seq_id,
                    "empty record skipped"
                );
                continue;
            }
            return Ok(Some(sequence));
        }
    }

    fn read_record(&mut self) -> Result<Option<Sequence>, Error> {
        let store = self.store;
        let organism_override = self.organism_override.clone();
        let mut reconciler =
            Reconciler::new(store).with_organism_override(organism_override.as_deref());
        let mut sequence = Sequence::new(&self.source_file);
        let mut started = false;

        loop {
            let Some(event) = self.next_event()? else {
                if !started {
                    return Ok(None);
                }
                warn!(
                    file = %self.source_file,
                    ref_seq_id = %sequence.ref_seq_id,
                    "record not terminated by //"
                );
                finish_sequence(&mut sequence);
                return Ok(Some(sequence));
            };

            match event {
                Event::Field(field) => {
                    started = true;
                    match field.kind {
                        FieldKind::Feature => {
                            reconciler.add(&mut sequence, &Feature::from_field(&field))?;
                        }
                        FieldKind::TopLevel => {
                            self.apply_header(
                                &mut sequence,
                                &mut reconciler,
                                &field,
                                organism_override.as_deref(),
                            )?;
                        }
                    }
                }
                Event::Bases(bases) => {
                    started = true;
                    sequence.origin.extend_from_slice(&bases);
                }
                Event::EndOfRecord => {
                    finish_sequence(&mut sequence);
                    return Ok(Some(sequence));
                }
            }
        }
    }

    fn apply_header(
        &self,
        sequence: &mut Sequence,
        reconciler: &mut Reconciler<'_, S>,
        field: &Field,
        organism_override: Option<&str>,
    ) -> Result<(), Error> {
        match field.name.as_str() {
            "LOCUS" => {
                let locus = header::parse_locus(&field.value);
                debug!(
                    file = %self.source_file,
                    accession = %locus.accession,
                    line = field.start_line,
                    "LOCUS"
                );
                if locus.date == GbkDate::Invalid {
                    warn!(
                        file = %self.source_file,
                        accession = %locus.accession,
                        value = %field.value,
                        "invalid LOCUS date"
                    );
                }
                sequence.ref_seq_id = locus.accession;
                sequence.length = locus.length;
                sequence.date = locus.date;
            }
            "DEFINITION" => sequence.description = header::fold_whitespace(&field.value),
            "VERSION" => sequence.version = header::fold_whitespace(&field.value),
            "ORGANISM" => {
                let parsed = header::parse_organism(&field.value, organism_override);
                if parsed.name.is_empty() {
                    return Ok(());
                }
                let organism = reconciler.register_organism(sequence, &parsed.name)?;
                organism.set_taxonomy_if_empty(parsed.taxonomy);
            }
            _ => {}
        }
        Ok(())
    }

    fn next_event(&mut self) -> Result<Option<Event>, Error> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Ok(Some(event));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.exhausted = true;
                    self.tokenizer.finish(&mut self.pending);
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_line_end(&self.line));
                    self.tokenizer.push(&line, &mut self.pending);
                }
                Err(e) => {
                    self.exhausted = true;
                    return Err(e.into());
                }
            }
            self.events.extend(self.pending.drain(..));
        }
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl<R: BufRead, S: Store + ?Sized> Iterator for GenBankReader<'_, R, S> {
    type Item = Result<Sequence, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_sequence().transpose()
    }
}
