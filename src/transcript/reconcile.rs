//! Reconciliation of `gene`, `mRNA`, `CDS` and other RNA features into the
//! gene → isoform → exon/intron model.
//!
//! Features are applied strictly in file order: a CDS can only attach to genes
//! and mRNAs declared before it in the same record.

use std::sync::Arc;

use tracing::debug;

use crate::chromosome::{self, Chromosome};
use crate::error::Error;
use crate::genbank::Feature;
use crate::genbank::qualifiers::{DB_XREF, Qualifiers};
use crate::organism::{Counter, Organism};
use crate::sequence::Sequence;
use crate::store::{OrphanedCds, Store};
use crate::strand::Strand;

use super::construction::build_exons_and_introns;
use super::types::{Gene, Isoform, IsoformType, Range};

/// Organelle value that places a record on the mitochondrial chromosome.
pub const MITOCHONDRION: &str = "mitochondrion";
/// Chromosome name used when nothing else identifies one.
pub const UNDEFINED_CHROMOSOME: &str = "undefined";

/// Applies the features of one record to its sequence.
pub struct Reconciler<'a, S: Store + ?Sized> {
    store: &'a S,
    organism_override: Option<&'a str>,
    organism: Option<Arc<Organism>>,
    chromosome: Option<Arc<Chromosome>>,
}

impl<'a, S: Store + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            organism_override: None,
            organism: None,
            chromosome: None,
        }
    }

    /// Organism name that replaces the one declared in the file.
    #[must_use]
    pub fn with_organism_override(mut self, name: Option<&'a str>) -> Self {
        self.organism_override = name.filter(|n| !n.trim().is_empty());
        self
    }

    #[must_use]
    pub fn organism(&self) -> Option<&Arc<Organism>> {
        self.organism.as_ref()
    }

    #[must_use]
    pub fn chromosome(&self) -> Option<&Arc<Chromosome>> {
        self.chromosome.as_ref()
    }

    /// Look up (or create) the organism and attach it to the sequence.
    pub fn register_organism(
        &mut self,
        sequence: &mut Sequence,
        name: &str,
    ) -> Result<Arc<Organism>, Error> {
        let organism = self.store.find_or_create_organism(name)?;
        sequence.organism = Some(organism.name().to_string());
        self.organism = Some(Arc::clone(&organism));
        Ok(organism)
    }

    /// Apply one feature. Only store failures are errors; unmatched features are
    /// dropped or reported as orphans.
    pub fn add(&mut self, sequence: &mut Sequence, feature: &Feature) -> Result<(), Error> {
        match feature.key.as_str() {
            "source" => self.add_source(sequence, feature),
            key if feature.location.is_empty() => {
                debug!(
                    key,
                    line = feature.start_line,
                    "feature without a usable location skipped"
                );
                Ok(())
            }
            "gene" => {
                self.add_gene(sequence, feature);
                Ok(())
            }
            "CDS" => self.add_cds(sequence, feature),
            "mRNA" => {
                self.add_mrna(sequence, feature);
                Ok(())
            }
            key if key.ends_with("RNA") => {
                self.add_rna(sequence, feature);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn add_source(&mut self, sequence: &mut Sequence, feature: &Feature) -> Result<(), Error> {
        let qualifiers = &feature.qualifiers;
        if self.organism.is_none() {
            let name = self
                .organism_override
                .or_else(|| qualifiers.get("organism"))
                .unwrap_or_default()
                .trim()
                .to_string();
            if name.is_empty() {
                debug!(
                    line = feature.start_line,
                    "source feature without an organism"
                );
                return Ok(());
            }
            self.register_organism(sequence, &name)?;
        }
        let Some(organism) = self.organism.clone() else {
            return Ok(());
        };

        if let Some(organelle) = qualifiers.get("organelle") {
            organism.set_mitochondrial(organelle == MITOCHONDRION);
        }
        if let Some(xref) = qualifiers.get(DB_XREF) {
            organism.set_taxonomy_xref(xref);
        }

        let name = chromosome_name(qualifiers, &sequence.source_file_name);
        let chromosome = self.store.find_or_create_chromosome(&name, &organism)?;
        sequence.chromosome = Some(chromosome.name.clone());
        self.chromosome = Some(chromosome);
        Ok(())
    }

    fn add_gene(&mut self, sequence: &mut Sequence, feature: &Feature) {
        let qualifiers = &feature.qualifiers;
        let location = &feature.location;
        sequence.genes.push(Gene {
            start: location.start,
            end: location.end,
            strand: location.strand,
            name: qualifiers.get("gene").map(str::to_string),
            ncbi_gene_id: qualifiers.gene_id().map(str::to_string),
            is_pseudo_gene: qualifiers.contains("pseudo") || qualifiers.contains("pseudogene"),
            ..Default::default()
        });
        if self.on_unknown_chromosome() {
            self.increment(Counter::UnknownProtGenes);
        }
    }

    fn add_mrna(&mut self, sequence: &mut Sequence, feature: &Feature) {
        let location = &feature.location;
        let Some(gene_index) =
            find_gene_containing(&sequence.genes, location.span(), location.strand)
        else {
            debug!(
                ref_seq_id = %sequence.ref_seq_id,
                line = feature.start_line,
                "mRNA outside every declared gene dropped"
            );
            return;
        };

        let gene = &mut sequence.genes[gene_index];
        gene.isoforms.push(Isoform::from_mrna(
            gene_index,
            location.span(),
            location.ranges.clone(),
        ));
        let isoform_index = gene.isoforms.len() - 1;
        annotate(gene, isoform_index, &feature.qualifiers);
    }

    fn add_rna(&mut self, sequence: &mut Sequence, feature: &Feature) {
        let location = &feature.location;
        match find_gene_containing(&sequence.genes, location.span(), location.strand) {
            Some(gene_index) => {
                sequence.genes[gene_index].has_rna = true;
                self.increment(Counter::Rna);
            }
            None => debug!(
                key = %feature.key,
                line = feature.start_line,
                "RNA feature outside every declared gene"
            ),
        }
    }

    fn add_cds(&mut self, sequence: &mut Sequence, feature: &Feature) -> Result<(), Error> {
        let qualifiers = &feature.qualifiers;
        let location = &feature.location;

        let Some(gene_index) =
            find_gene_containing(&sequence.genes, location.span(), location.strand)
        else {
            return self.report_orphan(sequence, feature);
        };
        let Some(found) = find_isoform_for_cds(&sequence.genes[gene_index], &location.ranges)
        else {
            return self.report_orphan(sequence, feature);
        };

        let gene = &mut sequence.genes[gene_index];
        let isoform_index = match found {
            IsoformMatch::MrnaOnly(index) => index,
            IsoformMatch::Coded(index) => {
                let copy = gene.isoforms[index].duplicate_for_alternate_cds();
                gene.isoforms.push(copy);
                gene.isoforms.len() - 1
            }
        };

        let isoform = &mut gene.isoforms[isoform_index];
        isoform.isoform_type = IsoformType::Cds;
        isoform.cds_start = Some(location.start);
        isoform.cds_end = Some(location.end);
        isoform.exons_cds_count = location.ranges.len() as u32;

        gene.has_cds = true;
        gene.is_protein_but_not_rna = true;
        gene.start_code = Some(location.start);
        gene.end_code = Some(location.end);

        self.increment(Counter::Cds);
        if self.on_unknown_chromosome() {
            self.increment(Counter::UnknownProtCds);
        }

        annotate(gene, isoform_index, qualifiers);
        build_exons_and_introns(
            gene,
            isoform_index,
            &location.ranges,
            location.strand,
            qualifiers.codon_start(),
        );
        if let Some(translation) = qualifiers.get("translation") {
            gene.isoforms[isoform_index].translation = Some(translation.to_string());
        }
        Ok(())
    }

    fn report_orphan(&self, sequence: &Sequence, feature: &Feature) -> Result<(), Error> {
        debug!(
            file = %sequence.source_file_name,
            ref_seq_id = %sequence.ref_seq_id,
            start_line = feature.start_line,
            end_line = feature.end_line,
            "orphaned CDS"
        );
        let qualifiers = &feature.qualifiers;
        self.store.add_orphaned_cds(OrphanedCds {
            source_file: sequence.source_file_name.clone(),
            start_line: feature.start_line,
            end_line: feature.end_line,
            ref_seq_id: sequence.ref_seq_id.clone(),
            db_xref: qualifiers.get(DB_XREF).map(str::to_string),
            product: qualifiers.get("product").map(str::to_string),
        })
    }

    fn on_unknown_chromosome(&self) -> bool {
        self.chromosome.as_ref().is_some_and(|c| c.is_unknown())
    }

    fn increment(&self, counter: Counter) {
        if let Some(organism) = &self.organism {
            organism.increment(counter);
        }
    }
}

/// Chromosome of a `source` feature: the `chromosome` qualifier, then the
/// mitochondrial organelle, then a `chr<NAME>.gbk` file name, then `undefined`.
#[must_use]
pub fn chromosome_name(qualifiers: &Qualifiers, source_file_name: &str) -> String {
    if let Some(name) = qualifiers.get("chromosome") {
        return name.to_string();
    }
    if qualifiers.get("organelle") == Some(MITOCHONDRION) {
        return MITOCHONDRION.to_string();
    }
    chromosome::name_from_file_name(source_file_name)
        .unwrap_or(UNDEFINED_CHROMOSOME)
        .to_string()
}

/// First gene on the same strand whose span contains `span`.
///
/// Used for mRNA, CDS and other RNA features alike; mRNAs are not required to
/// match the gene bounds exactly.
#[must_use]
pub fn find_gene_containing(genes: &[Gene], span: Range, strand: Strand) -> Option<usize> {
    genes
        .iter()
        .position(|gene| gene.strand == strand && gene.span().contains(&span))
}

/// Whether CDS sub-ranges correspond to mRNA sub-ranges.
///
/// Inner CDS ranges must equal an mRNA range. The first CDS range needs an exact
/// end and the last an exact start; a lone CDS range only needs containment.
#[must_use]
pub fn cds_ranges_match_mrna_ranges(cds: &[Range], mrna: &[Range]) -> bool {
    let count = cds.len();
    let single = count == 1;
    cds.iter().enumerate().all(|(index, c)| {
        let exact_start = !single && index != 0;
        let exact_end = !single && index != count - 1;
        mrna.iter().any(|m| {
            let start_ok = if exact_start {
                m.start == c.start
            } else {
                m.start <= c.start
            };
            let end_ok = if exact_end {
                m.end == c.end
            } else {
                m.end >= c.end
            };
            start_ok && end_ok
        })
    })
}

/// Isoform chosen to host a CDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoformMatch {
    /// An mRNA isoform without a CDS yet.
    MrnaOnly(usize),
    /// An isoform that already carries a CDS; the caller duplicates it.
    Coded(usize),
}

/// Find the isoform whose mRNA ranges correspond to the CDS ranges, preferring
/// one that has no CDS yet.
#[must_use]
pub fn find_isoform_for_cds(gene: &Gene, cds_ranges: &[Range]) -> Option<IsoformMatch> {
    let matches =
        |isoform: &Isoform| cds_ranges_match_mrna_ranges(cds_ranges, &isoform.mrna_ranges);
    if let Some(index) = gene
        .isoforms
        .iter()
        .position(|iso| !iso.has_cds() && matches(iso))
    {
        return Some(IsoformMatch::MrnaOnly(index));
    }
    gene.isoforms
        .iter()
        .position(|iso| iso.has_cds() && matches(iso))
        .map(IsoformMatch::Coded)
}

/// Copy the shared descriptive qualifiers onto an isoform and its gene.
fn annotate(gene: &mut Gene, isoform_index: usize, qualifiers: &Qualifiers) {
    let Gene {
        ncbi_gene_id,
        isoforms,
        ..
    } = gene;
    let Some(isoform) = isoforms.get_mut(isoform_index) else {
        return;
    };

    if let Some(protein_id) = qualifiers.get("protein_id") {
        isoform.protein_id = Some(protein_id.to_string());
    }
    if let Some(xref) = qualifiers.get(DB_XREF) {
        if ncbi_gene_id.is_none() {
            *ncbi_gene_id = qualifiers.gene_id().map(str::to_string);
        }
        if isoform.protein_xref.is_none() {
            let gi = qualifiers.find_xref("GI:").unwrap_or(xref);
            isoform.protein_xref = Some(gi.to_string());
        }
    }
    if let Some(product) = qualifiers.get("product") {
        isoform.product = Some(product.to_string());
    }
    if let Some(note) = qualifiers.get("note") {
        isoform.note = Some(note.to_string());
    }
}
