use std::fs;
use std::io::Cursor;

use intronic::batch;
use intronic::config::BatchConfig;
use intronic::genbank::GenBankReader;
use intronic::organism::Counter;
use intronic::sequence::{GbkDate, Sequence};
use intronic::store::{JsonLinesStore, MemoryStore, ORGANISMS_FILE, ORPHANS_FILE, SEQUENCES_FILE};
use intronic::strand::Strand;

fn top(text: &mut String, name: &str, value: &str) {
    text.push_str(&format!("{name:<12}{value}\n"));
}

fn feature(text: &mut String, key: &str, value: &str) {
    text.push_str(&format!("     {key:<16}{value}\n"));
}

fn more(text: &mut String, value: &str) {
    text.push_str(&format!("{:21}{value}\n", ""));
}

fn origin(text: &mut String, bases: &str) {
    text.push_str("ORIGIN\n");
    for (line, chunk) in bases.as_bytes().chunks(60).enumerate() {
        text.push_str(&format!("{:>9}", line * 60 + 1));
        for block in chunk.chunks(10) {
            text.push(' ');
            text.push_str(std::str::from_utf8(block).unwrap());
        }
        text.push('\n');
    }
    text.push_str("//\n");
}

/// Forward-strand record with two CDS readings of one mRNA, an RNA feature
/// and a CDS outside every gene.
fn forward_record(text: &mut String) {
    top(text, "LOCUS", "NT_000001   60 bp    DNA     linear   CON 12-MAR-2015");
    top(text, "DEFINITION", "Homo sapiens chromosome 1 genomic contig,");
    top(text, "", "GRCh38.p14 Primary Assembly.");
    top(text, "VERSION", "NT_000001.11");
    top(text, "SOURCE", "Homo sapiens (human)");
    text.push_str(&format!("  {:<10}Homo sapiens\n", "ORGANISM"));
    top(text, "", "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata;");
    top(text, "", "Mammalia; Primates.");
    text.push_str("FEATURES             Location/Qualifiers\n");
    feature(text, "source", "1..60");
    more(text, "/organism=\"Homo sapiens\"");
    more(text, "/db_xref=\"taxon:9606\"");
    more(text, "/chromosome=\"1\"");
    feature(text, "gene", "1..60");
    more(text, "/gene=\"ABC1\"");
    more(text, "/db_xref=\"GeneID:1001\"");
    feature(text, "mRNA", "join(1..20,41..60)");
    more(text, "/product=\"ABC1 transcript\"");
    feature(text, "CDS", "join(1..20,41..60)");
    more(text, "/codon_start=1");
    more(text, "/protein_id=\"NP_000001.1\"");
    more(text, "/db_xref=\"GI:111\"");
    more(text, "/translation=\"MKPGFKAPFKGCC\"");
    feature(text, "CDS", "join(4..20,41..57)");
    more(text, "/protein_id=\"NP_000002.1\"");
    feature(text, "ncRNA", "5..15");
    feature(text, "CDS", "complement(70..90)");
    more(text, "/product=\"lost protein\"");
    more(text, "/db_xref=\"GI:999\"");
    origin(
        text,
        "atgaaacccgggtttaaagcgtaagcttttttttttacagccctttaaaggctgctgtga",
    );
}

/// Reverse-strand record whose oriented transcript reads ATGAAACCCG|GTAAGTTCAG|GGTTTCCTGA.
fn reverse_record(text: &mut String) {
    top(text, "LOCUS", "NT_000002   30 bp    DNA     linear   CON 01-JAN-2020");
    top(text, "DEFINITION", "Homo sapiens chromosome 2 genomic contig.");
    text.push_str(&format!("  {:<10}Homo sapiens\n", "ORGANISM"));
    text.push_str("FEATURES             Location/Qualifiers\n");
    feature(text, "gene", "complement(1..30)");
    more(text, "/gene=\"REV1\"");
    feature(text, "mRNA", "complement(join(1..10,21..30))");
    feature(text, "CDS", "complement(join(1..10,21..30))");
    more(text, "/protein_id=\"NP_000003.1\"");
    origin(text, "tcaggaaaccctgaacttaccgggtttcat");
}

fn mitochondrial_record(text: &mut String) {
    top(text, "LOCUS", "NC_012920   20 bp    DNA     circular PRI 31-FEB-2015");
    top(text, "DEFINITION", "Homo sapiens mitochondrion, complete genome.");
    text.push_str(&format!("  {:<10}Homo sapiens\n", "ORGANISM"));
    text.push_str("FEATURES             Location/Qualifiers\n");
    feature(text, "source", "1..20");
    more(text, "/organism=\"Homo sapiens\"");
    more(text, "/organelle=\"mitochondrion\"");
    origin(text, "gatcacaggtctatcaccct");
}

fn empty_record(text: &mut String) {
    top(text, "LOCUS", "NT_000009   10 bp    DNA");
    text.push_str("//\n");
}

fn batch_text() -> String {
    let mut text = String::new();
    forward_record(&mut text);
    empty_record(&mut text);
    reverse_record(&mut text);
    mitochondrial_record(&mut text);
    text
}

fn read(text: &str, store: &MemoryStore) -> Vec<Sequence> {
    GenBankReader::new(Cursor::new(text.as_bytes()), "hs_ref_chr1.gbk", store)
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn empty_records_are_dropped() {
    let store = MemoryStore::new();
    let ids: Vec<String> = read(&batch_text(), &store)
        .into_iter()
        .map(|s| s.ref_seq_id)
        .collect();
    assert_eq!(ids, vec!["NT_000001", "NT_000002", "NC_012920"]);
}

#[test]
fn forward_record_isoforms() {
    let store = MemoryStore::new();
    let sequences = read(&batch_text(), &store);
    let seq = &sequences[0];

    assert_eq!(
        seq.description,
        "Homo sapiens chromosome 1 genomic contig, GRCh38.p14 Primary Assembly."
    );
    assert_eq!(seq.chromosome.as_deref(), Some("1"));
    assert_eq!(seq.genes.len(), 1);

    let gene = &seq.genes[0];
    assert_eq!(gene.ncbi_gene_id.as_deref(), Some("1001"));
    assert!(gene.has_cds);
    assert!(gene.has_rna);
    assert_eq!(gene.isoforms.len(), 2);
    assert_eq!(gene.max_introns_count, 1);

    let first = &gene.isoforms[0];
    assert_eq!(first.protein_id.as_deref(), Some("NP_000001.1"));
    assert_eq!(first.protein_xref.as_deref(), Some("GI:111"));
    assert_eq!(first.translation.as_deref(), Some("MKPGFKAPFKGCC"));
    assert_eq!(first.start_codon, "ATG");
    assert_eq!(first.end_codon, "TGA");
    assert_eq!(first.introns[0].start, 21);
    assert_eq!(first.introns[0].end, 40);
    assert_eq!(first.introns[0].start_dinucleotide, "GT");
    assert_eq!(first.introns[0].end_dinucleotide, "AG");
    assert!(!first.warning_in_intron);
    assert!(!first.error_main);

    let second = &gene.isoforms[1];
    assert_eq!(second.protein_id.as_deref(), Some("NP_000002.1"));
    assert_eq!(second.exons[0].start, 4);
    assert_eq!(second.exons[1].end, 57);
    assert_eq!(second.mrna_ranges, first.mrna_ranges);

    // the two readings differ in one bound per exon, so all four spans are distinct
    let ids: Vec<u32> = gene
        .isoforms
        .iter()
        .flat_map(|iso| iso.exons.iter().map(|e| e.real_exon_id))
        .collect();
    assert_eq!(ids, vec![1, 4, 2, 3]);

    let orphans = store.orphans();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].product.as_deref(), Some("lost protein"));
    let key_line = format!("     {:<16}complement(70..90)", "CDS");
    let expected_start = batch_text()
        .lines()
        .position(|line| line == key_line)
        .unwrap() as u64
        + 1;
    assert_eq!(orphans[0].start_line, expected_start);
    assert_eq!(orphans[0].end_line, expected_start + 2);
}

#[test]
fn reverse_record_is_oriented() {
    let store = MemoryStore::new();
    let sequences = read(&batch_text(), &store);
    let gene = &sequences[1].genes[0];
    assert_eq!(gene.strand, Strand::Reverse);

    let iso = &gene.isoforms[0];
    assert_eq!(iso.exons[0].start, 21);
    assert_eq!(iso.exons[0].origin, "ATGAAACCCG");
    assert_eq!(iso.exons[1].origin, "GGTTTCCTGA");
    assert_eq!((iso.introns[0].start, iso.introns[0].end), (11, 20));
    assert_eq!(iso.introns[0].origin, "GTAAGTTCAG");
    assert!(!iso.introns[0].error_main);
    assert_eq!(iso.start_codon, "ATG");
    assert_eq!(iso.end_codon, "TGA");
    assert!(!iso.error_main);
}

#[test]
fn mitochondrial_record_and_organism_registry() {
    let store = MemoryStore::new();
    let sequences = read(&batch_text(), &store);
    let mito = &sequences[2];
    assert_eq!(mito.chromosome.as_deref(), Some("mitochondrion"));
    assert_eq!(mito.date, GbkDate::Invalid);
    assert!(mito.genes.is_empty());

    let organism = store.organism("Homo sapiens").unwrap();
    assert!(organism.is_mitochondrial());
    assert_eq!(organism.taxonomy().len(), 7);
    assert_eq!(organism.taxonomy()[6], "Primates");
    assert_eq!(organism.count(Counter::Cds), 3);
    assert_eq!(organism.count(Counter::Rna), 1);
    assert_eq!(store.organisms().len(), 1);
}

#[test]
fn batch_writes_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hs_ref_chr1.gbk");
    fs::write(&input, batch_text()).unwrap();
    let out = dir.path().join("out");

    let store = JsonLinesStore::create(&out, true).unwrap();
    let stats = batch::run_batch(&[input], 1, &store, &BatchConfig::default()).unwrap();
    assert_eq!(stats.sequences, 3);
    assert_eq!(stats.isoforms, 3);

    let summary = store.finish().unwrap();
    assert_eq!(summary.sequences, 3);
    assert_eq!(summary.orphans, 1);
    assert_eq!(summary.organisms, 1);

    let sequences = fs::read_to_string(out.join(SEQUENCES_FILE)).unwrap();
    let first: serde_json::Value =
        serde_json::from_str(sequences.lines().next().unwrap()).unwrap();
    assert_eq!(first["refSeqId"], "NT_000001");
    assert!(first.get("origin").is_none());

    let orphans = fs::read_to_string(out.join(ORPHANS_FILE)).unwrap();
    let orphan: serde_json::Value = serde_json::from_str(orphans.trim()).unwrap();
    assert_eq!(orphan["refSeqId"], "NT_000001");
    assert_eq!(orphan["sourceFile"], "hs_ref_chr1.gbk");

    let registry: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join(ORGANISMS_FILE)).unwrap()).unwrap();
    assert_eq!(registry["organisms"][0]["name"], "Homo sapiens");
    assert_eq!(registry["organisms"][0]["cdsCount"], 3);

    assert!(out.join("origins").join("NT_000001.fa.zst").exists());
}
