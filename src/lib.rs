//! intronic: GenBank flat file parser that rebuilds genes, isoforms, exons and
//! introns with splice-site and reading-frame quality flags.

pub mod error;

pub mod batch;
pub mod chromosome;
pub mod cli;
pub mod config;
pub mod genbank;
pub mod nucleotide;
pub mod organism;
pub mod sequence;
pub mod store;
pub mod strand;
pub mod transcript;
