//! Optional synonymous-only filtering.
//!
//! The pipeline only needs a yes/no answer per event: keep substitutions
//! that are non-coding or leave every overlapping gene's protein unchanged.
//! The gene coordinates come from an external table; translation uses the
//! standard genetic code.

use crate::spectrum::alphabet::complement;
use crate::spectrum::extract::MutationEvent;
use serde::Deserialize;
use std::error::Error;
use std::path::Path;

/// Pass/fail predicate applied to each event after context resolution.
/// `reference` is the branch-updated genome carrying every substitution
/// that happened before this event.
pub trait SynonymyFilter {
    fn is_retained(&self, event: &MutationEvent, reference: &[u8]) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

/// A protein-coding region. `start`/`end` are 1-based and inclusive, with
/// `start` the lowest genome coordinate regardless of strand.
#[derive(Debug, Clone, Deserialize)]
pub struct Gene {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
}

#[derive(Debug, Clone)]
pub struct GeneTable {
    genes: Vec<Gene>,
}

impl GeneTable {
    pub fn new(genes: Vec<Gene>) -> Self {
        GeneTable { genes }
    }

    /// Reads a gene coordinate table: tab- or comma-separated columns
    /// `name, start, end, strand` with a header row.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read gene table {}: {}", path.display(), e))?;
        let delimiter = if text.lines().next().map_or(false, |l| l.contains('\t')) {
            b'\t'
        } else {
            b','
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .from_reader(text.as_bytes());
        let mut genes = Vec::new();
        for record in reader.deserialize() {
            let gene: Gene = record
                .map_err(|e| format!("Invalid gene table row in {}: {}", path.display(), e))?;
            if gene.end < gene.start {
                return Err(format!(
                    "Gene '{}' ends before it starts ({}..{})",
                    gene.name, gene.start, gene.end
                )
                .into());
            }
            genes.push(gene);
        }
        Ok(GeneTable::new(genes))
    }

    fn genes_covering(&self, position: usize) -> impl Iterator<Item = &Gene> {
        self.genes
            .iter()
            .filter(move |g| position >= g.start && position <= g.end)
    }
}

impl SynonymyFilter for GeneTable {
    fn is_retained(&self, event: &MutationEvent, reference: &[u8]) -> bool {
        // non-coding positions are retained; coding ones must be
        // synonymous in every overlapping gene
        self.genes_covering(event.genome_position)
            .all(|gene| is_synonymous_in(gene, event, reference))
    }
}

/// Amino acid encoded before and after the substitution within one gene.
fn is_synonymous_in(gene: &Gene, event: &MutationEvent, reference: &[u8]) -> bool {
    let offset = match gene.strand {
        Strand::Forward => event.genome_position - gene.start,
        Strand::Reverse => gene.end - event.genome_position,
    };
    let codon_index = offset / 3;
    let within = offset % 3;

    let mut ancestral_codon = [0u8; 3];
    let mut derived_codon = [0u8; 3];
    for slot in 0..3 {
        let genome_position = match gene.strand {
            Strand::Forward => gene.start + codon_index * 3 + slot,
            Strand::Reverse => gene.end - codon_index * 3 - slot,
        };
        if genome_position < gene.start
            || genome_position > gene.end
            || genome_position > reference.len()
        {
            // truncated trailing codon; treat as non-translatable
            return false;
        }
        let mut base = reference[genome_position - 1].to_ascii_uppercase();
        if genome_position == event.genome_position {
            base = event.ancestral;
        }
        let read = match gene.strand {
            Strand::Forward => base,
            Strand::Reverse => match base {
                b'A' => b'T',
                b'T' => b'A',
                b'C' => b'G',
                b'G' => b'C',
                // gaps or ambiguity codes make the codon untranslatable
                _ => return false,
            },
        };
        ancestral_codon[slot] = read;
        derived_codon[slot] = read;
    }
    let derived_base = match gene.strand {
        Strand::Forward => event.derived,
        Strand::Reverse => complement(event.derived),
    };
    derived_codon[within] = derived_base;

    match (translate(&ancestral_codon), translate(&derived_codon)) {
        (Some(before), Some(after)) => before == after,
        _ => false,
    }
}

/// Standard genetic code; `None` for codons with non-ACGT bases.
fn translate(codon: &[u8; 3]) -> Option<u8> {
    fn index(base: u8) -> Option<usize> {
        match base {
            b'T' => Some(0),
            b'C' => Some(1),
            b'A' => Some(2),
            b'G' => Some(3),
            _ => None,
        }
    }
    const TABLE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";
    let i = index(codon[0])? * 16 + index(codon[1])? * 4 + index(codon[2])?;
    Some(TABLE[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(position: usize, ancestral: u8, derived: u8) -> MutationEvent {
        MutationEvent {
            ancestral,
            alignment_position: position,
            genome_position: position,
            derived,
        }
    }

    #[test]
    fn translation_follows_the_standard_code() {
        assert_eq!(translate(b"ATG"), Some(b'M'));
        assert_eq!(translate(b"TAA"), Some(b'*'));
        assert_eq!(translate(b"CTG"), Some(b'L'));
        assert_eq!(translate(b"NTG"), None);
    }

    #[test]
    fn non_coding_positions_are_retained() {
        let table = GeneTable::new(vec![Gene {
            name: "orf1".to_string(),
            start: 10,
            end: 18,
            strand: Strand::Forward,
        }]);
        let reference = b"AAAAAAAAAATGCTGAAAAAAA".to_vec();
        assert!(table.is_retained(&event(3, b'A', b'T'), &reference));
    }

    #[test]
    fn synonymous_third_positions_pass() {
        // gene 1..6 on the forward strand: codons CTG CTA, both leucine
        let table = GeneTable::new(vec![Gene {
            name: "orf1".to_string(),
            start: 1,
            end: 6,
            strand: Strand::Forward,
        }]);
        let reference = b"CTGCTAAA".to_vec();
        // CTG -> CTA stays leucine
        assert!(table.is_retained(&event(3, b'G', b'A'), &reference));
        // CTG -> CGG is arginine
        assert!(!table.is_retained(&event(2, b'T', b'G'), &reference));
    }

    #[test]
    fn reverse_strand_codons_are_read_complemented() {
        // reverse gene over 1..6; genome CATCAT reads ATG ATG on the
        // reverse strand from position 6 down
        let table = GeneTable::new(vec![Gene {
            name: "rev".to_string(),
            start: 1,
            end: 6,
            strand: Strand::Reverse,
        }]);
        let reference = b"CATCAT".to_vec();
        // ATG -> ATA swaps methionine for isoleucine at the codon's third
        // slot (genome position 4 is the first codon's last base)
        assert!(!table.is_retained(&event(4, b'C', b'T'), &reference));
    }

    #[test]
    fn ancestral_base_overrides_the_reference_at_the_event_site() {
        // the working sequence may already carry the derived base from a
        // same-branch replay; the ancestral codon must use the event's own
        // ancestral base
        let table = GeneTable::new(vec![Gene {
            name: "orf1".to_string(),
            start: 1,
            end: 3,
            strand: Strand::Forward,
        }]);
        let reference = b"CTAAAA".to_vec();
        // event says G>A at position 3: ancestral codon CTG, derived CTA
        assert!(table.is_retained(&event(3, b'G', b'A'), &reference));
    }
}
