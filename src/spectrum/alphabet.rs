//! Spectrum alphabets and strand canonicalization.
//!
//! The DNA alphabet enumerates the 96 strand-collapsed trinucleotide
//! substitution classes (pyrimidine reference convention). The RNA
//! alphabet is strand specific, so all four reference bases appear and no
//! collapsing happens: 4 references x 3 alternates x 16 flank pairs.

use std::fmt;

pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

pub fn is_nucleotide(base: u8) -> bool {
    NUCLEOTIDES.contains(&base)
}

/// Watson-Crick complement. Only defined for A, C, G and T; the extraction
/// filters guarantee nothing else reaches canonicalization.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => panic!("complement undefined for '{}'", other as char),
    }
}

/// One contextual substitution class: reference base `from` mutating to
/// `to` with immediate `up`stream and `down`stream neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpectrumKey {
    pub up: u8,
    pub from: u8,
    pub to: u8,
    pub down: u8,
}

impl SpectrumKey {
    pub fn new(up: u8, from: u8, to: u8, down: u8) -> Self {
        SpectrumKey { up, from, to, down }
    }

    /// The same physical event read off the opposite strand.
    pub fn reverse_complement(&self) -> Self {
        SpectrumKey {
            up: complement(self.down),
            from: complement(self.from),
            to: complement(self.to),
            down: complement(self.up),
        }
    }

    /// Substitution type with the flanks dropped, e.g. `C>T`.
    pub fn substitution_type(&self) -> String {
        format!("{}>{}", self.from as char, self.to as char)
    }
}

impl fmt::Display for SpectrumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}>{}]{}",
            self.up as char, self.from as char, self.to as char, self.down as char
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphabetKind {
    Dna,
    Rna,
}

/// The complete, ordered key set of a spectrum. Every spectrum is
/// pre-initialized over all keys so output files always carry the full
/// category list.
#[derive(Debug, Clone)]
pub struct Alphabet {
    kind: AlphabetKind,
    keys: Vec<SpectrumKey>,
}

impl Alphabet {
    /// 96 strand-collapsed DNA classes: reference restricted to C and T.
    pub fn dna() -> Self {
        let mut keys = Vec::with_capacity(96);
        for &from in &[b'C', b'T'] {
            for &to in NUCLEOTIDES.iter().filter(|&&b| b != from) {
                for &up in &NUCLEOTIDES {
                    for &down in &NUCLEOTIDES {
                        keys.push(SpectrumKey::new(up, from, to, down));
                    }
                }
            }
        }
        Alphabet {
            kind: AlphabetKind::Dna,
            keys,
        }
    }

    /// Strand-specific RNA classes over all four reference bases.
    pub fn rna() -> Self {
        let mut keys = Vec::with_capacity(192);
        for &from in &NUCLEOTIDES {
            for &to in NUCLEOTIDES.iter().filter(|&&b| b != from) {
                for &up in &NUCLEOTIDES {
                    for &down in &NUCLEOTIDES {
                        keys.push(SpectrumKey::new(up, from, to, down));
                    }
                }
            }
        }
        Alphabet {
            kind: AlphabetKind::Rna,
            keys,
        }
    }

    pub fn kind(&self) -> AlphabetKind {
        self.kind
    }

    pub fn keys(&self) -> &[SpectrumKey] {
        &self.keys
    }

    pub fn contains(&self, key: &SpectrumKey) -> bool {
        match self.kind {
            AlphabetKind::Dna => key.from == b'C' || key.from == b'T',
            AlphabetKind::Rna => true,
        }
    }

    /// Maps an observed substitution onto its canonical key: the key itself
    /// when it is part of the alphabet, otherwise its reverse complement.
    /// Exactly one of the two is ever a member, so the same physical class
    /// is only counted under one key.
    pub fn canonicalize(&self, key: SpectrumKey) -> SpectrumKey {
        if self.contains(&key) {
            key
        } else {
            key.reverse_complement()
        }
    }

    /// The `from>to` classes the spectrum collapses to for the
    /// mutation-type summary: 6 for DNA, 12 for RNA, in key order.
    pub fn substitution_types(&self) -> Vec<String> {
        let mut types = Vec::new();
        for key in &self.keys {
            let t = key.substitution_type();
            if !types.contains(&t) {
                types.push(t);
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dna_alphabet_has_96_pyrimidine_keys() {
        let alphabet = Alphabet::dna();
        assert_eq!(alphabet.keys().len(), 96);
        for key in alphabet.keys() {
            assert!(key.from == b'C' || key.from == b'T');
            assert_ne!(key.from, key.to);
        }
        assert_eq!(alphabet.substitution_types().len(), 6);
    }

    #[test]
    fn rna_alphabet_is_strand_specific() {
        let alphabet = Alphabet::rna();
        assert_eq!(alphabet.keys().len(), 192);
        assert_eq!(alphabet.substitution_types().len(), 12);
        // every observable key is already canonical
        let key = SpectrumKey::new(b'A', b'G', b'T', b'C');
        assert_eq!(alphabet.canonicalize(key), key);
    }

    #[test]
    fn canonicalization_collapses_strands() {
        let alphabet = Alphabet::dna();
        // G>A reads as C>T on the other strand
        let observed = SpectrumKey::new(b'A', b'G', b'A', b'C');
        let canonical = alphabet.canonicalize(observed);
        assert_eq!(canonical, SpectrumKey::new(b'G', b'C', b'T', b'T'));
        assert!(alphabet.contains(&canonical));
    }

    #[test]
    fn canonicalization_is_idempotent_under_reverse_complement() {
        for alphabet in [Alphabet::dna(), Alphabet::rna()] {
            for &from in &NUCLEOTIDES {
                for &to in NUCLEOTIDES.iter().filter(|&&b| b != from) {
                    for &up in &NUCLEOTIDES {
                        for &down in &NUCLEOTIDES {
                            let key = SpectrumKey::new(up, from, to, down);
                            let canonical = alphabet.canonicalize(key);
                            if alphabet.kind() == AlphabetKind::Dna {
                                assert_eq!(
                                    canonical,
                                    alphabet.canonicalize(key.reverse_complement()),
                                    "canonical key must not depend on observed strand"
                                );
                            }
                            assert!(alphabet.contains(&canonical));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn exactly_one_of_key_and_complement_is_canonical_for_dna() {
        let alphabet = Alphabet::dna();
        for key in alphabet.keys() {
            assert!(!alphabet.contains(&key.reverse_complement()));
        }
    }

    #[test]
    #[should_panic(expected = "complement undefined")]
    fn complement_rejects_ambiguity_codes() {
        complement(b'N');
    }

    #[test]
    fn key_formats_like_a_spectrum_row() {
        let key = SpectrumKey::new(b'A', b'C', b'T', b'G');
        assert_eq!(key.to_string(), "A[C>T]G");
    }
}
