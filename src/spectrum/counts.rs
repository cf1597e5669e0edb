//! Spectrum counters and their output files.

use crate::spectrum::alphabet::{Alphabet, SpectrumKey};
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Counts per canonical key. Created complete (every alphabet key at zero)
/// and only ever incremented during the traversal.
#[derive(Debug, Clone)]
pub struct Spectrum {
    counts: HashMap<SpectrumKey, u64>,
}

impl Spectrum {
    pub fn new(alphabet: &Alphabet) -> Self {
        let counts = alphabet.keys().iter().map(|&key| (key, 0)).collect();
        Spectrum { counts }
    }

    /// Increments the counter of an already canonical key.
    pub fn increment(&mut self, key: SpectrumKey) {
        let counter = self
            .counts
            .get_mut(&key)
            .expect("incremented key must belong to the spectrum alphabet");
        *counter += 1;
    }

    pub fn count(&self, key: &SpectrumKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Key-wise sum, used when combining the spectra of grouped labels.
    pub fn add(&mut self, other: &Spectrum) {
        for (key, count) in &other.counts {
            *self.counts.entry(*key).or_insert(0) += count;
        }
    }

    /// Collapses the spectrum to `from>to` substitution-type counts.
    pub fn type_counts(&self, alphabet: &Alphabet) -> Vec<(String, u64)> {
        let mut totals: Vec<(String, u64)> = alphabet
            .substitution_types()
            .into_iter()
            .map(|t| (t, 0))
            .collect();
        for key in alphabet.keys() {
            let t = key.substitution_type();
            let slot = totals
                .iter_mut()
                .find(|(name, _)| *name == t)
                .expect("type list covers every alphabet key");
            slot.1 += self.count(key);
        }
        totals
    }

    /// Writes the spectrum in the standard two-column layout, one row per
    /// alphabet key in enumeration order.
    pub fn write<W: Write>(&self, alphabet: &Alphabet, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Substitution,Number_of_mutations")?;
        for key in alphabet.keys() {
            writeln!(out, "{},{}", key, self.count(key))?;
        }
        Ok(())
    }

    pub fn write_to_file(&self, alphabet: &Alphabet, path: &Path) -> Result<(), Box<dyn Error>> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(alphabet, &mut writer)?;
        Ok(())
    }

    pub fn write_type_counts_to_file(
        &self,
        alphabet: &Alphabet,
        path: &Path,
    ) -> Result<(), Box<dyn Error>> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "Mutation_type,Number_of_mutations")?;
        for (mutation_type, count) in self.type_counts(alphabet) {
            writeln!(writer, "{},{}", mutation_type, count)?;
        }
        Ok(())
    }
}

/// Sums the spectra of each label group. Groups referencing labels without
/// a spectrum are a configuration error.
pub fn combine_spectra(
    spectra: &HashMap<String, Spectrum>,
    groups: &[Vec<String>],
    alphabet: &Alphabet,
) -> Result<Vec<(String, Spectrum)>, Box<dyn Error>> {
    let mut combined = Vec::with_capacity(groups.len());
    for group in groups {
        let mut sum = Spectrum::new(alphabet);
        for label in group {
            let spectrum = spectra.get(label).ok_or_else(|| {
                format!("Cannot combine spectra: no spectrum for label '{}'", label)
            })?;
            sum.add(spectrum);
        }
        combined.push((group.join("_"), sum));
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::alphabet::Alphabet;

    #[test]
    fn new_spectrum_is_complete_and_zero() {
        let alphabet = Alphabet::dna();
        let spectrum = Spectrum::new(&alphabet);
        assert_eq!(spectrum.total(), 0);
        let mut out = Vec::new();
        spectrum.write(&alphabet, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 97, "header plus 96 rows");
        assert!(text.starts_with("Substitution,Number_of_mutations\n"));
        assert!(text.contains("A[C>T]G,0"));
    }

    #[test]
    fn increments_are_visible_in_output() {
        let alphabet = Alphabet::dna();
        let mut spectrum = Spectrum::new(&alphabet);
        let key = SpectrumKey::new(b'A', b'C', b'T', b'G');
        spectrum.increment(key);
        spectrum.increment(key);
        assert_eq!(spectrum.count(&key), 2);
        assert_eq!(spectrum.total(), 2);
        let types = spectrum.type_counts(&alphabet);
        let c_to_t = types.iter().find(|(t, _)| t == "C>T").unwrap();
        assert_eq!(c_to_t.1, 2);
    }

    #[test]
    fn combining_sums_by_key() {
        let alphabet = Alphabet::dna();
        let mut a = Spectrum::new(&alphabet);
        let mut b = Spectrum::new(&alphabet);
        let key = SpectrumKey::new(b'T', b'T', b'G', b'C');
        a.increment(key);
        b.increment(key);
        let mut spectra = HashMap::new();
        spectra.insert("p1".to_string(), a);
        spectra.insert("p2".to_string(), b);
        let groups = vec![vec!["p1".to_string(), "p2".to_string()]];
        let combined = combine_spectra(&spectra, &groups, &alphabet).unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].0, "p1_p2");
        assert_eq!(combined[0].1.count(&key), 2);

        let missing = vec![vec!["p3".to_string()]];
        assert!(combine_spectra(&spectra, &missing, &alphabet).is_err());
    }
}
