//! Alignment-to-genome position translation.

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Maps 1-based alignment columns onto 1-based genome positions. Columns
/// falling in deletions have no entry. The mapping is required to be a
/// monotonic bijection over the columns it covers; anything else points at
/// a malformed conversion table and is rejected up front.
#[derive(Debug, Clone)]
pub struct PositionTranslation {
    map: HashMap<usize, usize>,
}

impl PositionTranslation {
    /// Identity translation for the all-sites mode, covering every column
    /// of an alignment of the given length.
    pub fn all_sites(alignment_length: usize) -> Self {
        let map = (1..=alignment_length).map(|p| (p, p)).collect();
        PositionTranslation { map }
    }

    /// Builds the translation from (alignment, genome) position pairs.
    pub fn from_pairs(pairs: Vec<(usize, usize)>) -> Result<Self, Box<dyn Error>> {
        let mut sorted = pairs;
        sorted.sort_by_key(|&(alignment, _)| alignment);
        for window in sorted.windows(2) {
            let (a1, g1) = window[0];
            let (a2, g2) = window[1];
            if a1 == a2 {
                return Err(format!(
                    "Conversion table lists alignment position {} twice",
                    a1
                )
                .into());
            }
            if g2 <= g1 {
                return Err(format!(
                    "Conversion table is not monotonic: alignment {} -> genome {} after alignment {} -> genome {}",
                    a2, g2, a1, g1
                )
                .into());
            }
        }
        Ok(PositionTranslation {
            map: sorted.into_iter().collect(),
        })
    }

    /// Reads a conversion file of whitespace- or comma-separated
    /// `alignment genome` integer pairs, 1-indexed.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read conversion file {}: {}", path.display(), e))?;
        let mut pairs = Vec::new();
        for (line_number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let fields: Vec<&str> = trimmed
                .split(|c: char| c == ',' || c == '\t' || c == ' ')
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() != 2 {
                return Err(format!(
                    "Conversion file line {} does not hold two positions: '{}'",
                    line_number + 1,
                    trimmed
                )
                .into());
            }
            let alignment: usize = fields[0]
                .parse()
                .map_err(|_| format!("Invalid alignment position '{}'", fields[0]))?;
            let genome: usize = fields[1]
                .parse()
                .map_err(|_| format!("Invalid genome position '{}'", fields[1]))?;
            pairs.push((alignment, genome));
        }
        PositionTranslation::from_pairs(pairs)
    }

    pub fn genome_position(&self, alignment_position: usize) -> Option<usize> {
        self.map.get(&alignment_position).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sites_is_identity() {
        let translation = PositionTranslation::all_sites(5);
        assert_eq!(translation.len(), 5);
        assert_eq!(translation.genome_position(1), Some(1));
        assert_eq!(translation.genome_position(5), Some(5));
        assert_eq!(translation.genome_position(6), None);
    }

    #[test]
    fn deleted_columns_have_no_entry() {
        let translation =
            PositionTranslation::from_pairs(vec![(1, 10), (2, 11), (4, 12)]).unwrap();
        assert_eq!(translation.genome_position(3), None);
        assert_eq!(translation.genome_position(4), Some(12));
    }

    #[test]
    fn non_monotonic_tables_are_rejected() {
        assert!(PositionTranslation::from_pairs(vec![(1, 10), (2, 9)]).is_err());
        assert!(PositionTranslation::from_pairs(vec![(1, 10), (1, 11)]).is_err());
    }
}
