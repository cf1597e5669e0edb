//! Fasta input helpers.

use bio::io::fasta;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

/// Reads every record of a fasta file into an id-to-sequence map, bases
/// uppercased.
pub fn read_fasta_map(path: &Path) -> Result<HashMap<String, Vec<u8>>, Box<dyn Error>> {
    let reader = fasta::Reader::from_file(path)
        .map_err(|e| format!("Failed to open fasta {}: {}", path.display(), e))?;
    let mut sequences = HashMap::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| format!("Invalid fasta record in {}: {}", path.display(), e))?;
        sequences.insert(record.id().to_string(), record.seq().to_ascii_uppercase());
    }
    if sequences.is_empty() {
        return Err(format!("Fasta {} holds no sequences", path.display()).into());
    }
    Ok(sequences)
}

/// Reads the first record of a fasta file, for single-sequence references.
pub fn read_reference(path: &Path) -> Result<Vec<u8>, Box<dyn Error>> {
    let reader = fasta::Reader::from_file(path)
        .map_err(|e| format!("Failed to open reference {}: {}", path.display(), e))?;
    let record = reader
        .records()
        .next()
        .ok_or_else(|| format!("Reference {} holds no sequences", path.display()))?
        .map_err(|e| format!("Invalid fasta record in {}: {}", path.display(), e))?;
    Ok(record.seq().to_ascii_uppercase())
}
