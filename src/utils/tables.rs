//! Small tabular inputs: taxon labels, plot colours, label groupings.

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Reads the taxon-to-label table: two columns with a header row,
/// comma or tab separated. Taxa may be a subset of the tree's tips.
/// Columns are positional so the header names are free-form.
pub fn read_label_table(path: &Path) -> Result<HashMap<String, String>, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read label table {}: {}", path.display(), e))?;
    let delimiter = if text.lines().next().map_or(false, |l| l.contains('\t')) {
        b'\t'
    } else {
        b','
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(format!(
            "Label table {} needs a taxon column and a label column",
            path.display()
        )
        .into());
    }
    let mut labels = HashMap::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| format!("Invalid label table row in {}: {}", path.display(), e))?;
        let taxon = record.get(0).unwrap_or_default().trim().to_string();
        let label = record.get(1).unwrap_or_default().trim().to_string();
        if taxon.is_empty() {
            continue;
        }
        labels.insert(taxon, label);
    }
    Ok(labels)
}

/// Writes the complete taxon-to-label table consumed by the engine's
/// mugration run.
pub fn write_label_table<W: Write>(
    labels: &HashMap<String, String>,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "name,label")?;
    let mut taxa: Vec<_> = labels.keys().collect();
    taxa.sort();
    for taxon in taxa {
        writeln!(out, "{},{}", taxon, labels[taxon])?;
    }
    Ok(())
}

/// Reads the sample-to-colour table: two tab-separated columns, no header.
pub fn read_colour_table(path: &Path) -> Result<HashMap<String, String>, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read colour table {}: {}", path.display(), e))?;
    let mut colours = HashMap::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (sample, colour) = trimmed.split_once('\t').ok_or_else(|| {
            format!(
                "Colour table {} row '{}' is not two tab-separated columns",
                path.display(),
                trimmed
            )
        })?;
        colours.insert(sample.to_string(), colour.trim().to_string());
    }
    Ok(colours)
}

/// Reads the spectra-combination file: one label group per row, labels
/// comma separated, no header.
pub fn read_combine_groups(path: &Path) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read combination file {}: {}", path.display(), e))?;
    let mut groups = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let group: Vec<String> = trimmed
            .split(',')
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();
        if !group.is_empty() {
            groups.push(group);
        }
    }
    Ok(groups)
}
