//! Pairwise comparison of mutational spectra: statistical distances and a
//! low-dimensional embedding for clustering.

pub mod mds;

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use nalgebra::DMatrix;

/// Distance between two spectra. Anything outside this list is a
/// configuration error before any computation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMethod {
    Cosine,
    Bhattacharyya,
}

impl FromStr for DistanceMethod {
    type Err = Box<dyn Error>;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "cosine" => Ok(DistanceMethod::Cosine),
            "Bhattacharyya" => Ok(DistanceMethod::Bhattacharyya),
            _ => Err(
                "Distance method unknown: choose from cosine (default) or Bhattacharyya".into(),
            ),
        }
    }
}

/// A spectrum loaded for comparison: counts normalized to proportions,
/// keyed by the substitution strings of its source file.
#[derive(Debug, Clone)]
pub struct SampleSpectrum {
    pub name: String,
    keys: Vec<String>,
    proportions: HashMap<String, f64>,
}

impl SampleSpectrum {
    pub fn from_counts(name: &str, counts: Vec<(String, f64)>) -> Self {
        let total: f64 = counts.iter().map(|(_, c)| c).sum();
        let mut keys = Vec::with_capacity(counts.len());
        let mut proportions = HashMap::with_capacity(counts.len());
        for (key, count) in counts {
            let proportion = if total > 0.0 { count / total } else { 0.0 };
            keys.push(key.clone());
            proportions.insert(key, proportion);
        }
        SampleSpectrum {
            name: name.to_string(),
            keys,
            proportions,
        }
    }

    /// Reads a `Substitution,Number_of_mutations` spectrum file.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read spectrum {}: {}", path.display(), e))?;
        let mut counts = Vec::new();
        for (line_number, line) in text.lines().enumerate().skip(1) {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (key, count) = trimmed.rsplit_once(',').ok_or_else(|| {
                format!(
                    "Spectrum {} line {} is not 'Substitution,count'",
                    path.display(),
                    line_number + 1
                )
            })?;
            let count: f64 = count.trim().parse().map_err(|_| {
                format!(
                    "Spectrum {} line {} has a non-numeric count '{}'",
                    path.display(),
                    line_number + 1,
                    count
                )
            })?;
            counts.push((key.to_string(), count));
        }
        if counts.is_empty() {
            return Err(format!("Spectrum {} holds no categories", path.display()).into());
        }
        Ok(SampleSpectrum::from_counts(
            &path.display().to_string(),
            counts,
        ))
    }

    fn proportion(&self, key: &str) -> Option<f64> {
        self.proportions.get(key).copied()
    }
}

/// Distance between two spectra sharing one category set.
pub fn spectrum_distance(
    a: &SampleSpectrum,
    b: &SampleSpectrum,
    method: DistanceMethod,
) -> Result<f64, Box<dyn Error>> {
    match method {
        DistanceMethod::Cosine => {
            let mut dot = 0.0;
            let mut norm_a = 0.0;
            let mut norm_b = 0.0;
            for key in &a.keys {
                let pa = a.proportion(key).expect("own key is present");
                let pb = b.proportion(key).ok_or_else(|| missing_key(b, key))?;
                dot += pa * pb;
                norm_a += pa * pa;
                norm_b += pb * pb;
            }
            Ok(1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()))
        }
        DistanceMethod::Bhattacharyya => {
            let mut coefficient = 0.0;
            for key in &a.keys {
                let pa = a.proportion(key).expect("own key is present");
                let pb = b.proportion(key).ok_or_else(|| missing_key(b, key))?;
                coefficient += (pa * pb).sqrt();
            }
            // a zero coefficient legitimately produces infinity
            Ok(-coefficient.log2())
        }
    }
}

fn missing_key(spectrum: &SampleSpectrum, key: &str) -> Box<dyn Error> {
    format!(
        "Spectrum {} does not contain category '{}'; spectra must share one category set",
        spectrum.name, key
    )
    .into()
}

/// Symmetric pairwise distance matrix with a zero diagonal.
pub fn distance_matrix(
    spectra: &[SampleSpectrum],
    method: DistanceMethod,
) -> Result<DMatrix<f64>, Box<dyn Error>> {
    let n = spectra.len();
    let mut distances = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = spectrum_distance(&spectra[i], &spectra[j], method)?;
            distances[(i, j)] = d;
            distances[(j, i)] = d;
        }
    }
    Ok(distances)
}

/// Per-sample plot colours from the optional two-column tab-separated
/// table; samples without an entry (or with no table at all) fall back to
/// one neutral colour.
pub fn colour_for<'a>(colours: Option<&'a HashMap<String, String>>, sample: &str) -> &'a str {
    colours
        .and_then(|map| map.get(sample))
        .map(String::as_str)
        .unwrap_or("blue")
}
