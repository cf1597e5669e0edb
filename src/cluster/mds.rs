//! Classical (Torgerson) multidimensional scaling of a precomputed
//! distance matrix.

use nalgebra::{DMatrix, SymmetricEigen};
use std::error::Error;

/// Projects the samples of a symmetric distance matrix into
/// `dimensions`-dimensional coordinates: double-center the squared
/// distances and keep the leading eigenpairs. Axes whose eigenvalue is
/// negative (non-Euclidean residue of the distance) collapse to zero.
pub fn classical_mds(
    distances: &DMatrix<f64>,
    dimensions: usize,
) -> Result<DMatrix<f64>, Box<dyn Error>> {
    let n = distances.nrows();
    if distances.ncols() != n {
        return Err("Distance matrix must be square".into());
    }
    if n < 2 {
        return Err("Embedding needs at least two samples".into());
    }

    let squared = distances.map(|d| d * d);
    let centering = DMatrix::identity(n, n) - DMatrix::from_element(n, n, 1.0 / n as f64);
    let double_centered = -0.5 * &centering * squared * &centering;

    let eigen = SymmetricEigen::new(double_centered);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap()
    });

    let mut coordinates = DMatrix::zeros(n, dimensions);
    for (axis, &component) in order.iter().take(dimensions).enumerate() {
        let scale = eigen.eigenvalues[component].max(0.0).sqrt();
        for sample in 0..n {
            coordinates[(sample, axis)] = eigen.eigenvectors[(sample, component)] * scale;
        }
    }
    Ok(coordinates)
}

/// Shared axis bounds for plotting an embedding: the coordinate min/max
/// expanded on each side by the absolute 5th-percentile coordinate.
pub fn embedding_bounds(coordinates: &DMatrix<f64>) -> (f64, f64) {
    let values: Vec<f64> = coordinates.iter().copied().collect();
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let spread = quantile(&values, 0.05).abs();
    (min - spread, max + spread)
}

/// Linearly interpolated quantile over all values.
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = q * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let weight = rank - low as f64;
        sorted[low] * (1.0 - weight) + sorted[high] * weight
    }
}
