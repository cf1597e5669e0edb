use crate::cli::ClusterArgs;
use crate::cluster::mds::{classical_mds, embedding_bounds};
use crate::cluster::{colour_for, distance_matrix, DistanceMethod, SampleSpectrum};
use crate::utils::tables;
use nalgebra::DMatrix;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn run(args: ClusterArgs) -> Result<(), Box<dyn Error>> {
    let method: DistanceMethod = args.method.parse()?;
    if args.spectra.len() < 2 {
        return Err("Clustering needs at least two spectra, supplied with --spectra".into());
    }

    fs::create_dir_all(&args.out_dir)?;

    let spectra = args
        .spectra
        .iter()
        .map(|path| SampleSpectrum::from_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    let colours = args
        .colours
        .as_deref()
        .map(tables::read_colour_table)
        .transpose()?;

    let distances = distance_matrix(&spectra, method)?;

    write_matrix(
        &args.out_dir.join("sample_distances.csv"),
        &spectra,
        &distances,
        |d| d,
    )?;
    if method == DistanceMethod::Cosine {
        write_matrix(
            &args.out_dir.join("cosine_similarity.csv"),
            &spectra,
            &distances,
            |d| 1.0 - d,
        )?;
    }

    let coordinates = classical_mds(&distances, 2)?;

    let mut points_out = BufWriter::new(File::create(args.out_dir.join("mds_coordinates.txt"))?);
    writeln!(points_out, "Sample\tx_coordinate\ty_coordinate")?;
    for (row, spectrum) in spectra.iter().enumerate() {
        writeln!(
            points_out,
            "{}\t{}\t{}",
            spectrum.name,
            coordinates[(row, 0)],
            coordinates[(row, 1)]
        )?;
    }
    points_out.flush()?;

    // plot-ready data for the external renderer: coordinates, per-sample
    // colour and the shared axis bounds
    let (low, high) = embedding_bounds(&coordinates);
    let mut plot_out = BufWriter::new(File::create(args.out_dir.join("mds_plot_data.tsv"))?);
    writeln!(plot_out, "# axis bounds: {} {}", low, high)?;
    writeln!(plot_out, "Sample\tx_coordinate\ty_coordinate\tcolour")?;
    for (row, spectrum) in spectra.iter().enumerate() {
        writeln!(
            plot_out,
            "{}\t{}\t{}\t{}",
            spectrum.name,
            coordinates[(row, 0)],
            coordinates[(row, 1)],
            colour_for(colours.as_ref(), &spectrum.name)
        )?;
    }
    plot_out.flush()?;

    println!(
        "Clustered {} spectra; outputs in {}",
        spectra.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn write_matrix<F: Fn(f64) -> f64>(
    path: &Path,
    spectra: &[SampleSpectrum],
    distances: &DMatrix<f64>,
    transform: F,
) -> Result<(), Box<dyn Error>> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "Sample")?;
    for spectrum in spectra {
        write!(out, ",{}", spectrum.name)?;
    }
    writeln!(out)?;
    for (row, spectrum) in spectra.iter().enumerate() {
        write!(out, "{}", spectrum.name)?;
        for column in 0..spectra.len() {
            write!(out, ",{}", transform(distances[(row, column)]))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
