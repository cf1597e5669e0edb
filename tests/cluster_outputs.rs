use mutspec::cli::ClusterArgs;
use mutspec::commands::cluster;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// Drives the cluster command over small on-disk spectra and checks every
// output file it promises.

fn write_spectrum(dir: &TempDir, name: &str, counts: &[(&str, u64)]) -> PathBuf {
    let path = dir.path().join(name);
    let mut text = String::from("Substitution,Number_of_mutations\n");
    for (key, count) in counts {
        text.push_str(&format!("{},{}\n", key, count));
    }
    fs::write(&path, text).unwrap();
    path
}

fn spectrum_files(dir: &TempDir) -> Vec<PathBuf> {
    vec![
        write_spectrum(
            dir,
            "s1.csv",
            &[("A[C>T]G", 8), ("T[C>A]C", 2), ("A[T>G]A", 0)],
        ),
        write_spectrum(
            dir,
            "s2.csv",
            &[("A[C>T]G", 1), ("T[C>A]C", 1), ("A[T>G]A", 8)],
        ),
        write_spectrum(
            dir,
            "s3.csv",
            &[("A[C>T]G", 7), ("T[C>A]C", 3), ("A[T>G]A", 1)],
        ),
    ]
}

#[test]
fn cosine_run_writes_distances_similarity_and_embedding() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("out");
    let spectra = spectrum_files(&dir);

    cluster::run(ClusterArgs {
        spectra,
        method: "cosine".to_string(),
        colours: None,
        out_dir: out_dir.clone(),
    })
    .expect("cluster run succeeds");

    let distances = fs::read_to_string(out_dir.join("sample_distances.csv")).unwrap();
    let rows: Vec<&str> = distances.lines().collect();
    assert_eq!(rows.len(), 4, "header plus one row per sample");
    assert!(rows[0].starts_with("Sample,"));

    // parse the matrix back and check symmetry and the zero diagonal
    let mut matrix = Vec::new();
    for row in &rows[1..] {
        let values: Vec<f64> = row
            .split(',')
            .skip(1)
            .map(|v| v.parse().unwrap())
            .collect();
        matrix.push(values);
    }
    for i in 0..3 {
        assert_eq!(matrix[i][i], 0.0);
        for j in 0..3 {
            assert!((matrix[i][j] - matrix[j][i]).abs() < 1e-12);
        }
    }

    let similarity = fs::read_to_string(out_dir.join("cosine_similarity.csv")).unwrap();
    let first_row: Vec<&str> = similarity.lines().nth(1).unwrap().split(',').collect();
    let self_similarity: f64 = first_row[1].parse().unwrap();
    assert_eq!(self_similarity, 1.0, "similarity is 1 - distance");

    let coordinates = fs::read_to_string(out_dir.join("mds_coordinates.txt")).unwrap();
    let lines: Vec<&str> = coordinates.lines().collect();
    assert_eq!(lines[0], "Sample\tx_coordinate\ty_coordinate");
    assert_eq!(lines.len(), 4);
    for line in &lines[1..] {
        assert_eq!(line.split('\t').count(), 3);
    }
}

#[test]
fn bhattacharyya_run_skips_the_similarity_file() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("out");
    let spectra = spectrum_files(&dir);

    cluster::run(ClusterArgs {
        spectra,
        method: "Bhattacharyya".to_string(),
        colours: None,
        out_dir: out_dir.clone(),
    })
    .expect("cluster run succeeds");

    assert!(out_dir.join("sample_distances.csv").exists());
    assert!(!out_dir.join("cosine_similarity.csv").exists());
}

#[test]
fn unknown_method_fails_before_writing_anything() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("out");
    let spectra = spectrum_files(&dir);

    let err = cluster::run(ClusterArgs {
        spectra,
        method: "JS".to_string(),
        colours: None,
        out_dir: out_dir.clone(),
    })
    .unwrap_err();
    assert!(err.to_string().contains("Distance method unknown"));
    assert!(!out_dir.exists(), "no outputs before validation passes");
}

#[test]
fn colour_table_feeds_the_plot_data() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("out");
    let spectra = spectrum_files(&dir);
    let colour_path = dir.path().join("colours.tsv");
    fs::write(
        &colour_path,
        format!("{}\tred\n", spectra[0].display()),
    )
    .unwrap();

    cluster::run(ClusterArgs {
        spectra,
        method: "cosine".to_string(),
        colours: Some(colour_path),
        out_dir: out_dir.clone(),
    })
    .expect("cluster run succeeds");

    let plot_data = fs::read_to_string(out_dir.join("mds_plot_data.tsv")).unwrap();
    assert!(plot_data.starts_with("# axis bounds: "));
    let rows: Vec<&str> = plot_data.lines().skip(2).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].ends_with("\tred"), "listed sample keeps its colour");
    assert!(rows[1].ends_with("\tblue"), "unlisted samples default to blue");
    assert!(rows[2].ends_with("\tblue"));
}
