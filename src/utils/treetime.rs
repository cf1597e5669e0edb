//! Invocation of the external ancestral reconstruction engine. Both runs
//! are blocking subprocesses; a failure is fatal for the whole pipeline
//! and is never retried, since nothing about the engine's internal state
//! can be validated from here.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

pub fn check_treetime() -> Result<()> {
    Command::new("treetime")
        .arg("--version")
        .output()
        .context("treetime not found. Please install treetime (https://github.com/neherlab/treetime) and ensure it's in your PATH")
        .map(|_| ())
}

/// Joint ancestral sequence reconstruction. Writes
/// `ancestral_sequences.fasta` and `annotated_tree.nexus` into `out_dir`.
/// `extra_args` are passed through unchecked.
pub fn run_ancestral(
    alignment: &Path,
    tree: &Path,
    out_dir: &Path,
    extra_args: Option<&str>,
) -> Result<()> {
    let mut command = Command::new("treetime");
    command
        .arg("ancestral")
        .arg("--aln")
        .arg(alignment)
        .arg("--tree")
        .arg(tree)
        .arg("--outdir")
        .arg(out_dir);
    if let Some(extra) = extra_args {
        for arg in extra.split_whitespace() {
            command.arg(arg);
        }
    }
    let status = command
        .status()
        .context("Failed to launch treetime ancestral reconstruction")?;
    if !status.success() {
        bail!("treetime ancestral reconstruction failed with {}", status);
    }
    Ok(())
}

/// Discrete-trait (mugration) reconstruction of the `label` attribute over
/// the tree, with per-node confidence output.
pub fn run_mugration(tree: &Path, states: &Path, out_dir: &Path) -> Result<()> {
    let status = Command::new("treetime")
        .arg("mugration")
        .arg("--tree")
        .arg(tree)
        .arg("--states")
        .arg(states)
        .arg("--attribute")
        .arg("label")
        .arg("--confidence")
        .arg("--outdir")
        .arg(out_dir)
        .status()
        .context("Failed to launch treetime mugration")?;
    if !status.success() {
        bail!("treetime mugration failed with {}", status);
    }
    Ok(())
}
