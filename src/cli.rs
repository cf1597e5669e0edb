use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconstruct per-branch substitutions and build mutational spectra
    Extract(ExtractArgs),

    /// Compare spectra pairwise and embed them for clustering
    Cluster(ClusterArgs),

    /// Label a tree from an explicit root state and state-change list
    LabelTree(LabelTreeArgs),
}

#[derive(ClapArgs)]
pub struct ExtractArgs {
    /// Input fasta alignment
    #[arg(short = 'a', long = "alignment")]
    pub alignment: PathBuf,

    /// Input newick tree
    #[arg(short = 't', long = "tree")]
    pub tree: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "out-dir")]
    pub out_dir: PathBuf,

    /// Comma or tab separated file of taxa and their clade labels, with a
    /// header. Switches on mugration labelling; taxa not listed are
    /// labelled OTHER (or OTHER_A if OTHER is taken)
    #[arg(short = 'l', long = "labels")]
    pub labels: Option<PathBuf>,

    /// State-labelled companion tree produced by label-tree, topologically
    /// identical to the input tree
    #[arg(long = "labelled-tree", conflicts_with = "labels")]
    pub labelled_tree: Option<PathBuf>,

    /// Reference genome containing all sites, used to resolve mutation
    /// context; not required with --all-sites
    #[arg(short = 'r', long = "reference")]
    pub reference: Option<PathBuf>,

    /// Conversion file from alignment position to genome position; not
    /// required with --all-sites
    #[arg(short = 'c', long = "conversion")]
    pub conversion: Option<PathBuf>,

    /// File of label groups whose spectra are additionally summed after
    /// per-label calculation. No header; each row is a comma separated
    /// label set
    #[arg(short = 's', long = "spectra-to-combine")]
    pub spectra_to_combine: Option<PathBuf>,

    /// Gene coordinate table (name, start, end, strand with a header) for
    /// synonymous-only filtering
    #[arg(long = "genes")]
    pub genes: Option<PathBuf>,

    /// Keep only substitutions that are non-coding or synonymous
    #[arg(long = "synonymous", requires = "genes")]
    pub synonymous: bool,

    /// Additional options passed to treetime unchecked, together in quotes
    #[arg(long = "add-treetime-cmds")]
    pub add_treetime_cmds: Option<String>,

    /// Build an RNA (strand-specific) spectrum
    #[arg(long = "rna")]
    pub rna: bool,

    /// The alignment contains every genome site, so no reference or
    /// conversion file is needed
    #[arg(long = "all-sites")]
    pub all_sites: bool,

    /// Root state of the label, for the rare case where the mugration
    /// reconstruction leaves it ambiguous
    #[arg(long = "root-state")]
    pub root_state: Option<String>,

    /// Assign transition branches to their downstream category instead of
    /// excluding them
    #[arg(long = "include-all-branches")]
    pub include_all_branches: bool,
}

#[derive(ClapArgs)]
pub struct ClusterArgs {
    /// Spectrum files to cluster
    #[arg(short = 's', long = "spectra", num_args = 1.., required = true)]
    pub spectra: Vec<PathBuf>,

    /// Distance between pairs of spectra: cosine (default) or Bhattacharyya
    #[arg(short = 'm', long = "method", default_value = "cosine")]
    pub method: String,

    /// Optional two-column tab-separated file of spectrum paths and plot
    /// colours, no header
    #[arg(short = 'l', long = "colours")]
    pub colours: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'o', long = "out-dir")]
    pub out_dir: PathBuf,
}

#[derive(ClapArgs)]
pub struct LabelTreeArgs {
    /// Input newick tree
    #[arg(short = 't', long = "tree")]
    pub tree: PathBuf,

    /// State at the root of the tree
    #[arg(short = 'r', long = "root-state")]
    pub root_state: String,

    /// Branches along which the state changes, as branch____state (for
    /// example Node2____S); branch names follow the NodeK numbering
    #[arg(short = 's', long = "state-changes", num_args = 1..)]
    pub state_changes: Vec<String>,

    /// Output newick tree file
    #[arg(short = 'o', long = "outfile")]
    pub out_file: PathBuf,
}
