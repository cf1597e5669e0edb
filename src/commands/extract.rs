use crate::cli::ExtractArgs;
use crate::labelling::{self, MugrationReconstruction};
use crate::phylo::{newick, nexus};
use crate::spectrum::counts::combine_spectra;
use crate::spectrum::synonymy::{GeneTable, SynonymyFilter};
use crate::spectrum::{self, extract, Alphabet, MutationEvent};
use crate::utils::translate::PositionTranslation;
use crate::utils::{sequences, tables, treetime};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

pub fn run(args: ExtractArgs) -> Result<(), Box<dyn Error>> {
    if !args.all_sites && (args.reference.is_none() || args.conversion.is_none()) {
        return Err(
            "Mutation context needs genome coordinates: supply --reference and --conversion, \
             or --all-sites if the alignment covers every site"
                .into(),
        );
    }
    treetime::check_treetime()?;

    fs::create_dir_all(&args.out_dir)?;

    let mut rejected_log = BufWriter::new(File::create(
        args.out_dir.join("mutations_not_included.csv"),
    )?);
    writeln!(rejected_log, "{}", spectrum::REJECTED_HEADER)?;
    let mut accepted_log = BufWriter::new(File::create(
        args.out_dir.join("all_included_mutations.csv"),
    )?);
    writeln!(accepted_log, "{}", spectrum::ACCEPTED_HEADER)?;

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );

    println!("Running ancestral reconstruction to identify mutations");
    treetime::run_ancestral(
        &args.alignment,
        &args.tree,
        &args.out_dir,
        args.add_treetime_cmds.as_deref(),
    )?;

    progress.set_message("Reading reconstruction output...");
    let annotated_tree_path = args.out_dir.join("annotated_tree.nexus");
    let alignment = sequences::read_fasta_map(&args.out_dir.join("ancestral_sequences.fasta"))?;
    let mut tree = nexus::read_file(&annotated_tree_path)?;
    tree.assign_node_names()?;

    progress.set_message("Labelling branches...");
    let categories = if let Some(labels_path) = &args.labels {
        let table = tables::read_label_table(labels_path)?;
        let all_labels = labelling::fill_unlabelled_taxa(&tree, table);

        let states_path = args.out_dir.join("all_taxon_labels.csv");
        let mut states_out = BufWriter::new(File::create(&states_path)?);
        tables::write_label_table(&all_labels, &mut states_out)?;
        states_out.flush()?;

        progress.set_message("Reconstructing label states across the tree...");
        let mugration_dir = args.out_dir.join("mugration_out");
        treetime::run_mugration(&annotated_tree_path, &states_path, &mugration_dir)?;

        let mugration_tree = nexus::read_file(&mugration_dir.join("annotated_tree.nexus"))?;
        let confidence_text = fs::read_to_string(mugration_dir.join("confidence.csv"))
            .map_err(|e| format!("Failed to read mugration confidence table: {}", e))?;
        let (states, confidence) = labelling::parse_confidence(&confidence_text)?;
        let gtr_text = fs::read_to_string(mugration_dir.join("GTR.txt"))
            .map_err(|e| format!("Failed to read mugration model report: {}", e))?;
        let mugration = MugrationReconstruction {
            tree: mugration_tree,
            states,
            confidence,
            code_map: labelling::parse_character_mapping(&gtr_text),
        };
        labelling::label_branches_mugration(&mut tree, &mugration, args.root_state.as_deref())?
    } else if let Some(labelled_tree_path) = &args.labelled_tree {
        let text = fs::read_to_string(labelled_tree_path).map_err(|e| {
            format!(
                "Failed to read labelled tree {}: {}",
                labelled_tree_path.display(),
                e
            )
        })?;
        let companion = newick::parse(&text)?;
        labelling::label_from_companion(&mut tree, &companion)?
    } else {
        labelling::label_all_branches(&mut tree)
    };

    let alphabet = if args.rna {
        Alphabet::rna()
    } else {
        Alphabet::dna()
    };

    let alignment_length = alignment
        .values()
        .next()
        .map(|seq| seq.len())
        .unwrap_or_default();
    let translation = match (&args.conversion, args.all_sites) {
        (_, true) => PositionTranslation::all_sites(alignment_length),
        (Some(path), false) => PositionTranslation::from_file(path)?,
        (None, false) => unreachable!("validated above"),
    };

    let root_name = tree
        .node(tree.root())
        .name
        .clone()
        .ok_or("Reconstruction tree root has no name")?;
    let reference = match (&args.reference, args.all_sites) {
        (Some(path), false) => sequences::read_reference(path)?,
        _ => alignment
            .get(&root_name)
            .cloned()
            .ok_or_else(|| format!("No reconstructed sequence for root node '{}'", root_name))?,
    };

    progress.set_message("Extracting branch mutations...");
    let mut branch_events: HashMap<usize, Vec<MutationEvent>> = HashMap::new();
    for idx in tree.preorder() {
        if idx == tree.root() {
            continue;
        }
        if let Some(comment) = tree.node(idx).comment.clone() {
            let events = extract::parse_branch_mutations(&comment, &translation)?;
            if !events.is_empty() {
                branch_events.insert(idx, events);
            }
        }
    }

    let gene_table = match (&args.genes, args.synonymous) {
        (Some(path), true) => Some(GeneTable::from_file(path)?),
        _ => None,
    };

    progress.set_message("Building spectra...");
    let spectra = spectrum::accumulate_spectra(
        &tree,
        branch_events,
        reference,
        &alphabet,
        &categories,
        args.include_all_branches,
        gene_table.as_ref().map(|table| table as &dyn SynonymyFilter),
        &mut rejected_log,
        &mut accepted_log,
    )?;

    for (label, counts) in &spectra {
        counts.write_to_file(
            &alphabet,
            &args
                .out_dir
                .join(format!("mutational_spectrum_label_{}.csv", label)),
        )?;
        counts.write_type_counts_to_file(
            &alphabet,
            &args
                .out_dir
                .join(format!("mutation_types_label_{}.csv", label)),
        )?;
    }

    if let Some(combine_path) = &args.spectra_to_combine {
        let groups = tables::read_combine_groups(combine_path)?;
        for (name, combined) in combine_spectra(&spectra, &groups, &alphabet)? {
            combined.write_to_file(
                &alphabet,
                &args
                    .out_dir
                    .join(format!("combined_mutational_spectrum_{}.csv", name)),
            )?;
        }
    }

    rejected_log.flush()?;
    accepted_log.flush()?;
    progress.finish_with_message("Spectrum extraction complete!");
    println!("Spectra written for {} branch categories", categories.len());
    Ok(())
}
