use crate::cli::LabelTreeArgs;
use crate::labelling;
use crate::phylo::newick;
use std::error::Error;
use std::fs;

pub fn run(args: LabelTreeArgs) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(&args.tree)
        .map_err(|e| format!("Failed to read tree {}: {}", args.tree.display(), e))?;
    let mut tree = newick::parse(&text)?;
    tree.assign_node_names()?;

    let changes = labelling::parse_state_changes(&args.state_changes)?;
    labelling::propagate_states(&mut tree, &args.root_state, &changes);

    let mut labelled = labelling::state_labelled_newick(&tree);
    labelled.push('\n');
    fs::write(&args.out_file, labelled)
        .map_err(|e| format!("Failed to write {}: {}", args.out_file.display(), e))?;
    Ok(())
}
