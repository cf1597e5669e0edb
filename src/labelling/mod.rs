//! Branch labelling: assigns every branch of the tree to a category whose
//! spectrum it will contribute to.
//!
//! Three mutually exclusive strategies are supported, selected by which
//! inputs the caller supplies: a single uniform category, categories copied
//! from a companion state-labelled tree, or categories reconstructed by the
//! engine's discrete-trait (mugration) run. A branch's category is the
//! state at its child node; branches whose two ends disagree are
//! transition branches and carry no category unless explicitly included.

use crate::phylo::{newick, Tree};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;

/// Separator between a taxon id and its state in state-labelled trees.
pub const STATE_SEPARATOR: &str = "____";

/// Default category for taxa missing from the label table.
pub const UNLABELLED: &str = "OTHER";

/// Assigns every node the same fixed state so that all branches fall into
/// one category.
pub fn label_all_branches(tree: &mut Tree) -> Vec<String> {
    for idx in tree.preorder() {
        tree.node_mut(idx).state = Some("A".to_string());
    }
    vec!["A".to_string()]
}

/// Copies states from a companion tree produced by the `label-tree`
/// subcommand. The companion encodes states in its node labels: internal
/// nodes are named by their state, tips as `taxon____state`. Matching is by
/// stable node name; any disagreement between the two node sets is fatal.
pub fn label_from_companion(
    tree: &mut Tree,
    companion: &Tree,
) -> Result<Vec<String>, Box<dyn Error>> {
    tree.assign_node_names()?;

    // The companion's tips carry mangled names, so its node names are
    // derived here rather than via assign_node_names.
    let mut companion_states: HashMap<String, String> = HashMap::new();
    let mut node_iterator = 1usize;
    for idx in companion.preorder() {
        let clade = companion.node(idx);
        if companion.is_tip(idx) {
            let raw = clade
                .name
                .as_deref()
                .ok_or("Labelled tree has an unnamed tip")?;
            let (taxon, state) = raw.split_once(STATE_SEPARATOR).ok_or_else(|| {
                format!(
                    "Labelled tree tip '{}' does not encode a state (expected taxon{}state)",
                    raw, STATE_SEPARATOR
                )
            })?;
            companion_states.insert(taxon.to_string(), state.to_string());
        } else {
            let state = clade
                .name
                .as_deref()
                .ok_or_else(|| format!("Labelled tree node Node{} has no state", node_iterator))?;
            companion_states.insert(format!("Node{}", node_iterator), state.to_string());
            node_iterator += 1;
        }
    }

    let tree_names: BTreeSet<String> = tree
        .preorder()
        .iter()
        .map(|&idx| tree.node(idx).node_name.clone())
        .collect();
    let companion_names: BTreeSet<String> = companion_states.keys().cloned().collect();
    if tree_names != companion_names {
        return Err(format!(
            "Structure mismatch between tree and labelled tree: {} nodes vs {}",
            tree_names.len(),
            companion_names.len()
        )
        .into());
    }

    let mut labels = BTreeSet::new();
    for idx in tree.preorder() {
        let state = companion_states[&tree.node(idx).node_name].clone();
        labels.insert(state.clone());
        tree.node_mut(idx).state = Some(state);
    }
    Ok(labels.into_iter().collect())
}

/// The engine's discrete-trait reconstruction, parsed from its output
/// directory: the annotated tree whose node comments carry the inferred
/// character code, the per-node confidence table, and the character-to-state
/// mapping printed with the fitted model.
pub struct MugrationReconstruction {
    pub tree: Tree,
    pub states: Vec<String>,
    pub confidence: HashMap<String, Vec<f64>>,
    pub code_map: HashMap<String, String>,
}

impl MugrationReconstruction {
    /// Resolves the state at the root of the tree. A unique
    /// maximum-confidence state wins; a tie is only resolvable through an
    /// explicit override, which also takes precedence when supplied.
    pub fn root_state(&self, override_state: Option<&str>) -> Result<String, Box<dyn Error>> {
        if let Some(state) = override_state {
            return Ok(state.to_string());
        }
        let root_name = self
            .tree
            .node(self.tree.root())
            .name
            .as_deref()
            .ok_or("Mugration tree root has no name")?;
        let probs = self.confidence.get(root_name).ok_or_else(|| {
            format!("No confidence entry for root node '{}'", root_name)
        })?;
        let best = probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let winners: Vec<&String> = self
            .states
            .iter()
            .zip(probs.iter())
            .filter(|(_, &p)| p == best)
            .map(|(s, _)| s)
            .collect();
        match winners.as_slice() {
            [single] => Ok((*single).to_string()),
            _ => Err("Root state is ambiguous: multiple states are equally likely. \
                 Rerun with an explicit root state"
                .into()),
        }
    }

    /// Inferred state of a node, decoded through the character mapping.
    fn node_state(&self, idx: usize) -> Option<String> {
        let comment = self.tree.node(idx).comment.as_deref()?;
        let code = attribute_value(comment)?;
        Some(
            self.code_map
                .get(&code)
                .cloned()
                .unwrap_or(code),
        )
    }
}

/// Extracts the value of the first `key="value"` attribute of an engine
/// annotation such as `[&division="lineage_2"]`.
fn attribute_value(comment: &str) -> Option<String> {
    let start = comment.find("=\"")? + 2;
    let end = comment[start..].find('"')? + start;
    Some(comment[start..end].to_string())
}

/// Parses the engine's per-node confidence table (`#name,stateA,stateB,...`).
pub fn parse_confidence(text: &str) -> Result<(Vec<String>, HashMap<String, Vec<f64>>), Box<dyn Error>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or("Confidence table is empty")?;
    let states: Vec<String> = header
        .trim_start_matches('#')
        .split(',')
        .skip(1)
        .map(|s| s.trim().to_string())
        .collect();
    if states.is_empty() {
        return Err("Confidence table header lists no states".into());
    }
    let mut rows = HashMap::new();
    for line in lines {
        let mut fields = line.split(',');
        let name = fields
            .next()
            .ok_or("Confidence table row missing node name")?
            .trim()
            .to_string();
        let probs: Vec<f64> = fields
            .map(|f| f.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Invalid confidence value for '{}': {}", name, e))?;
        if probs.len() != states.len() {
            return Err(format!(
                "Confidence row for '{}' has {} values but {} states",
                name,
                probs.len(),
                states.len()
            )
            .into());
        }
        rows.insert(name, probs);
    }
    Ok((states, rows))
}

/// Parses the character-to-state mapping from the engine's fitted model
/// report. Lines of the form `A: state_name` following the mapping header
/// are collected until the first blank line.
pub fn parse_character_mapping(text: &str) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    let mut in_block = false;
    for line in text.lines() {
        if line.contains("Character to attribute mapping") {
            in_block = true;
            continue;
        }
        if in_block {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some((code, state)) = trimmed.split_once(':') {
                mapping.insert(code.trim().to_string(), state.trim().to_string());
            }
        }
    }
    mapping
}

/// Labels the tree with the mugration reconstruction's states. Internal
/// nodes take their inferred state, the root takes the resolved root state,
/// and every node missing an annotation inherits from its parent.
pub fn label_branches_mugration(
    tree: &mut Tree,
    mugration: &MugrationReconstruction,
    root_override: Option<&str>,
) -> Result<Vec<String>, Box<dyn Error>> {
    tree.assign_node_names()?;

    let mut mugration_tree = mugration.tree.clone();
    mugration_tree.assign_node_names()?;

    let tree_names: BTreeSet<String> = tree
        .preorder()
        .iter()
        .map(|&idx| tree.node(idx).node_name.clone())
        .collect();
    let mugration_names: BTreeSet<String> = mugration_tree
        .preorder()
        .iter()
        .map(|&idx| mugration_tree.node(idx).node_name.clone())
        .collect();
    if tree_names != mugration_names {
        return Err(format!(
            "Structure mismatch between tree and mugration tree: {} nodes vs {}",
            tree_names.len(),
            mugration_names.len()
        )
        .into());
    }

    let mut states_by_name: HashMap<String, String> = HashMap::new();
    for idx in mugration_tree.preorder() {
        if let Some(state) = mugration.node_state(idx) {
            states_by_name.insert(mugration_tree.node(idx).node_name.clone(), state);
        }
    }

    let root_state = mugration.root_state(root_override)?;
    let mut labels = BTreeSet::new();
    labels.insert(root_state.clone());
    tree.node_mut(tree.root()).state = Some(root_state);

    for idx in tree.preorder() {
        if idx == tree.root() {
            continue;
        }
        let state = match states_by_name.get(&tree.node(idx).node_name) {
            Some(state) => state.clone(),
            None => tree
                .node(tree.parent(idx).expect("non-root node has a parent"))
                .state
                .clone()
                .ok_or("Parent state missing during mugration labelling")?,
        };
        labels.insert(state.clone());
        tree.node_mut(idx).state = Some(state);
    }
    Ok(labels.into_iter().collect())
}

/// Category of the branch ending at `idx`: the child-node state, or `None`
/// for the root and for transition branches (unless they are explicitly
/// assigned to their downstream category).
pub fn branch_category<'a>(
    tree: &'a Tree,
    idx: usize,
    include_transition_branches: bool,
) -> Option<&'a str> {
    let parent = tree.parent(idx)?;
    let child_state = tree.node(idx).state.as_deref()?;
    let parent_state = tree.node(parent).state.as_deref()?;
    if child_state == parent_state || include_transition_branches {
        Some(child_state)
    } else {
        None
    }
}

/// Parses `Node2____S`-style change specifications into a node-name to
/// state dictionary.
pub fn parse_state_changes(args: &[String]) -> Result<HashMap<String, String>, Box<dyn Error>> {
    let mut changes = HashMap::new();
    for arg in args {
        let (node, state) = arg.split_once(STATE_SEPARATOR).ok_or_else(|| {
            format!(
                "Invalid state change '{}' (expected branch{}state)",
                arg, STATE_SEPARATOR
            )
        })?;
        changes.insert(node.to_string(), state.to_string());
    }
    Ok(changes)
}

/// One top-down pass assigning states: the root takes the supplied state,
/// every other node takes its change-dictionary entry if present and
/// otherwise inherits from its parent. No back-propagation.
pub fn propagate_states(tree: &mut Tree, root_state: &str, changes: &HashMap<String, String>) {
    tree.node_mut(tree.root()).state = Some(root_state.to_string());
    for idx in tree.preorder() {
        if idx == tree.root() {
            continue;
        }
        let state = match changes.get(&tree.node(idx).node_name) {
            Some(state) => state.clone(),
            None => tree
                .node(tree.parent(idx).expect("non-root node has a parent"))
                .state
                .clone()
                .expect("parent state set before children in preorder"),
        };
        tree.node_mut(idx).state = Some(state);
    }
}

/// Writes a state-labelled tree: tips as `taxon____state`, internal nodes
/// as their bare state.
pub fn state_labelled_newick(tree: &Tree) -> String {
    newick::write_with(tree, |t, idx| {
        let clade = t.node(idx);
        let state = clade.state.as_deref().unwrap_or_default();
        if t.is_tip(idx) {
            match &clade.name {
                Some(name) => format!("{}{}{}", name, STATE_SEPARATOR, state),
                None => state.to_string(),
            }
        } else {
            state.to_string()
        }
    })
}

/// Builds the taxon-to-label map for the mugration strategy: table entries
/// win, taxa missing from the table fall back to a synthetic category that
/// is guaranteed not to collide with a real label.
pub fn fill_unlabelled_taxa(
    tree: &Tree,
    mut labels: HashMap<String, String>,
) -> HashMap<String, String> {
    let mut fallback = UNLABELLED.to_string();
    while labels.values().any(|l| *l == fallback) {
        fallback.push_str("_A");
    }
    for tip in tree.tips() {
        if let Some(name) = tree.node(tip).name.as_deref() {
            labels
                .entry(name.to_string())
                .or_insert_with(|| fallback.clone());
        }
    }
    labels
}
