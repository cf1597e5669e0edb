//! Mutational spectrum reconstruction: from per-branch substitution
//! annotations to per-category spectra.

pub mod alphabet;
pub mod context;
pub mod counts;
pub mod extract;
pub mod synonymy;

pub use alphabet::{Alphabet, AlphabetKind, SpectrumKey};
pub use counts::Spectrum;
pub use extract::{AcceptedMutation, MutationEvent, RejectionReason};

use crate::labelling::branch_category;
use crate::phylo::Tree;
use crate::spectrum::alphabet::complement;
use crate::spectrum::context::AncestralGenomes;
use crate::spectrum::synonymy::SynonymyFilter;
use std::collections::HashMap;
use std::error::Error;
use std::io::Write;

/// Header of the rejection log, written even when no event is rejected.
pub const REJECTED_HEADER: &str = "Mutation_in_alignment,Mutation_in_genome,Branch,Reason_not_included";
/// Header of the accepted-mutations log.
pub const ACCEPTED_HEADER: &str = "Mutation_in_alignment,Mutation_in_genome,Branch";

/// One pass over a labelled tree: filters every branch's events and
/// accumulates the survivors into per-category spectra.
///
/// `branch_events` maps node indices to the raw events parsed from the
/// reconstruction annotations. Branches without a category (the root and,
/// by default, transition branches) contribute nothing to any spectrum but
/// their events still shape the sequence context seen below them.
pub fn accumulate_spectra<W: Write, V: Write>(
    tree: &Tree,
    mut branch_events: HashMap<usize, Vec<MutationEvent>>,
    root_sequence: Vec<u8>,
    alphabet: &Alphabet,
    categories: &[String],
    include_transition_branches: bool,
    synonymy: Option<&dyn SynonymyFilter>,
    rejected_log: &mut W,
    accepted_log: &mut V,
) -> Result<HashMap<String, Spectrum>, Box<dyn Error>> {
    let mut spectra: HashMap<String, Spectrum> = categories
        .iter()
        .map(|label| (label.clone(), Spectrum::new(alphabet)))
        .collect();

    let order = tree.preorder();

    // Double-substitution removal happens only on branches that will be
    // analysed; skipped branches keep all their events for context replay.
    let mut double_rejects: Vec<(usize, MutationEvent)> = Vec::new();
    for &idx in &order {
        if branch_category(tree, idx, include_transition_branches).is_none() {
            continue;
        }
        if let Some(events) = branch_events.remove(&idx) {
            let (kept, removed) = extract::remove_double_substitutions(events);
            double_rejects.extend(removed.into_iter().map(|event| (idx, event)));
            branch_events.insert(idx, kept);
        }
    }
    for (idx, event) in &double_rejects {
        write_rejected(
            rejected_log,
            event,
            tree.node(*idx).branch_id(),
            RejectionReason::DoubleSubstitution,
        )?;
    }

    let branch_events = branch_events;
    let mut genomes = AncestralGenomes::new(tree, &branch_events, root_sequence);

    for &idx in &order {
        let category = match branch_category(tree, idx, include_transition_branches) {
            Some(category) => category.to_string(),
            None => continue,
        };
        let events = match branch_events.get(&idx) {
            Some(events) if !events.is_empty() => events,
            _ => continue,
        };
        let parent = tree.parent(idx).expect("categorized branch has a parent");
        let mut working = genomes.sequence_at(parent).to_vec();
        let outcome = extract::evaluate_branch(events, &mut working, synonymy);

        let branch = tree.node(idx).branch_id().to_string();
        for (event, reason) in &outcome.rejected {
            write_rejected(rejected_log, event, &branch, *reason)?;
        }

        let spectrum = spectra.get_mut(&category).ok_or_else(|| {
            format!("No spectrum initialized for category '{}'", category)
        })?;
        for accepted in &outcome.accepted {
            let observed = SpectrumKey::new(
                accepted.upstream,
                accepted.event.ancestral,
                accepted.event.derived,
                accepted.downstream,
            );
            let canonical = alphabet.canonicalize(observed);
            spectrum.increment(canonical);
            write_accepted(
                accepted_log,
                &accepted.event,
                &branch,
                canonical == observed,
            )?;
        }
    }

    Ok(spectra)
}

fn write_rejected<W: Write>(
    out: &mut W,
    event: &MutationEvent,
    branch: &str,
    reason: RejectionReason,
) -> std::io::Result<()> {
    writeln!(
        out,
        "{},{},{},{}",
        event.alignment_token(),
        event.genome_token(),
        branch,
        reason.as_str()
    )
}

/// Accepted events are logged on the strand they were counted on, so a
/// complement-canonicalized event is written with complemented bases.
fn write_accepted<W: Write>(
    out: &mut W,
    event: &MutationEvent,
    branch: &str,
    counted_as_observed: bool,
) -> std::io::Result<()> {
    if counted_as_observed {
        writeln!(
            out,
            "{},{},{}",
            event.alignment_token(),
            event.genome_token(),
            branch
        )
    } else {
        let ancestral = complement(event.ancestral) as char;
        let derived = complement(event.derived) as char;
        writeln!(
            out,
            "{}{}{},{}{}{},{}",
            ancestral, event.alignment_position, derived,
            ancestral, event.genome_position, derived,
            branch
        )
    }
}
