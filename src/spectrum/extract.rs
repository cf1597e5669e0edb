//! Mutation extraction: parsing the reconstruction engine's per-branch
//! substitution annotations and the rejection filters that decide which
//! events reach a spectrum.

use crate::spectrum::alphabet::is_nucleotide;
use crate::spectrum::synonymy::SynonymyFilter;
use crate::utils::translate::PositionTranslation;
use std::error::Error;

/// One reconstructed substitution on a branch. Positions are 1-based; the
/// alignment position is what the engine reported, the genome position is
/// its translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationEvent {
    pub ancestral: u8,
    pub alignment_position: usize,
    pub genome_position: usize,
    pub derived: u8,
}

impl MutationEvent {
    /// `A123T` form in alignment coordinates, as logged.
    pub fn alignment_token(&self) -> String {
        format!(
            "{}{}{}",
            self.ancestral as char, self.alignment_position, self.derived as char
        )
    }

    /// `A456T` form in genome coordinates, as logged.
    pub fn genome_token(&self) -> String {
        format!(
            "{}{}{}",
            self.ancestral as char, self.genome_position, self.derived as char
        )
    }
}

/// Why an event was excluded from every spectrum. The wire strings match
/// the rejection log vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    DoubleSubstitution,
    EndOfGenome,
    NotTwoNucleotides,
    ContextNotNucleotide,
    NotSynonymous,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::DoubleSubstitution => "Double_substitution",
            RejectionReason::EndOfGenome => "End_of_genome",
            RejectionReason::NotTwoNucleotides => "Mutation_does_not_involve_two_nucleotides",
            RejectionReason::ContextNotNucleotide => "Surrounding_position_not_nucleotide",
            RejectionReason::NotSynonymous => "Not_synonymous",
        }
    }
}

/// An event that survived every filter, with its resolved flanks.
#[derive(Debug, Clone, Copy)]
pub struct AcceptedMutation {
    pub event: MutationEvent,
    pub upstream: u8,
    pub downstream: u8,
}

/// Parses the engine's branch annotation (`[&mutations="A123T,C456G"]`)
/// into events, translating alignment positions to genome positions. An
/// annotated position missing from the translation means the engine output
/// and the conversion table disagree, which is fatal.
pub fn parse_branch_mutations(
    comment: &str,
    translation: &PositionTranslation,
) -> Result<Vec<MutationEvent>, Box<dyn Error>> {
    let list = match comment.find("mutations=\"") {
        Some(start) => {
            let rest = &comment[start + 11..];
            match rest.find('"') {
                Some(end) => &rest[..end],
                None => return Err("Unterminated mutations attribute in tree annotation".into()),
            }
        }
        None => return Ok(Vec::new()),
    };

    let mut events = Vec::new();
    for token in list.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.len() < 3 || !token.is_ascii() {
            return Err(format!("Malformed mutation token '{}'", token).into());
        }
        let bytes = token.as_bytes();
        let ancestral = bytes[0].to_ascii_uppercase();
        let derived = bytes[bytes.len() - 1].to_ascii_uppercase();
        let alignment_position: usize = token[1..token.len() - 1]
            .parse()
            .map_err(|_| format!("Malformed mutation token '{}'", token))?;
        let genome_position = translation
            .genome_position(alignment_position)
            .ok_or_else(|| {
                format!(
                    "Alignment position {} of mutation '{}' has no genome coordinate",
                    alignment_position, token
                )
            })?;
        events.push(MutationEvent {
            ancestral,
            alignment_position,
            genome_position,
            derived,
        });
    }
    Ok(events)
}

/// Removes runs of events at consecutive genome positions, which are
/// reconstruction artifacts of a single multi-nucleotide change. Events are
/// compared in genome-position order, so only genuinely adjacent pairs (and
/// the chains they form) are removed; events two or more apart survive.
/// Returns the surviving events (sorted) and the removed ones.
pub fn remove_double_substitutions(
    events: Vec<MutationEvent>,
) -> (Vec<MutationEvent>, Vec<MutationEvent>) {
    let mut sorted = events;
    sorted.sort_by_key(|e| e.genome_position);

    let mut in_chain = vec![false; sorted.len()];
    for i in 1..sorted.len() {
        if sorted[i].genome_position == sorted[i - 1].genome_position + 1 {
            in_chain[i - 1] = true;
            in_chain[i] = true;
        }
    }

    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for (event, flagged) in sorted.into_iter().zip(in_chain) {
        if flagged {
            removed.push(event);
        } else {
            kept.push(event);
        }
    }
    (kept, removed)
}

/// Outcome of running one branch's events through the filter pipeline.
pub struct BranchOutcome {
    pub accepted: Vec<AcceptedMutation>,
    pub rejected: Vec<(MutationEvent, RejectionReason)>,
}

/// Applies the positional filters to a branch's events (double
/// substitutions are assumed to be already removed) and resolves each
/// survivor's context from `working`, the sequence state at the parent
/// node. Events apply to `working` sequentially, so a later event on the
/// same branch sees its predecessors' changes; on return `working` is the
/// sequence state at the child node.
pub fn evaluate_branch(
    events: &[MutationEvent],
    working: &mut [u8],
    synonymy: Option<&dyn SynonymyFilter>,
) -> BranchOutcome {
    let genome_length = working.len();
    let mut outcome = BranchOutcome {
        accepted: Vec::new(),
        rejected: Vec::new(),
    };

    for &event in events {
        let position = event.genome_position;
        if position == 1 || position == genome_length {
            outcome
                .rejected
                .push((event, RejectionReason::EndOfGenome));
        } else if !is_nucleotide(event.ancestral)
            || !is_nucleotide(event.derived)
            || event.ancestral == event.derived
        {
            outcome
                .rejected
                .push((event, RejectionReason::NotTwoNucleotides));
        } else {
            let upstream = working[position - 2];
            let downstream = working[position];
            if !is_nucleotide(upstream) || !is_nucleotide(downstream) {
                outcome
                    .rejected
                    .push((event, RejectionReason::ContextNotNucleotide));
            } else if synonymy.map_or(true, |filter| filter.is_retained(&event, working)) {
                outcome.accepted.push(AcceptedMutation {
                    event,
                    upstream,
                    downstream,
                });
            } else {
                outcome
                    .rejected
                    .push((event, RejectionReason::NotSynonymous));
            }
        }
        // the event happened regardless of whether it is analysable
        working[position - 1] = event.derived;
    }
    outcome
}
