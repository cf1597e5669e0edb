use mutspec::labelling;
use mutspec::phylo::nexus;
use mutspec::spectrum::{self, extract, Alphabet, SpectrumKey};
use mutspec::utils::translate::PositionTranslation;
use std::collections::HashMap;

// End-to-end reconstruction over the engine's annotated tree output,
// without the engine itself: parse the nexus annotations, filter, resolve
// context and aggregate.
//
// The reference is 100 bases of A with C at position 50 and G at 51, so a
// C50T substitution sits in an A..G window.

fn reference() -> Vec<u8> {
    let mut seq = b"A".repeat(100);
    seq[49] = b'C';
    seq[50] = b'G';
    seq
}

const ANNOTATED: &str = "#NEXUS\nBegin Trees;\n\
    Tree tree1=[&R] ((taxon_a[&mutations=\"C50T\"]:0.1,taxon_b:0.1)NODE_0000001:0.1,taxon_c:0.2)NODE_0000000:0;\n\
    End;\n";

fn run_uniform(
    annotated: &str,
    reference: Vec<u8>,
) -> (
    HashMap<String, spectrum::Spectrum>,
    String,
    String,
) {
    let mut tree = nexus::parse(annotated).expect("annotated tree parses");
    tree.assign_node_names().unwrap();
    let categories = labelling::label_all_branches(&mut tree);

    let translation = PositionTranslation::all_sites(reference.len());
    let mut branch_events = HashMap::new();
    for idx in tree.preorder() {
        if idx == tree.root() {
            continue;
        }
        if let Some(comment) = tree.node(idx).comment.clone() {
            let events = extract::parse_branch_mutations(&comment, &translation).unwrap();
            if !events.is_empty() {
                branch_events.insert(idx, events);
            }
        }
    }

    let alphabet = Alphabet::dna();
    let mut rejected = Vec::new();
    let mut accepted = Vec::new();
    let spectra = spectrum::accumulate_spectra(
        &tree,
        branch_events,
        reference,
        &alphabet,
        &categories,
        false,
        None,
        &mut rejected,
        &mut accepted,
    )
    .expect("extraction succeeds");
    (
        spectra,
        String::from_utf8(rejected).unwrap(),
        String::from_utf8(accepted).unwrap(),
    )
}

#[test]
fn three_taxon_example_counts_one_c_to_t() {
    let (spectra, rejected, accepted) = run_uniform(ANNOTATED, reference());

    let spectrum = &spectra["A"];
    assert_eq!(
        spectrum.count(&SpectrumKey::new(b'A', b'C', b'T', b'G')),
        1,
        "C50T in an A/G window must land on A[C>T]G"
    );
    assert_eq!(spectrum.total(), 1);
    assert!(rejected.is_empty(), "no event should be rejected: {}", rejected);
    assert_eq!(accepted, "C50T,C50T,taxon_a\n");
}

#[test]
fn spectrum_totals_match_accepted_event_counts() {
    let annotated = "#NEXUS\nBegin Trees;\n\
        Tree tree1=[&R] ((taxon_a[&mutations=\"C50T,A30G\"]:0.1,taxon_b[&mutations=\"C50G\"]:0.1)NODE_0000001[&mutations=\"A20T\"]:0.1,taxon_c:0.2)NODE_0000000:0;\n\
        End;\n";
    let (spectra, rejected, accepted) = run_uniform(annotated, reference());

    assert!(rejected.is_empty(), "unexpected rejections: {}", rejected);
    let accepted_rows = accepted.lines().count();
    assert_eq!(accepted_rows, 4);
    assert_eq!(
        spectra["A"].total(),
        accepted_rows as u64,
        "category total must equal its accepted events"
    );
}

#[test]
fn end_of_genome_events_are_rejected_not_counted() {
    let annotated = "#NEXUS\nBegin Trees;\n\
        Tree tree1=[&R] (taxon_a[&mutations=\"A1G,A100T\"]:0.1,taxon_b:0.1)NODE_0000000:0;\n\
        End;\n";
    let (spectra, rejected, _) = run_uniform(annotated, reference());

    assert_eq!(spectra["A"].total(), 0);
    let rows: Vec<&str> = rejected.lines().collect();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert!(row.ends_with(",End_of_genome"), "row was: {}", row);
    }
}

#[test]
fn adjacent_substitutions_are_rejected_and_two_apart_kept() {
    let annotated = "#NEXUS\nBegin Trees;\n\
        Tree tree1=[&R] (taxon_a[&mutations=\"A10G,A11T,A20G,A22T\"]:0.1,taxon_b:0.1)NODE_0000000:0;\n\
        End;\n";
    let (spectra, rejected, accepted) = run_uniform(annotated, reference());

    let double_rows = rejected
        .lines()
        .filter(|row| row.ends_with(",Double_substitution"))
        .count();
    assert_eq!(double_rows, 2, "positions 10 and 11 form a chain");
    assert_eq!(
        accepted.lines().count(),
        2,
        "positions 20 and 22 are two apart and both retained"
    );
    assert_eq!(spectra["A"].total(), 2);
}

#[test]
fn conversion_table_positions_are_translated() {
    // alignment position 2 sits at genome position 50
    let translation =
        PositionTranslation::from_pairs(vec![(1, 10), (2, 50), (3, 60)]).unwrap();
    let events = extract::parse_branch_mutations("[&mutations=\"C2T\"]", &translation).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].alignment_position, 2);
    assert_eq!(events[0].genome_position, 50);
    assert_eq!(events[0].alignment_token(), "C2T");
    assert_eq!(events[0].genome_token(), "C50T");
}
