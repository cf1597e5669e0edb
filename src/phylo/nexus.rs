//! Minimal reader for the nexus files produced by the ancestral
//! reconstruction engine. Only the tree block is consumed; taxa blocks are
//! skipped. Node annotations survive into `Clade::comment`.

use super::{newick, Tree};
use std::error::Error;
use std::fs;
use std::path::Path;

/// Reads the first tree from a nexus file.
pub fn read_file(path: &Path) -> Result<Tree, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read tree file {}: {}", path.display(), e))?;
    parse(&text)
}

/// Parses the first `tree <name> = ...;` statement of a nexus document.
pub fn parse(text: &str) -> Result<Tree, Box<dyn Error>> {
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.len() >= 4 && trimmed[..4].eq_ignore_ascii_case("tree") {
            let rest = trimmed[4..].trim_start();
            // distinguish "tree name = (...)" from the "trees" block header
            if let Some(eq) = rest.find('=') {
                let newick_text = rest[eq + 1..].trim();
                return newick::parse(newick_text);
            }
        }
    }
    Err("No tree statement found in nexus input".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOTATED: &str = "#NEXUS\n\
        Begin Taxa;\n  Dimensions NTax=2;\n  TaxLabels A B;\nEnd;\n\
        Begin Trees;\n\
        \tTree tree1=[&R] (A[&mutations=\"C5T\"]:0.1,B:0.2)NODE_0000000:0;\n\
        End;\n";

    #[test]
    fn reads_tree_block() {
        let tree = parse(ANNOTATED).unwrap();
        assert_eq!(tree.tips().len(), 2);
        assert_eq!(tree.node(tree.root()).name.as_deref(), Some("NODE_0000000"));
        let a = tree.tips()[0];
        assert_eq!(
            tree.node(a).comment.as_deref(),
            Some("[&mutations=\"C5T\"]")
        );
    }

    #[test]
    fn missing_tree_statement_is_an_error() {
        assert!(parse("#NEXUS\nBegin Taxa;\nEnd;\n").is_err());
    }
}
