//! Newick reading and writing.
//!
//! The parser also accepts the bracketed `[&...]` annotations the
//! reconstruction engine attaches to nodes; the first annotation seen for a
//! node is kept verbatim in `Clade::comment`.

use super::{Clade, Tree};
use std::error::Error;

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Reads a bracketed annotation, brackets included. Nesting is not
    /// expected in engine output but is tolerated.
    fn read_comment(&mut self) -> Result<String, Box<dyn Error>> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.bump() {
                Some(b'[') => depth += 1,
                Some(b']') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some(_) => {}
                None => return Err("Unterminated [ comment in tree".into()),
            }
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn read_label(&mut self) -> Result<Option<String>, Box<dyn Error>> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'\'') => {
                self.bump();
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b == b'\'' {
                        let label =
                            String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                        self.bump();
                        return Ok(Some(label));
                    }
                    self.bump();
                }
                Err("Unterminated quoted label in tree".into())
            }
            Some(b) if !b"(),:;[".contains(&b) => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b"(),:;[".contains(&b) || b.is_ascii_whitespace() {
                        break;
                    }
                    self.bump();
                }
                Ok(Some(
                    String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned(),
                ))
            }
            _ => Ok(None),
        }
    }

    /// Label, optional annotation and optional branch length following a
    /// subtree or tip token.
    fn read_clade_suffix(&mut self, clade: &mut Clade) -> Result<(), Box<dyn Error>> {
        self.skip_whitespace();
        if let Some(b'[') = self.peek() {
            clade.comment = Some(self.read_comment()?);
        }
        self.skip_whitespace();
        if let Some(b':') = self.peek() {
            self.bump();
            self.skip_whitespace();
            if let Some(b'[') = self.peek() {
                // annotation between colon and length, seen from some engines
                let comment = self.read_comment()?;
                if clade.comment.is_none() {
                    clade.comment = Some(comment);
                }
                self.skip_whitespace();
            }
            let start = self.pos;
            while let Some(b) = self.peek() {
                if b"(),;[".contains(&b) || b.is_ascii_whitespace() {
                    break;
                }
                self.bump();
            }
            let text = std::str::from_utf8(&self.bytes[start..self.pos])?;
            let length: f64 = text
                .parse()
                .map_err(|_| format!("Invalid branch length '{}'", text))?;
            clade.branch_length = Some(length);
            self.skip_whitespace();
            if let Some(b'[') = self.peek() {
                let comment = self.read_comment()?;
                if clade.comment.is_none() {
                    clade.comment = Some(comment);
                }
            }
        }
        Ok(())
    }

    fn parse_subtree(&mut self, tree: &mut Tree, parent: Option<usize>) -> Result<usize, Box<dyn Error>> {
        self.skip_whitespace();
        let idx = match parent {
            Some(p) => tree.add_child(p, Clade::default()),
            None => tree.root(),
        };
        if let Some(b'(') = self.peek() {
            self.bump();
            loop {
                self.parse_subtree(tree, Some(idx))?;
                self.skip_whitespace();
                match self.bump() {
                    Some(b',') => continue,
                    Some(b')') => break,
                    _ => return Err("Expected ',' or ')' in tree".into()),
                }
            }
        }
        let mut clade = std::mem::take(tree.node_mut(idx));
        clade.name = self.read_label()?;
        self.read_clade_suffix(&mut clade)?;
        *tree.node_mut(idx) = clade;
        Ok(idx)
    }
}

/// Parses a single newick tree, tolerating engine annotations.
pub fn parse(text: &str) -> Result<Tree, Box<dyn Error>> {
    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    // leading tree-level comments such as the rooted marker [&R]
    while let Some(b'[') = parser.peek() {
        parser.read_comment()?;
        parser.skip_whitespace();
    }
    let mut tree = Tree::new(Clade::default());
    parser.parse_subtree(&mut tree, None)?;
    parser.skip_whitespace();
    match parser.peek() {
        Some(b';') | None => Ok(tree),
        Some(other) => Err(format!("Unexpected character '{}' after tree", other as char).into()),
    }
}

/// Writes a tree as newick, labelling every node with `label(tree, idx)`.
/// Empty labels are omitted.
pub fn write_with<F>(tree: &Tree, label: F) -> String
where
    F: Fn(&Tree, usize) -> String,
{
    fn recurse<F>(tree: &Tree, idx: usize, label: &F, out: &mut String)
    where
        F: Fn(&Tree, usize) -> String,
    {
        if !tree.is_tip(idx) {
            out.push('(');
            for (i, &child) in tree.children(idx).iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                recurse(tree, child, label, out);
            }
            out.push(')');
        }
        out.push_str(&label(tree, idx));
        if let Some(length) = tree.node(idx).branch_length {
            out.push(':');
            out.push_str(&format!("{}", length));
        }
    }

    let mut out = String::new();
    recurse(tree, tree.root(), &label, &mut out);
    out.push(';');
    out
}

/// Writes a tree using the node's input name as its label.
pub fn write(tree: &Tree) -> String {
    write_with(tree, |t, idx| {
        t.node(idx).name.clone().unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_lengths() {
        let tree = parse("((A:0.1,B:0.2)inner:0.05,C:0.3)root;").unwrap();
        assert_eq!(tree.len(), 5);
        let root = tree.root();
        assert_eq!(tree.node(root).name.as_deref(), Some("root"));
        let inner = tree.children(root)[0];
        assert_eq!(tree.node(inner).name.as_deref(), Some("inner"));
        assert_eq!(tree.node(inner).branch_length, Some(0.05));
        let tips: Vec<_> = tree
            .tips()
            .iter()
            .map(|&t| tree.node(t).name.clone().unwrap())
            .collect();
        assert_eq!(tips, vec!["A", "B", "C"]);
    }

    #[test]
    fn parses_engine_annotations() {
        let tree = parse("(A[&mutations=\"A3G\"]:0.1,B:0.2)NODE_0000000[&mutations=\"\"]:0.0;")
            .unwrap();
        let a = tree.tips()[0];
        assert_eq!(tree.node(a).comment.as_deref(), Some("[&mutations=\"A3G\"]"));
        assert_eq!(
            tree.node(tree.root()).name.as_deref(),
            Some("NODE_0000000")
        );
    }

    #[test]
    fn parses_quoted_labels() {
        let tree = parse("('taxon one':1,B:2);").unwrap();
        let a = tree.tips()[0];
        assert_eq!(tree.node(a).name.as_deref(), Some("taxon one"));
    }

    #[test]
    fn round_trips_topology() {
        let text = "((A:0.1,B:0.2):0.05,C:0.3);";
        let tree = parse(text).unwrap();
        let written = write(&tree);
        let reparsed = parse(&written).unwrap();
        assert_eq!(reparsed.len(), tree.len());
        assert_eq!(reparsed.tips().len(), 3);
    }
}
