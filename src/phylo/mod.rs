pub mod newick;
pub mod nexus;

use std::error::Error;

/// A single node of a rooted tree together with everything the pipeline
/// tracks about its incoming branch.
///
/// `name` is the identity the input file gave the node (taxon id for tips,
/// the reconstruction engine's id such as `NODE_0000003` for internal
/// nodes). `node_name` is the stable identifier assigned by
/// [`Tree::assign_node_names`] (`NodeK` for internal nodes, the taxon id
/// for tips) and is what label tables and companion trees match against.
/// `state` is the resolved ancestral-state label, filled in by the branch
/// labeller. `comment` carries the raw annotation from the reconstruction
/// engine; its presence signals reconstructed substitutions on the
/// incoming branch.
#[derive(Debug, Clone, Default)]
pub struct Clade {
    pub name: Option<String>,
    pub node_name: String,
    pub state: Option<String>,
    pub comment: Option<String>,
    pub branch_length: Option<f64>,
}

impl Clade {
    pub fn named(name: &str) -> Self {
        Clade {
            name: Some(name.to_string()),
            ..Clade::default()
        }
    }

    /// Identifier used in log output: the input file's name when present,
    /// otherwise the assigned stable node name.
    pub fn branch_id(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.node_name)
    }
}

/// Rooted, ordered tree stored as an index arena. Child order is the order
/// nodes appeared in the input, so traversal order is reproducible.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Clade>,
    children: Vec<Vec<usize>>,
    parent: Vec<Option<usize>>,
}

impl Tree {
    pub fn new(root: Clade) -> Self {
        Tree {
            nodes: vec![root],
            children: vec![Vec::new()],
            parent: vec![None],
        }
    }

    pub fn add_child(&mut self, parent: usize, clade: Clade) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(clade);
        self.children.push(Vec::new());
        self.parent.push(Some(parent));
        self.children[parent].push(idx);
        idx
    }

    pub fn root(&self) -> usize {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &Clade {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut Clade {
        &mut self.nodes[idx]
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.parent[idx]
    }

    pub fn is_tip(&self, idx: usize) -> bool {
        self.children[idx].is_empty()
    }

    /// Depth-first preorder over all nodes, parents before children.
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            for &child in self.children[idx].iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Nodes on the path from the root to `idx`, root first, `idx` last.
    pub fn path_from_root(&self, idx: usize) -> Vec<usize> {
        let mut path = vec![idx];
        let mut current = idx;
        while let Some(up) = self.parent[current] {
            path.push(up);
            current = up;
        }
        path.reverse();
        path
    }

    pub fn tips(&self) -> Vec<usize> {
        self.preorder()
            .into_iter()
            .filter(|&idx| self.is_tip(idx))
            .collect()
    }

    /// Assigns the stable `node_name` of every node: internal nodes become
    /// `Node1`, `Node2`, ... in preorder, tips keep their taxon id. Fails
    /// if a tip has no name to use.
    pub fn assign_node_names(&mut self) -> Result<(), Box<dyn Error>> {
        let mut node_iterator = 1usize;
        for idx in self.preorder() {
            if self.is_tip(idx) {
                let name = self.nodes[idx]
                    .name
                    .clone()
                    .ok_or_else(|| format!("Tip node {} has no taxon name", idx))?;
                self.nodes[idx].node_name = name;
            } else {
                self.nodes[idx].node_name = format!("Node{}", node_iterator);
                node_iterator += 1;
            }
        }
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_taxon_tree() -> Tree {
        // ((A,B),C) with an unnamed root and one unnamed internal node
        let mut tree = Tree::new(Clade::default());
        let inner = tree.add_child(0, Clade::default());
        tree.add_child(inner, Clade::named("A"));
        tree.add_child(inner, Clade::named("B"));
        tree.add_child(0, Clade::named("C"));
        tree
    }

    #[test]
    fn preorder_visits_parents_first() {
        let tree = three_taxon_tree();
        let order = tree.preorder();
        assert_eq!(order[0], tree.root());
        for &idx in &order {
            if let Some(parent) = tree.parent(idx) {
                let child_pos = order.iter().position(|&o| o == idx).unwrap();
                let parent_pos = order.iter().position(|&o| o == parent).unwrap();
                assert!(parent_pos < child_pos, "parent must precede child");
            }
        }
    }

    #[test]
    fn path_from_root_ends_at_node() {
        let tree = three_taxon_tree();
        let tips = tree.tips();
        let a = tips[0];
        let path = tree.path_from_root(a);
        assert_eq!(path[0], tree.root());
        assert_eq!(*path.last().unwrap(), a);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn node_names_are_preorder_for_internal_nodes() {
        let mut tree = three_taxon_tree();
        tree.assign_node_names().unwrap();
        assert_eq!(tree.node(tree.root()).node_name, "Node1");
        let order = tree.preorder();
        assert_eq!(tree.node(order[1]).node_name, "Node2");
        let names: Vec<_> = tree
            .tips()
            .iter()
            .map(|&t| tree.node(t).node_name.clone())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
