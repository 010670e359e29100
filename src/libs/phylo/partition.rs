use super::tree::Tree;
use std::collections::HashSet;

/// Clade-qualification thresholds for the outgroup split.
#[derive(Debug, Clone)]
pub struct PartitionOpt {
    /// With no outgroup leaves at all, fall back to the trivial partition.
    pub require_outgroup: bool,
    /// If set, an edge is only cut when its support value reaches this
    /// threshold. Nodes without a support value are not gated.
    pub min_clade_support: Option<f64>,
}

impl Default for PartitionOpt {
    fn default() -> Self {
        Self {
            require_outgroup: true,
            min_clade_support: None,
        }
    }
}

/// Split the tree's leaves on outgroup-pure sides.
///
/// The tree is treated as unrooted. The ingroup leaves span a minimal
/// connected subtree (the skeleton); every edge leading from the skeleton
/// into a subtree that holds only outgroup leaves is cut. The leaves of each
/// component of the resulting forest form one group. With no outgroups, no
/// ingroups, or no qualifying edge, the result is the trivial single-group
/// partition.
///
/// The returned groups are pairwise disjoint and cover every leaf index
/// exactly once; groups are ordered by their smallest member.
pub fn split_on_outgroups(tree: &Tree, outgroups: &[usize], opt: &PartitionOpt) -> Vec<Vec<usize>> {
    let root = match tree.get_root() {
        Some(root) => root,
        None => return Vec::new(),
    };

    let all_leaves: Vec<usize> = tree
        .leaves()
        .iter()
        .map(|&id| tree.get_node(id).unwrap().leaf.unwrap())
        .collect();
    let total = all_leaves.len();

    let trivial = || {
        let mut group = all_leaves.clone();
        group.sort_unstable();
        vec![group]
    };

    let og: HashSet<usize> = outgroups.iter().copied().collect();
    if og.is_empty() && opt.require_outgroup {
        return trivial();
    }

    // Leaf and outgroup counts per root-side clade, bottom-up.
    let order = tree.postorder(root);
    let mut below = vec![0usize; tree.len()];
    let mut below_og = vec![0usize; tree.len()];
    for &id in &order {
        let node = tree.get_node(id).unwrap();
        if let Some(index) = node.leaf {
            below[id] = 1;
            below_og[id] = if og.contains(&index) { 1 } else { 0 };
        }
        for &child in &node.children {
            below[id] += below[child];
            below_og[id] += below_og[child];
        }
    }
    let total_og = below_og[root];
    let total_in = total - total_og;
    if total_og == 0 || total_in == 0 {
        // Nothing to separate: the whole leaf set is one side.
        return trivial();
    }
    let below_in = |id: usize| below[id] - below_og[id];
    let above_in = |id: usize| total_in - below_in(id);

    // Skeleton: the minimal connected subtree spanning the ingroup leaves.
    // A node belongs when it is an ingroup leaf itself, or when at least two
    // of its incident directions lead to ingroup leaves.
    let mut skeleton = vec![false; tree.len()];
    for &id in &order {
        let node = tree.get_node(id).unwrap();
        if let Some(index) = node.leaf {
            if !og.contains(&index) {
                skeleton[id] = true;
                continue;
            }
        }
        let mut dirs = node
            .children
            .iter()
            .filter(|&&child| below_in(child) > 0)
            .count();
        if node.parent.is_some() && above_in(id) > 0 {
            dirs += 1;
        }
        skeleton[id] = dirs >= 2;
    }

    // Cut every edge crossing the skeleton boundary whose outside holds only
    // outgroup leaves. Edges are identified by their child node.
    let mut cuts: HashSet<usize> = HashSet::new();
    for &id in &order {
        let node = tree.get_node(id).unwrap();
        let parent = match node.parent {
            Some(parent) => parent,
            None => continue,
        };
        if skeleton[id] == skeleton[parent] {
            continue;
        }
        let outside_pure = if skeleton[id] {
            // Outside is the parent side of the edge.
            above_in(id) == 0 && total - below[id] > 0
        } else {
            below_og[id] == below[id] && below[id] > 0
        };
        if !outside_pure {
            continue;
        }
        if let Some(min) = opt.min_clade_support {
            if let Some(support) = node.support {
                if support < min {
                    continue;
                }
            }
        }
        cuts.insert(id);
    }

    if cuts.is_empty() {
        return trivial();
    }

    // Connected components of the forest left after the cuts.
    // Reverse postorder visits parents before children.
    let mut comp = vec![usize::MAX; tree.len()];
    let mut n_comp = 0;
    for &id in order.iter().rev() {
        let node = tree.get_node(id).unwrap();
        comp[id] = match node.parent {
            Some(parent) if !cuts.contains(&id) => comp[parent],
            _ => {
                n_comp += 1;
                n_comp - 1
            }
        };
    }

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_comp];
    for &id in &tree.leaves() {
        let node = tree.get_node(id).unwrap();
        groups[comp[id]].push(node.leaf.unwrap());
    }
    let mut groups: Vec<Vec<usize>> = groups.into_iter().filter(|g| !g.is_empty()).collect();
    for group in groups.iter_mut() {
        group.sort_unstable();
    }
    groups.sort_by_key(|g| g[0]);

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::matrix::DistMatrix;
    use crate::libs::phylo::nj::nj;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    /// Distance matrix with two tight clusters: {0,1} and {2,3}.
    fn two_cluster_matrix() -> DistMatrix {
        let mut m = DistMatrix::new(4);
        m.set(0, 1, 0.1);
        m.set(2, 3, 0.1);
        for i in 0..2 {
            for j in 2..4 {
                m.set(i, j, 1.0);
            }
        }
        m
    }

    #[test]
    fn test_no_outgroups_is_trivial() {
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        let partition = split_on_outgroups(&tree, &[], &PartitionOpt::default());
        assert_eq!(partition, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_outgroup_clade_is_cut() {
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        let partition = split_on_outgroups(&tree, &[2, 3], &PartitionOpt::default());
        assert_eq!(partition, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_outgroup_side_contains_anchor() {
        // Same split even when the outgroup pair sits on the anchor's side
        // of the tree.
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        let partition = split_on_outgroups(&tree, &[0, 1], &PartitionOpt::default());
        assert_eq!(partition, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_scattered_outgroups() {
        // Outgroups 1 and 2 sit in different clusters; each hangs off the
        // ingroup skeleton on its own and splits off individually.
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        let partition = split_on_outgroups(&tree, &[1, 2], &PartitionOpt::default());
        assert_eq!(partition, vec![vec![0, 3], vec![1], vec![2]]);
    }

    #[test]
    fn test_all_outgroups_is_trivial() {
        // The whole tree is outgroup-pure; nothing to separate.
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        let partition = split_on_outgroups(&tree, &[0, 1, 2, 3], &PartitionOpt::default());
        assert_eq!(partition, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_single_ingroup_leaf() {
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        let partition = split_on_outgroups(&tree, &[0, 1, 2], &PartitionOpt::default());
        assert_eq!(partition, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_two_leaf_tree() {
        let mut m = DistMatrix::new(2);
        m.set(0, 1, 1.0);
        let tree = nj(&m, &names(2)).unwrap();
        // Either leaf as outgroup separates the pair.
        for og in [0usize, 1] {
            let partition = split_on_outgroups(&tree, &[og], &PartitionOpt::default());
            assert_eq!(partition, vec![vec![0], vec![1]]);
        }
    }

    #[test]
    fn test_conservation_invariant() {
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        for og in [vec![], vec![0], vec![2, 3], vec![0, 1, 2]] {
            let partition = split_on_outgroups(&tree, &og, &PartitionOpt::default());
            let mut seen: Vec<usize> = partition.iter().flatten().copied().collect();
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = nj(&DistMatrix::new(1), &names(1)).unwrap();
        let partition = split_on_outgroups(&tree, &[0], &PartitionOpt::default());
        assert_eq!(partition, vec![vec![0]]);
    }

    #[test]
    fn test_support_gate() {
        let tree = nj(&two_cluster_matrix(), &names(4)).unwrap();
        // NJ trees carry no support values, so the gate never blocks here.
        let opt = PartitionOpt {
            require_outgroup: true,
            min_clade_support: Some(0.9),
        };
        let partition = split_on_outgroups(&tree, &[2, 3], &opt);
        assert_eq!(partition, vec![vec![0, 1], vec![2, 3]]);
    }
}
