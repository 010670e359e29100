use super::tree::Tree;
use crate::libs::matrix::DistMatrix;
use anyhow::{bail, Result};
use std::collections::HashMap;

/// Build a tree from a distance matrix using the Neighbor-Joining algorithm.
///
/// Ties in the Q criterion break on the first encountered minimum, so the
/// output is deterministic for a given matrix. Branch lengths are clamped to
/// zero from below; NJ can produce small negative estimates on noisy input.
///
/// Degenerate sizes are well defined: an empty matrix yields an empty tree, a
/// 1x1 matrix a single unconnected leaf, a 2x2 matrix one edge between the
/// two leaves.
pub fn nj(matrix: &DistMatrix, names: &[String]) -> Result<Tree> {
    let n = matrix.size();
    if names.len() != n {
        bail!("matrix size {} does not match {} names", n, names.len());
    }

    let mut tree = Tree::new();
    if n == 0 {
        return Ok(tree);
    }

    // Active clusters, each identified by its NodeId in the arena.
    let mut active: Vec<usize> = Vec::with_capacity(n);
    for (i, name) in names.iter().enumerate() {
        active.push(tree.add_leaf(i, name.clone()));
    }

    if n == 1 {
        tree.set_root(active[0]);
        return Ok(tree);
    }

    // Working distances between active clusters, keyed by (min, max) NodeId.
    let mut dists: HashMap<(usize, usize), f64> = HashMap::new();
    for i in 0..n {
        for j in (i + 1)..n {
            dists.insert(key(active[i], active[j]), matrix.get(i, j));
        }
    }

    while active.len() > 2 {
        let m = active.len();

        // Net divergence of each active cluster.
        let mut r = vec![0.0; m];
        for i in 0..m {
            for j in 0..m {
                if i != j {
                    r[i] += dists[&key(active[i], active[j])];
                }
            }
        }

        // 1. Find the pair minimizing Q = (m-2)*d(i,j) - r_i - r_j
        let mut min_q = f64::MAX;
        let mut pair = (0, 1);
        for i in 0..m {
            for j in (i + 1)..m {
                let d = dists[&key(active[i], active[j])];
                let q = (m as f64 - 2.0) * d - r[i] - r[j];
                if q < min_q {
                    min_q = q;
                    pair = (i, j);
                }
            }
        }

        // 2. Join the pair under a new internal node
        let (idx1, idx2) = pair;
        let id1 = active[idx1];
        let id2 = active[idx2];
        let d12 = dists[&key(id1, id2)];

        let new_node = tree.add_node();
        tree.add_child(new_node, id1)
            .map_err(|e| anyhow::anyhow!(e))?;
        tree.add_child(new_node, id2)
            .map_err(|e| anyhow::anyhow!(e))?;

        let len1 = (d12 / 2.0 + (r[idx1] - r[idx2]) / (2.0 * (m as f64 - 2.0))).max(0.0);
        let len2 = (d12 - len1).max(0.0);
        tree.get_node_mut(id1).unwrap().length = Some(len1);
        tree.get_node_mut(id2).unwrap().length = Some(len2);

        // 3. Distances from the new cluster to the remaining ones
        let mut new_dists = Vec::new();
        for (k_idx, &other) in active.iter().enumerate() {
            if k_idx == idx1 || k_idx == idx2 {
                continue;
            }
            let d1 = dists[&key(id1, other)];
            let d2 = dists[&key(id2, other)];
            let d_new = ((d1 + d2 - d12) / 2.0).max(0.0);
            new_dists.push((other, d_new));
        }

        // Remove larger index first to avoid shift issues
        active.remove(idx2);
        active.remove(idx1);
        active.push(new_node);
        for (other, d) in new_dists {
            dists.insert(key(new_node, other), d);
        }
    }

    // Final edge between the last two clusters. Anchor at the internal one
    // when there is one, so the tree reads naturally as ((...),leaf).
    let (a, b) = (active[0], active[1]);
    let d = dists[&key(a, b)].max(0.0);
    let (anchor, other) = if tree.get_node(a).unwrap().is_leaf() && !tree.get_node(b).unwrap().is_leaf()
    {
        (b, a)
    } else {
        (a, b)
    };
    tree.add_child(anchor, other)
        .map_err(|e| anyhow::anyhow!(e))?;
    tree.get_node_mut(other).unwrap().length = Some(d);
    tree.set_root(anchor);

    Ok(tree)
}

fn key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_nj_degenerate() {
        let tree = nj(&DistMatrix::new(0), &[]).unwrap();
        assert!(tree.is_empty());

        let tree = nj(&DistMatrix::new(1), &names(1)).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.edge_count(), 0);

        let mut m = DistMatrix::new(2);
        m.set(0, 1, 3.0);
        let tree = nj(&m, &names(2)).unwrap();
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.edge_count(), 1);
    }

    #[test]
    fn test_nj_edge_count() {
        // Unrooted binary: 2n-3 edges for n >= 3
        for n in 3..7 {
            let mut m = DistMatrix::new(n);
            for i in 0..n {
                for j in (i + 1)..n {
                    m.set(i, j, (i + j) as f64 + 1.0);
                }
            }
            let tree = nj(&m, &names(n)).unwrap();
            assert_eq!(tree.leaf_count(), n);
            assert_eq!(tree.edge_count(), 2 * n - 3);
        }
    }

    #[test]
    fn test_nj_additive_matrix() {
        // Classic additive example (Saitou & Nei style): known branch lengths.
        //      0   1   2   3
        //  0   0   5   9  10
        //  1   5   0  10  11
        //  2   9  10   0   7
        //  3  10  11   7   0
        // Tree: ((0:2,1:3):3,2:4,3:3) as unrooted.
        let rows = vec![
            0.0, 5.0, 9.0, 10.0, //
            5.0, 0.0, 10.0, 11.0, //
            9.0, 10.0, 0.0, 7.0, //
            10.0, 11.0, 7.0, 0.0,
        ];
        let m = DistMatrix::from_rows(4, &rows);
        let tree = nj(&m, &names(4)).unwrap();

        // Leaves 0 and 1 must be siblings with lengths 2 and 3.
        let leaves = tree.leaves();
        let leaf0 = leaves
            .iter()
            .copied()
            .find(|&id| tree.get_node(id).unwrap().leaf == Some(0))
            .unwrap();
        let leaf1 = leaves
            .iter()
            .copied()
            .find(|&id| tree.get_node(id).unwrap().leaf == Some(1))
            .unwrap();
        assert_eq!(
            tree.get_node(leaf0).unwrap().parent,
            tree.get_node(leaf1).unwrap().parent
        );
        assert_relative_eq!(tree.get_node(leaf0).unwrap().length.unwrap(), 2.0);
        assert_relative_eq!(tree.get_node(leaf1).unwrap().length.unwrap(), 3.0);
    }

    #[test]
    fn test_nj_name_mismatch() {
        assert!(nj(&DistMatrix::new(3), &names(2)).is_err());
    }
}
