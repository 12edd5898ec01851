//! UPGMA (average-linkage) agglomerative clustering over the condensed
//! pairwise distance vector from [`crate::dependency`], producing the Family
//! Of Subsets (FOS) Optimal Mixing iterates over (spec.md §4.5).
//!
//! Feeding `1 - dependency` as the distance means high-dependency pairs merge
//! first, even though the clustering routine itself always merges the
//! *closest* (minimum-distance) pair — this is the "linkage tree built on
//! minimum distance, intended as maximum dependency" transformation spec.md
//! §9 calls out as load-bearing, and it is performed entirely by the caller
//! (`crate::dependency`'s `1 - dep`): this module just clusters whatever
//! distances it is given.

use std::collections::HashMap;

/// One row of the `(N-1) x 4` linkage table: two child cluster ids, the
/// distance at which they were merged, and the merged cluster's leaf count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkageRow {
    pub child_a: usize,
    pub child_b: usize,
    pub height: f64,
    pub size: usize,
}

/// A built linkage tree: `n` leaves (ids `0..n`), `n - 1` internal nodes
/// (ids `n..2n-1`), and the FOS (leaf-id subset) for every node.
#[derive(Debug, Clone)]
pub struct LinkageTree {
    n: usize,
    rows: Vec<LinkageRow>,
    fos: Vec<Vec<usize>>,
}

impl LinkageTree {
    pub fn num_leaves(&self) -> usize {
        self.n
    }

    /// Total node count, `2n - 1` (leaves plus internal nodes).
    pub fn num_nodes(&self) -> usize {
        2 * self.n - 1
    }

    pub fn rows(&self) -> &[LinkageRow] {
        &self.rows
    }

    /// The FOS (set of leaf ids) rooted at `node_id`. `node_id < n` is a
    /// singleton leaf FOS; `node_id >= n` is an internal cluster.
    pub fn fos(&self, node_id: usize) -> &[usize] {
        &self.fos[node_id]
    }
}

fn condensed_index(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i < j && j < n);
    n * i - i * (i + 1) / 2 + j - i - 1
}

/// Builds a UPGMA tree over `n` leaves from the condensed distance vector
/// (row-major upper triangle, `i` then `j`, `i < j`; length `n*(n-1)/2`).
pub fn build_tree(n: usize, condensed: &[f64]) -> LinkageTree {
    assert_eq!(condensed.len(), n.saturating_sub(1) * n / 2);

    let fos: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    if n <= 1 {
        return LinkageTree { n, rows: Vec::new(), fos };
    }

    let mut dist: HashMap<(usize, usize), f64> = HashMap::with_capacity(condensed.len());
    for i in 0..n {
        for j in (i + 1)..n {
            dist.insert((i, j), condensed[condensed_index(i, j, n)]);
        }
    }

    let key = |a: usize, b: usize| if a < b { (a, b) } else { (b, a) };

    let mut active: Vec<usize> = (0..n).collect();
    let mut size: HashMap<usize, usize> = (0..n).map(|i| (i, 1)).collect();
    let mut fos = fos;
    let mut rows = Vec::with_capacity(n - 1);
    let mut next_id = n;

    for _ in 0..(n - 1) {
        let mut best: Option<(f64, usize, usize)> = None;
        for a_pos in 0..active.len() {
            for b_pos in (a_pos + 1)..active.len() {
                let (a, b) = (active[a_pos], active[b_pos]);
                let d = dist[&key(a, b)];
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, a_pos, b_pos));
                }
            }
        }
        let (height, a_pos, b_pos) = best.expect("at least two active clusters remain");
        let (a, b) = (active[a_pos], active[b_pos]);
        let size_a = size[&a];
        let size_b = size[&b];
        let new_size = size_a + size_b;

        let remaining: Vec<usize> = active.iter().copied().filter(|&x| x != a && x != b).collect();
        for c in remaining {
            let d_ac = dist[&key(a, c)];
            let d_bc = dist[&key(b, c)];
            let d_new = (size_a as f64 * d_ac + size_b as f64 * d_bc) / new_size as f64;
            dist.insert(key(next_id, c), d_new);
        }

        let (child_a, child_b) = if a < b { (a, b) } else { (b, a) };
        rows.push(LinkageRow { child_a, child_b, height, size: new_size });

        let mut merged = fos[child_a].clone();
        merged.extend_from_slice(&fos[child_b]);
        fos.push(merged);

        size.insert(next_id, new_size);
        active.retain(|&x| x != a && x != b);
        active.push(next_id);
        next_id += 1;
    }

    LinkageTree { n, rows, fos }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_has_no_internal_nodes() {
        let tree = build_tree(1, &[]);
        assert_eq!(tree.rows().len(), 0);
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.fos(0), &[0]);
    }

    #[test]
    fn three_leaves_produce_two_merges() {
        // 0-1 closest, then {0,1}-2.
        let condensed = [0.1, 0.9, 0.8]; // (0,1)=0.1 (0,2)=0.9 (1,2)=0.8
        let tree = build_tree(3, &condensed);
        assert_eq!(tree.rows().len(), 2);
        assert_eq!(tree.rows()[0].child_a, 0);
        assert_eq!(tree.rows()[0].child_b, 1);
        assert_eq!(tree.rows()[0].size, 2);

        let mut root_fos = tree.fos(4).to_vec();
        root_fos.sort_unstable();
        assert_eq!(root_fos, vec![0, 1, 2]);
    }

    #[test]
    fn leaf_fos_is_a_singleton() {
        let condensed = [0.1, 0.9, 0.8];
        let tree = build_tree(3, &condensed);
        assert_eq!(tree.fos(1), &[1]);
    }

    #[test]
    fn upgma_merge_distance_is_average_of_members() {
        // 4 leaves: merge 0-1 first (0.1), then check the distance from
        // {0,1} to 2 is the unweighted average of d(0,2) and d(1,2).
        let d01 = 0.1;
        let d02 = 0.4;
        let d12 = 0.6;
        let d03 = 0.9;
        let d13 = 0.9;
        let d23 = 0.9;
        let condensed = [d01, d02, d03, d12, d13, d23];
        let tree = build_tree(4, &condensed);
        assert_eq!(tree.rows()[0].child_a, 0);
        assert_eq!(tree.rows()[0].child_b, 1);
        // Next merge should involve cluster {0,1} and leaf 2 at (d02+d12)/2 = 0.5.
        assert!((tree.rows()[1].height - 0.5).abs() < 1e-9);
    }
}
