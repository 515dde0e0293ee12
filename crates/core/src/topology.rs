// SPDX-License-Identifier: MIT

//! Overlay-topology builder: tree, parent, and ring maps for `N` workers.
//!
//! Ported from `original_source/tracker/topo.py` (`TopoHelper`). Pure and
//! deterministic: the same `N` always yields the same maps, and the
//! relabeling pass places ring-adjacent ranks at nearby tree positions so
//! ring-allreduce and tree-broadcast can reuse connections.

use std::collections::HashMap;

use crate::ids::Rank;

/// Tree, parent, and ring maps for a world of `N` workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Children of each rank (binary-heap tree, post-relabel).
    pub tree: HashMap<Rank, Vec<Rank>>,
    /// Parent of each rank; `None` for the root (rank 0).
    pub parent: HashMap<Rank, Option<Rank>>,
    /// `(prev, next)` ring neighbors of each rank.
    pub ring: HashMap<Rank, (Rank, Rank)>,
}

impl Topology {
    /// Build the topology for `nworker` participants.
    ///
    /// For `nworker == 0` all three maps are empty. For `nworker == 1`
    /// the sole rank is its own tree root with no ring neighbors other
    /// than itself.
    pub fn build(nworker: u32) -> Topology {
        if nworker == 0 {
            return Topology { tree: HashMap::new(), parent: HashMap::new(), ring: HashMap::new() };
        }
        let (tree, parent) = binary_heap_tree(nworker);
        let ring = share_ring(&tree, &parent, nworker);
        relabel(&tree, &parent, &ring, nworker)
    }
}

/// Neighbors (parent, then children) of `rank` in a binary-heap tree of
/// `nworker` nodes, using the source's 1-indexed arithmetic.
fn neighbors(rank: u32, nworker: u32) -> Vec<u32> {
    let r = rank + 1;
    let mut out = Vec::with_capacity(3);
    if r > 1 {
        out.push(r / 2 - 1);
    }
    if r * 2 - 1 < nworker {
        out.push(r * 2 - 1);
    }
    if r * 2 < nworker {
        out.push(r * 2);
    }
    out
}

fn binary_heap_tree(nworker: u32) -> (HashMap<u32, Vec<u32>>, HashMap<u32, Option<u32>>) {
    let mut tree = HashMap::new();
    let mut parent = HashMap::new();
    for r in 0..nworker {
        tree.insert(r, neighbors(r, nworker));
        let p = (r as i64 + 1) / 2 - 1;
        parent.insert(r, if p < 0 { None } else { Some(p as u32) });
    }
    (tree, parent)
}

/// DFS from `r`, visiting non-parent children in tree order and reversing
/// the last child's subtree list (`find_share_ring` in the source).
fn share_ring_dfs(tree: &HashMap<u32, Vec<u32>>, parent: &HashMap<u32, Option<u32>>, r: u32) -> Vec<u32> {
    let p = parent[&r];
    let children: Vec<u32> = tree[&r].iter().copied().filter(|&n| Some(n) != p).collect();
    if children.is_empty() {
        return vec![r];
    }
    let mut out = vec![r];
    let last = children.len() - 1;
    for (i, &child) in children.iter().enumerate() {
        let mut sub = share_ring_dfs(tree, parent, child);
        if i == last {
            sub.reverse();
        }
        out.extend(sub);
    }
    out
}

fn share_ring(
    tree: &HashMap<u32, Vec<u32>>,
    parent: &HashMap<u32, Option<u32>>,
    nworker: u32,
) -> HashMap<u32, (u32, u32)> {
    debug_assert_eq!(parent[&0], None);
    let order = share_ring_dfs(tree, parent, 0);
    debug_assert_eq!(order.len() as u32, nworker);
    let mut ring = HashMap::new();
    for i in 0..nworker as usize {
        let prev = order[(i + order.len() - 1) % order.len()];
        let next = order[(i + 1) % order.len()];
        ring.insert(order[i], (prev, next));
    }
    ring
}

/// Walk the ring starting at 0 and relabel every rank in ring order, then
/// rewrite tree/parent/ring under the new labels.
fn relabel(
    tree: &HashMap<u32, Vec<u32>>,
    parent: &HashMap<u32, Option<u32>>,
    ring: &HashMap<u32, (u32, u32)>,
    nworker: u32,
) -> Topology {
    let mut remap = HashMap::new();
    remap.insert(0u32, 0u32);
    let mut k = 0u32;
    for i in 0..nworker - 1 {
        k = ring[&k].1;
        remap.insert(k, i + 1);
    }

    let mut new_ring = HashMap::new();
    for (&k, &(prev, next)) in ring {
        new_ring.insert(Rank::new(remap[&k]), (Rank::new(remap[&prev]), Rank::new(remap[&next])));
    }
    let mut new_tree = HashMap::new();
    for (&k, v) in tree {
        new_tree.insert(Rank::new(remap[&k]), v.iter().map(|&x| Rank::new(remap[&x])).collect());
    }
    let mut new_parent = HashMap::new();
    for (&k, &v) in parent {
        let relabeled = if k == 0 { None } else { v.map(|p| Rank::new(remap[&p])) };
        new_parent.insert(Rank::new(remap[&k]), relabeled);
    }
    Topology { tree: new_tree, parent: new_parent, ring: new_ring }
}

#[cfg(test)]
mod topology_tests;
