use super::*;
use std::collections::HashSet;

#[yare::parameterized(
    one    = { 1 },
    two    = { 2 },
    three  = { 3 },
    five   = { 5 },
    eight  = { 8 },
    sixteen = { 16 },
    odd    = { 13 },
)]
fn ring_is_hamiltonian_cycle(n: u32) {
    let topo = Topology::build(n);
    assert_eq!(topo.ring.len() as u32, n);

    let mut visited = HashSet::new();
    let mut cur = Rank::new(0);
    for _ in 0..n {
        assert!(visited.insert(cur), "ring revisited {cur:?} before completing the cycle");
        cur = topo.ring[&cur].1;
    }
    assert_eq!(cur, Rank::new(0), "ring did not return to the start after N steps");
    assert_eq!(visited.len() as u32, n);
}

#[yare::parameterized(
    one   = { 1 },
    two   = { 2 },
    three = { 3 },
    five  = { 5 },
    eight = { 8 },
)]
fn tree_is_rooted_with_n_minus_one_edges(n: u32) {
    let topo = Topology::build(n);
    assert_eq!(topo.parent[&Rank::new(0)], None, "rank 0 must be the tree root");
    let edges: usize = topo.parent.values().filter(|p| p.is_some()).count();
    assert_eq!(edges as u32, n.saturating_sub(1));

    for (&rank, &parent) in &topo.parent {
        if let Some(parent) = parent {
            assert!(topo.tree[&parent].contains(&rank), "{rank:?} not listed as a child of its parent {parent:?}");
        }
    }
}

#[test]
fn topology_is_deterministic() {
    let a = Topology::build(7);
    let b = Topology::build(7);
    assert_eq!(a, b);
}

#[test]
fn empty_world_has_empty_maps() {
    let topo = Topology::build(0);
    assert!(topo.tree.is_empty());
    assert!(topo.parent.is_empty());
    assert!(topo.ring.is_empty());
}

#[test]
fn single_worker_rings_to_itself() {
    let topo = Topology::build(1);
    assert_eq!(topo.ring[&Rank::new(0)], (Rank::new(0), Rank::new(0)));
    assert_eq!(topo.parent[&Rank::new(0)], None);
}
