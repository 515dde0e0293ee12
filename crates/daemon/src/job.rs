// SPDX-License-Identifier: MIT

//! Process-wide mutable job state (spec §3), owned by the server loop and
//! shared with every connection handler as `Arc<Job>` — never a module
//! global (spec §9).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracker_core::{Rank, Rendezvous, Topology, WorkerId, UNASSIGNED_RANK};

/// Per-named-group registration state (spec §3: `names`, `name_to_ranks`,
/// `name_to_barrier_counter`/`cond`, and `comm_added`'s initialization),
/// all guarded by one lock matching spec §5's `register_lock`.
#[derive(Default)]
struct RegisterState {
    names: HashSet<String>,
    name_to_ranks: HashMap<String, HashSet<Rank>>,
    name_to_barrier: HashMap<String, Arc<Rendezvous>>,
}

/// The state of one coordinated run, created on tracker construction and
/// living for its duration (spec §3).
pub struct Job {
    heartbeat_interval: Duration,

    nworker: AtomicU32,
    addrs: Mutex<BTreeMap<Rank, String>>,
    addr_to_ranks: Mutex<HashMap<String, Vec<Rank>>>,
    worker_id_to_rank: Mutex<BTreeMap<WorkerId, i32>>,
    topology: RwLock<Topology>,

    dead_nodes: Mutex<BTreeSet<Rank>>,
    pending_nodes: AtomicU32,

    checkpoints: Mutex<HashMap<Rank, Vec<u8>>>,
    last_heartbeat: Mutex<HashMap<WorkerId, Instant>>,

    register: Mutex<RegisterState>,

    last_comm: Mutex<Option<String>>,
    pending_comms: Mutex<VecDeque<String>>,
    comm_added: Mutex<HashSet<String>>,

    rank_rendezvous: Rendezvous,
    addr_rendezvous: Rendezvous,
    restart_rendezvous: Rendezvous,
    unexclude_rendezvous: Rendezvous,
}

/// Outcome of `start`/`restart`'s peer-discovery reply (spec §4.E.1 step 5,
/// §4.I): everything a handler needs to write the reply, already computed
/// under lock.
pub struct StartOutcome {
    pub dead_nodes: Vec<Rank>,
    pub pending_nodes: u32,
    pub peers_with_same_addr: Vec<Rank>,
    pub nworker: u32,
    pub rank: Rank,
    /// `(addr, rank)` for every rank below `rank`, ascending.
    pub lower_peers: Vec<(String, Rank)>,
    /// Every rank above `rank`, ascending.
    pub higher_peers: Vec<Rank>,
}

/// Outcome of `exclude` (spec §4.E.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludeOutcome {
    Done,
    Undone,
}

impl Job {
    pub fn new(nworker: u32, heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            nworker: AtomicU32::new(nworker),
            addrs: Mutex::new(BTreeMap::new()),
            addr_to_ranks: Mutex::new(HashMap::new()),
            worker_id_to_rank: Mutex::new(BTreeMap::new()),
            topology: RwLock::new(Topology::build(nworker)),
            dead_nodes: Mutex::new(BTreeSet::new()),
            pending_nodes: AtomicU32::new(0),
            checkpoints: Mutex::new(HashMap::new()),
            last_heartbeat: Mutex::new(HashMap::new()),
            register: Mutex::new(RegisterState::default()),
            last_comm: Mutex::new(None),
            pending_comms: Mutex::new(VecDeque::new()),
            comm_added: Mutex::new(HashSet::new()),
            rank_rendezvous: Rendezvous::new(),
            addr_rendezvous: Rendezvous::new(),
            restart_rendezvous: Rendezvous::new(),
            unexclude_rendezvous: Rendezvous::new(),
        }
    }

    pub fn nworker(&self) -> u32 {
        self.nworker.load(Ordering::SeqCst)
    }

    pub fn pending_nodes(&self) -> u32 {
        self.pending_nodes.load(Ordering::SeqCst)
    }

    pub fn dead_nodes(&self) -> Vec<Rank> {
        self.dead_nodes.lock().iter().copied().collect()
    }

    pub fn topology(&self) -> Topology {
        self.topology.read().clone()
    }

    pub fn note_connection(&self, worker_id: WorkerId, now: Instant) {
        self.last_heartbeat.lock().insert(worker_id, now);
        self.worker_id_to_rank.lock().insert(worker_id, UNASSIGNED_RANK);
    }

    pub fn on_disconnect(&self, worker_id: WorkerId) {
        self.last_heartbeat.lock().remove(&worker_id);
    }

    /// §4.E.1 step 2: the elastic-restart join rendezvous. Waits until
    /// `n_new_worker` restart-joiners have all called this, then the
    /// arriving-last caller bumps `nworker` and sets `pending_nodes`.
    pub async fn join_restart(&self, n_new_worker: u32) {
        self.restart_rendezvous
            .arrive(n_new_worker, || {
                self.nworker.fetch_add(n_new_worker, Ordering::SeqCst);
                self.pending_nodes.store(n_new_worker, Ordering::SeqCst);
                *self.topology.write() = Topology::build(self.nworker());
            })
            .await;
    }

    /// §4.E.1 steps 1-4: record the worker's declared rank/address,
    /// rendezvous on rank assignment, then rendezvous on the address
    /// table's completion. Returns the worker's assigned rank.
    pub async fn start(&self, worker_id: WorkerId, requested_rank: i32, addr: String) -> Rank {
        self.worker_id_to_rank.lock().insert(worker_id, requested_rank);

        let n = self.nworker();
        self.rank_rendezvous
            .arrive(n, || {
                self.realloc_ranks();
                self.pending_nodes.store(0, Ordering::SeqCst);
            })
            .await;

        let rank = Rank::new(*self.worker_id_to_rank.lock().get(&worker_id).unwrap_or(&UNASSIGNED_RANK) as u32);

        self.addrs.lock().insert(rank, addr);
        let n = self.nworker();
        self.addr_rendezvous
            .arrive(n, || {
                self.rebuild_addr_to_ranks();
            })
            .await;

        rank
    }

    /// §4.E.1 step 5: compute everything the reply needs once `start`
    /// rendezvous has completed for `rank`.
    pub fn start_outcome(&self, rank: Rank, addr: &str) -> StartOutcome {
        let peers_with_same_addr =
            self.addr_to_ranks.lock().get(addr).cloned().unwrap_or_default();

        let addrs = self.addrs.lock();
        let mut lower_peers = Vec::new();
        let mut higher_peers = Vec::new();
        for (&peer_rank, peer_addr) in addrs.iter() {
            if peer_rank < rank {
                lower_peers.push((peer_addr.clone(), peer_rank));
            } else if peer_rank > rank {
                higher_peers.push(peer_rank);
            }
        }

        StartOutcome {
            dead_nodes: self.dead_nodes(),
            pending_nodes: self.pending_nodes(),
            peers_with_same_addr,
            nworker: self.nworker(),
            rank,
            lower_peers,
            higher_peers,
        }
    }

    /// Every `rank = -1` entry in `worker_id_to_rank` gets the smallest
    /// unused non-negative integer not already present among existing
    /// ranks (spec §4.E.1 step 3). Iterates `worker_id_to_rank` in
    /// ascending `WorkerId` order for determinism.
    fn realloc_ranks(&self) {
        let mut map = self.worker_id_to_rank.lock();
        let mut existing: HashSet<i32> =
            map.values().copied().filter(|&r| r != UNASSIGNED_RANK).collect();
        let mut next_rank = 0i32;
        let unassigned: Vec<WorkerId> =
            map.iter().filter(|(_, &r)| r == UNASSIGNED_RANK).map(|(&id, _)| id).collect();
        for worker_id in unassigned {
            while existing.contains(&next_rank) {
                next_rank += 1;
            }
            map.insert(worker_id, next_rank);
            existing.insert(next_rank);
            next_rank += 1;
        }
    }

    fn rebuild_addr_to_ranks(&self) {
        let addrs = self.addrs.lock();
        let mut inverted: HashMap<String, Vec<Rank>> = HashMap::new();
        for (&rank, addr) in addrs.iter() {
            inverted.entry(addr.clone()).or_default().push(rank);
        }
        *self.addr_to_ranks.lock() = inverted;
    }

    /// §4.E.2: idempotently create a named group and add `rank` to it.
    pub fn register(&self, name: &str, rank: Rank) {
        let mut state = self.register.lock();
        if !state.names.contains(name) {
            state.names.insert(name.to_string());
            state.name_to_ranks.insert(name.to_string(), HashSet::new());
            state.name_to_barrier.insert(name.to_string(), Arc::new(Rendezvous::new()));
        }
        state.name_to_ranks.entry(name.to_string()).or_default().insert(rank);
    }

    /// §4.E.3: per-name N-party barrier. Barrier on a name nobody has
    /// `register`ed is the "command arriving in the wrong state" protocol
    /// fault named in spec §7 — the caller must close the connection.
    pub async fn barrier(&self, name: &str) -> Result<(), NotRegistered> {
        let rendezvous = {
            let state = self.register.lock();
            state.name_to_barrier.get(name).cloned()
        };
        let rendezvous = rendezvous.ok_or(NotRegistered)?;
        let n = self.nworker();
        rendezvous.arrive(n, || {}).await;
        Ok(())
    }

    /// §4.E.4 `exclude`: at most one name holds the lock at a time;
    /// `pending_comms` is a FIFO queue (spec's Open Question, resolved in
    /// DESIGN.md) rather than an unordered set, so long-queued names
    /// cannot starve behind repeatedly-rejoining ones. Unlike `barrier`,
    /// `exclude`/`unexclude` are not gated on a prior `register` call —
    /// spec §8 scenario 3 exercises them with no registration step, and
    /// §4.E.4 never names registration as a precondition.
    pub fn exclude(&self, name: &str) -> ExcludeOutcome {
        let mut last_comm = self.last_comm.lock();
        if last_comm.as_deref() == Some(name) {
            return ExcludeOutcome::Done;
        }
        if last_comm.is_none() {
            *last_comm = Some(name.to_string());
            return ExcludeOutcome::Done;
        }
        let mut comm_added = self.comm_added.lock();
        if comm_added.insert(name.to_string()) {
            self.pending_comms.lock().push_back(name.to_string());
        }
        ExcludeOutcome::Undone
    }

    /// §4.E.4 `unexclude`: an N-party rendezvous; the arriving-last caller
    /// pops the next pending name (FIFO) into `last_comm`, or clears it.
    pub async fn unexclude(&self) {
        let n = self.nworker();
        self.unexclude_rendezvous
            .arrive(n, || {
                let mut last_comm = self.last_comm.lock();
                let popped = self.pending_comms.lock().pop_front();
                if let Some(name) = &popped {
                    self.comm_added.lock().remove(name);
                }
                *last_comm = popped;
            })
            .await;
    }

    /// §4.F: record a heartbeat from `worker_id`.
    pub fn note_heartbeat(&self, worker_id: WorkerId, now: Instant) {
        self.last_heartbeat.lock().insert(worker_id, now);
    }

    /// §4.F: a watchdog calls this every `HEARTBEAT_INTERVAL`; if the
    /// deadline (`2 x HEARTBEAT_INTERVAL`) has passed since the worker's
    /// last heartbeat, its rank joins `dead_nodes` (monotonically: never
    /// silently removed, spec §3 invariant 5).
    pub fn check_deadline(&self, worker_id: WorkerId, rank: Option<Rank>, now: Instant) {
        let last = match self.last_heartbeat.lock().get(&worker_id).copied() {
            Some(last) => last,
            None => return,
        };
        if is_expired(last, now, self.heartbeat_interval) {
            if let Some(rank) = rank {
                self.dead_nodes.lock().insert(rank);
            }
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn rank_of(&self, worker_id: WorkerId) -> Option<Rank> {
        match self.worker_id_to_rank.lock().get(&worker_id).copied() {
            Some(r) if r != UNASSIGNED_RANK => Some(Rank::new(r as u32)),
            _ => None,
        }
    }

    /// §4.G `checkpoint`: overwrite the blob for `rank`.
    pub fn checkpoint(&self, rank: Rank, blob: Vec<u8>) {
        self.checkpoints.lock().insert(rank, blob);
    }

    /// §4.G `load_checkpoint`: returns `None` if no blob is stored for
    /// `rank` — the caller logs a warning and sends no reply, per spec's
    /// documented (if worker-desynchronizing) behavior.
    pub fn load_checkpoint(&self, rank: Rank) -> Option<Vec<u8>> {
        self.checkpoints.lock().get(&rank).cloned()
    }
}

/// `barrier`/`exclude` on a name with no prior `register` call (spec §7:
/// "a command arriving in the wrong state").
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("name was never registered")]
pub struct NotRegistered;

/// Pure deadline check (spec §4.F): `now - last > 2 x interval`. Kept
/// free of any I/O so the failure detector is testable without real
/// sleeps — feed it hand-constructed `Instant`s directly.
pub fn is_expired(last: Instant, now: Instant, interval: Duration) -> bool {
    now.saturating_duration_since(last) > interval * 2
}

#[cfg(test)]
mod job_tests;
