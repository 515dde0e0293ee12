// SPDX-License-Identifier: MIT

//! The `RDC_*` environment dictionary handed to launchers so they can exec
//! worker processes (spec §4.H, §6). The launcher itself is out of scope;
//! this module only computes the key/value pairs.

use std::collections::BTreeMap;
use std::time::Duration;

const SHMEM_SIZE: &str = "1024";
const RDMA_BUFSIZE: &str = "33554432";
const BACKEND: &str = "TCP";

/// Build the worker environment dictionary. `restart` is `Some(n_new)`
/// when this is an elastic restart joining an already-running job
/// (`RDC_RESTART=1`, `RDC_PENDING_NODES=<n_new>`); `None` for a fresh job.
pub fn build(
    host_ip: &str,
    port: u16,
    nworker: u32,
    heartbeat_interval: Duration,
    restart: Option<u32>,
) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("RDC_TRACKER_URI".to_string(), host_ip.to_string());
    env.insert("RDC_TRACKER_PORT".to_string(), port.to_string());
    env.insert("RDC_NUM_WORKERS".to_string(), nworker.to_string());
    env.insert("RDC_HEARTBEAT_INTERVAL".to_string(), heartbeat_interval.as_millis().to_string());
    env.insert("RDC_SHMEM_SIZE".to_string(), SHMEM_SIZE.to_string());
    env.insert("RDC_RDMA_BUFSIZE".to_string(), RDMA_BUFSIZE.to_string());
    env.insert("RDC_BACKEND".to_string(), BACKEND.to_string());
    if let Some(n_new) = restart {
        env.insert("RDC_RESTART".to_string(), "1".to_string());
        env.insert("RDC_PENDING_NODES".to_string(), n_new.to_string());
    }
    env
}

#[cfg(test)]
mod worker_env_tests;
