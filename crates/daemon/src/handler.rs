// SPDX-License-Identifier: MIT

//! Per-connection command dispatcher (spec §4.C/D).
//!
//! The source drives a two-state `FIN -> CMD -> FIN` machine in which
//! `handle()` runs twice per command; spec §9 calls that "an artifact, not
//! a protocol feature" and recommends a plain loop instead, which is what
//! this does: read a command word, dispatch it against the shared `Job`,
//! repeat until `shutdown` or disconnect.

use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tracker_core::{Rank, WorkerId};
use tracker_wire::{Command, FramedStream, FramingError, PROTOCOL_VERSION};

use crate::error::{DaemonConnError, ProtocolFault};
use crate::job::{ExcludeOutcome, Job};

/// State owned exclusively by one connection's handler (spec §3
/// `Connection`): the worker-id stamped at accept time, and the rank
/// filled in once `start`/`restart` completes.
struct ConnState {
    worker_id: WorkerId,
    rank: Option<Rank>,
}

/// Drive one accepted connection to completion.
pub async fn handle_connection<S>(
    stream: S,
    job: Arc<Job>,
    worker_id: WorkerId,
) -> Result<(), DaemonConnError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = FramedStream::new(stream);
    let got = stream.read_version().await?;
    if got != PROTOCOL_VERSION {
        warn!(got, expected = PROTOCOL_VERSION, "protocol version mismatch, dropping connection");
        return Err(FramingError::VersionMismatch { got, expected: PROTOCOL_VERSION }.into());
    }

    job.note_connection(worker_id, Instant::now());
    let cancel = CancellationToken::new();
    let watchdog = spawn_heartbeat_watchdog(Arc::clone(&job), worker_id, cancel.clone());

    let mut state = ConnState { worker_id, rank: None };
    let result = dispatch_loop(&mut stream, &job, &mut state).await;

    cancel.cancel();
    watchdog.abort();
    job.on_disconnect(worker_id);

    match &result {
        Ok(()) => debug!(worker_id = %worker_id, "connection closed"),
        Err(e) => warn!(worker_id = %worker_id, error = %e, "connection dropped"),
    }
    result
}

async fn dispatch_loop<S>(
    stream: &mut FramedStream<S>,
    job: &Arc<Job>,
    state: &mut ConnState,
) -> Result<(), DaemonConnError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let verb = match stream.recv_string().await {
            Ok(v) => v,
            Err(FramingError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let Some(command) = Command::parse(&verb) else {
            warn!(worker_id = %state.worker_id, verb, "unknown command, dropping connection");
            return Err(ProtocolFault::UnknownCommand(verb).into());
        };

        if matches!(command, Command::Heartbeat) {
            debug!(worker_id = %state.worker_id, %command, "dispatching command");
        } else {
            info!(worker_id = %state.worker_id, %command, "dispatching command");
        }

        match command {
            Command::Start => {
                let requested_rank = stream.recv_int().await?;
                let addr = stream.recv_string().await?;
                let rank = job.start(state.worker_id, requested_rank, addr.clone()).await;
                state.rank = Some(rank);
                reply_start_outcome(stream, job, rank, &addr).await?;
            }
            Command::Restart => {
                let n_new = stream.recv_int().await?;
                let requested_rank = stream.recv_int().await?;
                let addr = stream.recv_string().await?;
                if n_new > 0 {
                    job.join_restart(n_new as u32).await;
                }
                let rank = job.start(state.worker_id, requested_rank, addr.clone()).await;
                state.rank = Some(rank);
                reply_start_outcome(stream, job, rank, &addr).await?;
            }
            Command::Register => {
                let name = stream.recv_string().await?;
                let rank = state.rank.ok_or(ProtocolFault::NotStarted)?;
                job.register(&name, rank);
            }
            Command::Barrier => {
                let name = stream.recv_string().await?;
                job.barrier(&name).await.map_err(ProtocolFault::from)?;
                stream.send_string("barrier_done").await?;
            }
            Command::Exclude => {
                let name = stream.recv_string().await?;
                let reply = match job.exclude(&name) {
                    ExcludeOutcome::Done => "exclude_done",
                    ExcludeOutcome::Undone => "exclude_undone",
                };
                stream.send_string(reply).await?;
            }
            Command::Unexclude => {
                // The name itself plays no role in unexclude's rendezvous
                // (it is the arriving-last caller that picks the next
                // pending name, spec §4.E.4) but every exchange on the
                // wire still carries it.
                let _name = stream.recv_string().await?;
                job.unexclude().await;
                stream.send_string("unexclude_done").await?;
            }
            Command::Heartbeat => {
                job.note_heartbeat(state.worker_id, Instant::now());
                stream.send_string("heartbeat_done").await?;
                let dead = job.dead_nodes();
                stream.send_int(dead.len() as i32).await?;
                for r in &dead {
                    stream.send_int(r.get() as i32).await?;
                }
                stream.send_int(job.pending_nodes() as i32).await?;
            }
            Command::Print => {
                let msg = stream.recv_string().await?;
                info!(worker_id = %state.worker_id, "{msg}");
            }
            Command::Checkpoint => {
                let blob = stream.recv_bytes().await?;
                let rank = state.rank.ok_or(ProtocolFault::NotStarted)?;
                job.checkpoint(rank, blob);
            }
            Command::LoadCheckpoint => {
                let rank = state.rank.ok_or(ProtocolFault::NotStarted)?;
                match job.load_checkpoint(rank) {
                    Some(blob) => stream.send_bytes(&blob).await?,
                    None => warn!(
                        worker_id = %state.worker_id, rank = %rank,
                        "load_checkpoint requested with no stored blob; sending no reply"
                    ),
                }
            }
            Command::Shutdown => {
                debug!(worker_id = %state.worker_id, "shutdown requested, closing connection");
                return Ok(());
            }
        }
        stream.flush().await?;
    }
}

/// §4.E.1 step 5 / §4.I: everything a `start`/`restart` reply sends, in
/// order, once the rendezvous has completed for `rank`.
async fn reply_start_outcome<S>(
    stream: &mut FramedStream<S>,
    job: &Job,
    rank: Rank,
    addr: &str,
) -> Result<(), FramingError>
where
    S: AsyncWrite + Unpin,
{
    let outcome = job.start_outcome(rank, addr);

    stream.send_int(outcome.dead_nodes.len() as i32).await?;
    for r in &outcome.dead_nodes {
        stream.send_int(r.get() as i32).await?;
    }
    stream.send_int(outcome.pending_nodes as i32).await?;
    stream.send_int(outcome.peers_with_same_addr.len() as i32).await?;
    for r in &outcome.peers_with_same_addr {
        stream.send_int(r.get() as i32).await?;
    }
    stream.send_int(outcome.nworker as i32).await?;
    stream.send_int(outcome.rank.get() as i32).await?;
    stream.send_int(outcome.lower_peers.len() as i32).await?;
    stream.send_int(outcome.higher_peers.len() as i32).await?;
    for (peer_addr, peer_rank) in &outcome.lower_peers {
        stream.send_string(peer_addr).await?;
        stream.send_int(peer_rank.get() as i32).await?;
    }
    for peer_rank in &outcome.higher_peers {
        stream.send_int(peer_rank.get() as i32).await?;
    }
    Ok(())
}

/// §4.F: one watchdog task per connection, polling every
/// `HEARTBEAT_INTERVAL` and declaring the worker dead past `2x` that
/// interval since its last heartbeat. Runs independently of the socket —
/// it only touches `Job`'s heartbeat bookkeeping — so it never competes
/// with the dispatch loop's reads for the connection's bytes.
fn spawn_heartbeat_watchdog(
    job: Arc<Job>,
    worker_id: WorkerId,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let period = job.heartbeat_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    let rank = job.rank_of(worker_id);
                    job.check_deadline(worker_id, rank, Instant::now());
                }
            }
        }
    })
}

#[cfg(test)]
mod handler_tests;
