// SPDX-License-Identifier: MIT

//! Server loop (spec §4.H): bind TCP, accept connections, assign each a
//! monotonic worker-id, and spawn its dispatcher task.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use tracker_core::WorkerId;

use crate::handler;
use crate::job::Job;

/// Accepts connections and owns the shared `Job` handed to every handler.
pub struct Server {
    listener: TcpListener,
    job: Arc<Job>,
    next_worker_id: AtomicU32,
}

impl Server {
    /// Bind to `addr`. Rust's `TcpListener` already listens with a backlog
    /// of 128 on the platforms this targets, meeting spec §4.H's floor
    /// without reaching for a socket-options crate for one constant.
    pub async fn bind(addr: SocketAddr, job: Arc<Job>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, job, next_worker_id: AtomicU32::new(0) })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one spawned task per connection (spec
    /// §5: "one concurrent task per connection"). A failed accept is
    /// logged and never brings down the server.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let worker_id = WorkerId::new(self.next_worker_id.fetch_add(1, Ordering::SeqCst));
                    info!(%peer, %worker_id, "accepted connection");
                    let job = Arc::clone(&self.job);
                    tokio::spawn(async move {
                        if let Err(e) = handler::handle_connection(stream, job, worker_id).await {
                            error!(%worker_id, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept failed"),
            }
        }
    }
}
