// SPDX-License-Identifier: MIT

//! `trackerd` — the collective-communication rendezvous tracker (spec
//! §2). Binds a TCP listener, prints the `RDC_*` environment dictionary a
//! launcher needs to hand to worker processes, then accepts connections
//! until signalled to stop.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod cli;
mod error;
mod handler;
mod hostip;
mod job;
mod server;
mod worker_env;


use std::sync::Arc;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Args;
use job::Job;
use server::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = Args::parse();
    let heartbeat_interval = args.heartbeat_interval();

    let host_ip = hostip::resolve_host_ip(args.host_ip)?;
    let port = hostip::resolve_port(args.requested_port())?;
    let bind_addr = hostip::bind_addr(&host_ip, port)?;

    let job = Arc::new(Job::new(args.nworker, heartbeat_interval));
    let server = Server::bind(bind_addr, Arc::clone(&job)).await?;
    let local_addr = server.local_addr()?;

    info!(%local_addr, nworker = args.nworker, ?heartbeat_interval, "tracker listening");

    // Print the launcher-facing env dictionary (spec §4.H, §6) — one
    // `KEY=VALUE` line per variable, the same shape the source's tracker
    // prints for its job-launcher script to `source`.
    let env = worker_env::build(&host_ip, local_addr.port(), args.nworker, heartbeat_interval, None);
    for (key, value) in &env {
        println!("{key}={value}");
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
