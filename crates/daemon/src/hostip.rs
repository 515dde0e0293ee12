// SPDX-License-Identifier: MIT

//! Host-IP and port resolution for the server loop's bootstrap (spec
//! §4.H). Pure I/O helpers; no job state touched here.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use clap::ValueEnum;

/// How to resolve the host address advertised to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum HostIpMode {
    /// Resolve a routable IP, falling back to a UDP-socket probe if the
    /// hostname only resolves to loopback.
    #[default]
    Auto,
    /// Spec treats `"auto"` and `"ip"` identically.
    Ip,
    /// Report the resolved hostname string rather than an IP address.
    Dns,
}

/// Resolve the host address to advertise to workers, per `mode`.
///
/// Rust's standard library exposes host resolution only through
/// `ToSocketAddrs` (`getaddrinfo` under the hood), not separate
/// `gethostbyname`/`gethostname` calls — this collapses the source's
/// two-step fallback into one resolution over the local hostname, which
/// is observably equivalent for every hostname configuration the source
/// handles. The loopback fallback (a UDP socket "connected" to a
/// non-routed address so the OS reports the outbound-routing local IP)
/// is unchanged.
pub fn resolve_host_ip(mode: HostIpMode) -> io::Result<String> {
    match mode {
        HostIpMode::Dns => fqdn(),
        HostIpMode::Auto | HostIpMode::Ip => {
            let ip = resolve_ipv4(&fqdn()?)?;
            if ip.is_loopback() {
                Ok(udp_probe_ip()?.to_string())
            } else {
                Ok(ip.to_string())
            }
        }
    }
}

fn fqdn() -> io::Result<String> {
    hostname::get()?
        .into_string()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "hostname is not valid UTF-8"))
}

/// Resolve `name` to its first IPv4 address via the system resolver.
fn resolve_ipv4(name: &str) -> io::Result<Ipv4Addr> {
    (name, 0u16)
        .to_socket_addrs()?
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no IPv4 address for host"))
}

/// Discover the local outbound IP by "connecting" a UDP socket to a
/// non-routed address and reading back the OS-chosen local endpoint.
fn udp_probe_ip() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect((Ipv4Addr::new(10, 255, 255, 255), 0))?;
    Ok(socket.local_addr()?.ip())
}

/// Resolve the listen port. `None` is the wire protocol's `-1`
/// ("pick any free port"): probe a UDP socket for an OS-assigned free
/// port and report that, mirroring the source's bind-a-UDP-probe-socket
/// trick rather than letting the TCP listener itself pick (so the chosen
/// port is known before the TCP bind happens).
pub fn resolve_port(requested: Option<u16>) -> io::Result<u16> {
    match requested {
        Some(port) => Ok(port),
        None => {
            let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
            Ok(socket.local_addr()?.port())
        }
    }
}

/// Build the listen address the spec calls for binding TCP to: the
/// resolved `host_ip` (not a wildcard address), paired with `port`.
/// `host_ip` is usually already a dotted-quad (what `resolve_host_ip`
/// returns in `Auto`/`Ip` mode), but `Dns` mode returns a hostname, so an
/// address that fails to parse as an `IpAddr` is resolved the same way
/// `resolve_ipv4` resolves any other hostname.
pub fn bind_addr(host_ip: &str, port: u16) -> io::Result<SocketAddr> {
    let ip = match host_ip.parse::<IpAddr>() {
        Ok(ip) => ip,
        Err(_) => IpAddr::V4(resolve_ipv4(host_ip)?),
    };
    Ok(SocketAddr::from((ip, port)))
}

#[cfg(test)]
mod hostip_tests;
