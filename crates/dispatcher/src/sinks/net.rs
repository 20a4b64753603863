//! UDP socket helpers shared by the OSC and plain UDP sinks

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::DispatcherError;

/// Resolve `host:port` to the first address returned
pub async fn resolve_target(host: &str, port: u16) -> Result<SocketAddr, DispatcherError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| DispatcherError::Resolve {
            target: format!("{host}:{port}"),
        })
}

/// Bind an ephemeral local socket matching the target's address family
///
/// The socket has `SO_REUSEADDR` set.
pub fn bind_udp(target: SocketAddr) -> Result<UdpSocket, DispatcherError> {
    let socket = Socket::new(Domain::for_address(target), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;

    let local: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    socket.bind(&local.into())?;

    Ok(UdpSocket::from_std(socket.into())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_localhost() {
        let addr = resolve_target("127.0.0.1", 5005).await.unwrap();
        assert_eq!(addr, "127.0.0.1:5005".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_bind_matches_family() {
        let target: SocketAddr = "127.0.0.1:5005".parse().unwrap();
        let socket = bind_udp(target).unwrap();
        assert!(socket.local_addr().unwrap().is_ipv4());
    }

    #[tokio::test]
    async fn test_bind_sets_reuse_address() {
        let target: SocketAddr = "127.0.0.1:5005".parse().unwrap();
        let socket = bind_udp(target).unwrap();
        assert!(socket2::SockRef::from(&socket).reuse_address().unwrap());
    }
}
