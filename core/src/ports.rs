//! Port selection for servers under test.
//!
//! `find_available_ports` asks the OS for free ports; `find_unique_port`
//! derives a port from a test-identity string so parallel tests that know
//! their identity pick different ports without coordinating. Neither result
//! is reserved: the caller is expected to bind straight away.

use std::net::TcpListener;

use crate::error::{HarnessError, Result};

pub const DEFAULT_MINIMUM_PORT: u16 = 3001;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Return `count` distinct ports that were free at the time of the call.
///
/// All listeners are held open until every port has been assigned, so the OS
/// cannot hand out the same port twice.
pub fn find_available_ports(count: usize) -> Result<Vec<u16>> {
    let mut listeners = Vec::with_capacity(count);
    let mut ports = Vec::with_capacity(count);
    for _ in 0..count {
        let listener = TcpListener::bind(("0.0.0.0", 0))
            .map_err(|e| HarnessError::io("0.0.0.0:0", e))?;
        let port = listener
            .local_addr()
            .map_err(|e| HarnessError::io("0.0.0.0:0", e))?
            .port();
        ports.push(port);
        listeners.push(listener);
    }
    drop(listeners);
    Ok(ports)
}

/// Derive a port in `[minimum_port, 65536)` from `identity`.
///
/// Without an identity the minimum port is returned as is. Different
/// identities may collide.
pub fn find_unique_port(identity: Option<&str>, minimum_port: u16) -> u16 {
    let Some(identity) = identity else {
        return minimum_port;
    };
    let span = 65536 - u64::from(minimum_port);
    let offset = fnv1a_64(identity.as_bytes()) % span;
    // offset < span, so the sum stays below 65536.
    (u64::from(minimum_port) + offset) as u16
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}
