//! Captive-style DNS responder for access-point mode.
//!
//! Clients joining the setup network are not configured with the device's
//! custom name, so instead of mDNS the device answers *every* DNS query with
//! its own address, steering browsers to the config UI.

use std::io;
use std::net::{Ipv4Addr, UdpSocket};

use anyhow::{Context, Result};
use log::{info, warn};

/// Standard DNS port.
pub const DNS_PORT: u16 = 53;

/// Answer TTL. Short, so clients re-resolve quickly after the device leaves
/// access-point mode.
const ANSWER_TTL_SECS: u32 = 60;

/// Classic DNS-over-UDP message ceiling.
const MAX_PACKET: usize = 512;

/// Nonblocking catch-all responder. Bound once when access-point mode comes
/// up, drained by `poll()` every main-loop tick.
pub struct CaptiveDns {
    socket: UdpSocket,
    addr: Ipv4Addr,
}

impl CaptiveDns {
    pub fn bind(addr: Ipv4Addr) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", DNS_PORT))
            .with_context(|| format!("could not bind UDP port {DNS_PORT}"))?;
        socket
            .set_nonblocking(true)
            .context("could not make DNS socket nonblocking")?;
        info!("Captive DNS responder up, answering every query with {addr}");
        Ok(Self { socket, addr })
    }

    /// Drain and answer all pending queries.
    pub fn poll(&mut self) -> Result<()> {
        let mut buf = [0u8; MAX_PACKET];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, peer)) => {
                    if let Some(reply) = answer_query(&buf[..len], self.addr) {
                        if let Err(e) = self.socket.send_to(&reply, peer) {
                            warn!("DNS reply to {peer} failed: {e}");
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e).context("DNS socket receive failed"),
            }
        }
    }
}

/// Build a response resolving the query's first question to `addr`.
///
/// Returns `None` for packets that are not plain A or ANY queries
/// (responses, other opcodes or record types, truncated or compressed
/// questions) — those are dropped silently.
pub fn answer_query(query: &[u8], addr: Ipv4Addr) -> Option<Vec<u8>> {
    if query.len() < 12 {
        return None;
    }
    let flags = u16::from_be_bytes([query[2], query[3]]);
    if flags & 0x8000 != 0 {
        // already a response
        return None;
    }
    if (flags >> 11) & 0xF != 0 {
        // only standard queries
        return None;
    }
    let qdcount = u16::from_be_bytes([query[4], query[5]]);
    if qdcount == 0 {
        return None;
    }

    // Walk the first question's name labels.
    let mut pos = 12;
    loop {
        let len = *query.get(pos)? as usize;
        if len == 0 {
            pos += 1;
            break;
        }
        if len & 0xC0 != 0 {
            // compression pointers don't appear in questions we care about
            return None;
        }
        pos += 1 + len;
    }
    let question_end = pos + 4; // qtype + qclass
    if query.len() < question_end {
        return None;
    }
    let qtype = u16::from_be_bytes([query[pos], query[pos + 1]]);
    // only A and ANY can carry the fixed A answer; drop the rest
    if qtype != 1 && qtype != 255 {
        return None;
    }

    let mut reply = Vec::with_capacity(question_end + 16);
    reply.extend_from_slice(&query[0..2]); // transaction id
    reply.extend_from_slice(&0x8180u16.to_be_bytes()); // response, RD|RA, NOERROR
    reply.extend_from_slice(&1u16.to_be_bytes()); // one question echoed
    reply.extend_from_slice(&1u16.to_be_bytes()); // one answer
    reply.extend_from_slice(&0u16.to_be_bytes()); // no authority records
    reply.extend_from_slice(&0u16.to_be_bytes()); // no additional records
    reply.extend_from_slice(&query[12..question_end]);

    // answer: pointer back to the question name
    reply.extend_from_slice(&[0xC0, 0x0C]);
    reply.extend_from_slice(&1u16.to_be_bytes()); // type A
    reply.extend_from_slice(&1u16.to_be_bytes()); // class IN
    reply.extend_from_slice(&ANSWER_TTL_SECS.to_be_bytes());
    reply.extend_from_slice(&4u16.to_be_bytes());
    reply.extend_from_slice(&addr.octets());
    Some(reply)
}
