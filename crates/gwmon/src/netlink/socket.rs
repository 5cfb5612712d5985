//! Low-level non-blocking rtnetlink socket.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result, SetupStage};

/// Receive buffer size; large enough for one kernel dump datagram.
const RECV_BUF_SIZE: usize = 32768;

/// Non-blocking `NETLINK_ROUTE` socket registered with the tokio reactor.
pub struct NetlinkSocket {
    /// The underlying async file descriptor.
    fd: AsyncFd<Socket>,
    /// Sequence number counter.
    seq: AtomicU32,
    /// Local port ID (assigned by kernel).
    pid: u32,
}

impl NetlinkSocket {
    /// Create a route socket bound to a kernel-assigned port ID.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE)
            .map_err(|e| Error::setup(SetupStage::Socket, e))?;
        socket
            .set_non_blocking(true)
            .map_err(|e| Error::setup(SetupStage::NonBlocking, e))?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket
            .bind(&addr)
            .map_err(|e| Error::setup(SetupStage::Bind, e))?;
        socket
            .get_address(&mut addr)
            .map_err(|e| Error::setup(SetupStage::Bind, e))?;
        let pid = addr.port_number();

        let fd = AsyncFd::new(socket).map_err(|e| Error::setup(SetupStage::Register, e))?;

        Ok(Self {
            fd,
            seq: AtomicU32::new(initial_seq()),
            pid,
        })
    }

    /// Get the next sequence number; the first one is the seed plus one.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Subscribe to a multicast group.
    pub fn add_membership(&mut self, group: u32) -> Result<()> {
        self.fd
            .get_mut()
            .add_membership(group)
            .map_err(|e| Error::setup(SetupStage::Membership, e))
    }

    /// Send a message without waiting for writability.
    ///
    /// Requests to the kernel are accepted or rejected immediately, so a
    /// full socket buffer is reported as an error rather than awaited.
    pub fn try_send(&self, msg: &[u8]) -> Result<()> {
        let sent = self.fd.get_ref().send(msg, 0).map_err(Error::Send)?;
        if sent != msg.len() {
            return Err(Error::Send(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {} of {} bytes", sent, msg.len()),
            )));
        }
        Ok(())
    }

    /// Receive one datagram if one is queued.
    ///
    /// Returns `Ok(None)` when the socket would block. Readiness is cleared
    /// only then, so a receive error leaves the socket readable and any
    /// datagrams behind it are picked up on the next wakeup.
    pub fn try_recv(&self) -> Result<Option<Vec<u8>>> {
        let mut buf = BytesMut::with_capacity(RECV_BUF_SIZE);
        let mut cx = Context::from_waker(Waker::noop());

        loop {
            let mut guard = match self.fd.poll_read_ready(&mut cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Err(e.into()),
                Poll::Pending => return Ok(None),
            };

            match guard.try_io(|inner| inner.get_ref().recv(&mut buf, 0)) {
                // buf has been advanced by recv, so buf[..] contains the data
                Ok(Ok(_n)) => return Ok(Some(buf.to_vec())),
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => return Ok(None),
            }
        }
    }

    /// Wait until the socket is readable.
    ///
    /// Resolves immediately while readiness is still set; callers must drain
    /// with [`try_recv`](Self::try_recv) until it returns `None`.
    pub async fn readable(&self) -> Result<()> {
        let _guard = self.fd.readable().await?;
        Ok(())
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

/// Sequence seed: the current Unix time in seconds.
fn initial_seq() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(1)
        .max(1)
}

/// Multicast groups for NETLINK_ROUTE.
pub mod rtnetlink_groups {
    pub const RTNLGRP_IPV4_ROUTE: u32 = 7;
}
