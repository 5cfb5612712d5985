//! Route channel: the monitor's only view of the kernel.

use std::future::Future;

use super::builder::MessageBuilder;
use super::error::Result;
use super::message::NlMsgType;
use super::route::RtMsg;
use super::socket::NetlinkSocket;

/// A subscribed route socket.
pub trait RouteChannel {
    /// Local port ID, echoed by the kernel in replies to our requests.
    fn port_id(&self) -> u32;

    /// Request a full route table dump for `family`.
    ///
    /// Returns the sequence number of the request.
    fn send_dump_request(&mut self, family: u8) -> Result<u32>;

    /// Take the next queued datagram, or `None` when the queue is empty.
    fn receive(&mut self) -> Result<Option<Vec<u8>>>;

    /// Wait until datagrams may be queued.
    ///
    /// After this resolves the caller must drain with
    /// [`receive`](Self::receive) until it returns `None`. A drain cut short
    /// by an error leaves the channel readable, so this resolves again.
    fn readable(&self) -> impl Future<Output = Result<()>>;
}

/// Route socket subscribed to one rtnetlink multicast group.
pub struct NetlinkChannel {
    socket: NetlinkSocket,
}

impl NetlinkChannel {
    /// Open a route socket and join `group`.
    ///
    /// Every failure is a [`Setup`](super::Error::Setup) error naming the
    /// stage. Must be called from within a tokio runtime.
    pub fn open(group: u32) -> Result<Self> {
        let mut socket = NetlinkSocket::new()?;
        socket.add_membership(group)?;
        tracing::debug!(pid = socket.pid(), group, "route channel open");
        Ok(Self { socket })
    }
}

impl RouteChannel for NetlinkChannel {
    fn port_id(&self) -> u32 {
        self.socket.pid()
    }

    fn send_dump_request(&mut self, family: u8) -> Result<u32> {
        let seq = self.socket.next_seq();
        let mut builder = MessageBuilder::dump(NlMsgType::RTM_GETROUTE);
        builder.append(&RtMsg::new().with_family(family));
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());
        self.socket.try_send(&builder.finish())?;
        tracing::trace!(seq, "sent route dump request");
        Ok(seq)
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        self.socket.try_recv()
    }

    async fn readable(&self) -> Result<()> {
        self.socket.readable().await
    }
}
