//! Minimal rtnetlink implementation for route monitoring.
//!
//! Only the pieces needed to answer "does the default route go out of this
//! interface" are implemented: a non-blocking route socket with multicast
//! membership, message framing, a decode-or-skip attribute iterator, a dump
//! request builder and the route parsers.
//!
//! # Quick Start
//!
//! ```ignore
//! use gwmon::netlink::{RouteChannel, NetlinkChannel, rtnetlink_groups::RTNLGRP_IPV4_ROUTE};
//!
//! let mut channel = NetlinkChannel::open(RTNLGRP_IPV4_ROUTE)?;
//! let seq = channel.send_dump_request(libc::AF_INET as u8)?;
//!
//! channel.readable().await?;
//! while let Some(datagram) = channel.receive()? {
//!     for msg in gwmon::netlink::MessageIter::new(&datagram) {
//!         let (header, payload) = msg?;
//!         // ...
//!     }
//! }
//! ```

pub mod attr;
mod builder;
pub mod channel;
mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod message;
pub mod parse;
pub mod route;
mod socket;

pub use attr::{AttrIter, NlAttr, SkipReason};
pub use builder::MessageBuilder;
pub use channel::{NetlinkChannel, RouteChannel};
pub use error::{Error, Result, SetupStage};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use parse::FromNetlink;
pub use route::{Relevance, RouteSelector, RtMsg};
pub use socket::{NetlinkSocket, rtnetlink_groups};
