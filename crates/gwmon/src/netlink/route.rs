//! Route message decoding.
//!
//! Two decoders share the fixed `rtmsg` header and the attribute walk:
//!
//! - [`RouteSelector`] decodes a dump reply far enough to decide whether it
//!   is the IPv4 default route of the main table, and through which
//!   interface it leaves.
//! - [`classify_notification`] looks only at the egress interface of a
//!   route-change notification.

use winnow::prelude::*;
use winnow::token::take;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::attr::{AttrIter, get};
use super::error::{Error, Result};
use super::message::{NlMsgHdr, NlMsgType};
use super::parse::{FromNetlink, PResult, cut};
use crate::util::ifname::InterfaceResolver;

/// Main routing table ID (RT_TABLE_MAIN).
pub const RT_TABLE_MAIN: u32 = 254;

/// Attribute IDs for RTA_* constants.
mod attr_ids {
    pub const RTA_OIF: u16 = 4;
    pub const RTA_TABLE: u16 = 15;
}

/// Route message header (struct rtmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtMsg {
    /// Address family.
    pub rtm_family: u8,
    /// Destination prefix length.
    pub rtm_dst_len: u8,
    /// Source prefix length.
    pub rtm_src_len: u8,
    /// TOS filter.
    pub rtm_tos: u8,
    /// Routing table ID.
    pub rtm_table: u8,
    /// Routing protocol (RTPROT_*).
    pub rtm_protocol: u8,
    /// Route scope (RT_SCOPE_*).
    pub rtm_scope: u8,
    /// Route type (RTN_*).
    pub rtm_type: u8,
    /// Route flags.
    pub rtm_flags: u32,
}

impl RtMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new route message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address family.
    pub fn with_family(mut self, family: u8) -> Self {
        self.rtm_family = family;
        self
    }

    /// Set the destination prefix length.
    pub fn with_dst_len(mut self, len: u8) -> Self {
        self.rtm_dst_len = len;
        self
    }

    /// Set the source prefix length.
    pub fn with_src_len(mut self, len: u8) -> Self {
        self.rtm_src_len = len;
        self
    }

    /// Set the routing table.
    pub fn with_table(mut self, table: u8) -> Self {
        self.rtm_table = table;
        self
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: Self::SIZE,
                actual: data.len(),
            })
    }
}

/// Whether a route was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteChange {
    /// RTM_NEWROUTE.
    #[default]
    Added,
    /// RTM_DELROUTE.
    Removed,
}

impl RouteChange {
    /// Map a netlink message type to a route change.
    pub fn from_msg_type(msg_type: u16) -> Option<Self> {
        match msg_type {
            NlMsgType::RTM_NEWROUTE => Some(RouteChange::Added),
            NlMsgType::RTM_DELROUTE => Some(RouteChange::Removed),
            _ => None,
        }
    }
}

/// The subset of a route record needed to recognise the default route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteSelector {
    /// Added or removed (from the message type).
    pub change: RouteChange,
    /// Address family.
    pub family: u8,
    /// Destination prefix length.
    pub dst_len: u8,
    /// Source prefix length.
    pub src_len: u8,
    /// Routing table ID; RTA_TABLE wins over the 8-bit header field.
    pub table: u32,
    /// Egress interface index (RTA_OIF).
    pub oif: Option<u32>,
}

impl RouteSelector {
    /// Decode a route message, taking the change kind from its header.
    pub fn from_message(header: &NlMsgHdr, payload: &[u8]) -> Result<Self> {
        let change = RouteChange::from_msg_type(header.nlmsg_type).ok_or_else(|| {
            Error::InvalidMessage(format!("not a route message: type {}", header.nlmsg_type))
        })?;
        let mut selector = Self::from_bytes(payload)?;
        selector.change = change;
        Ok(selector)
    }

    /// Check for an IPv4 default route (0.0.0.0/0, any source) in the main table.
    pub fn is_ipv4_main_default(&self) -> bool {
        self.change == RouteChange::Added
            && self.family == libc::AF_INET as u8
            && self.dst_len == 0
            && self.src_len == 0
            && self.table == RT_TABLE_MAIN
    }

    /// Check whether this is the monitored default route on `target`.
    ///
    /// The egress index is resolved on every call, never cached.
    pub fn is_default_via<R: InterfaceResolver + ?Sized>(&self, target: &str, resolver: &R) -> bool {
        self.is_ipv4_main_default() && resolves_to(self.oif, target, resolver)
    }
}

impl FromNetlink for RouteSelector {
    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes: &[u8] = take(RtMsg::SIZE).parse_next(input)?;
        let header = RtMsg::from_bytes(header_bytes).map_err(|_| cut())?;

        let mut selector = RouteSelector {
            family: header.rtm_family,
            dst_len: header.rtm_dst_len,
            src_len: header.rtm_src_len,
            table: header.rtm_table as u32,
            ..Default::default()
        };

        for attr in AttrIter::new(input) {
            let (kind, payload) = attr.map_err(|_| cut())?;
            match kind {
                attr_ids::RTA_OIF => {
                    selector.oif = Some(get::u32_ne(payload).map_err(|_| cut())?);
                }
                attr_ids::RTA_TABLE => {
                    selector.table = get::u32_ne(payload).map_err(|_| cut())?;
                }
                _ => {} // Ignore attributes we don't need
            }
        }
        *input = &[];

        Ok(selector)
    }
}

/// Whether a route-change notification concerns the monitored interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    /// The route leaves through the monitored interface.
    Relevant,
    /// Another interface, no egress interface, or undecodable.
    Irrelevant,
}

/// Extract the egress interface index of a route notification.
///
/// Returns `None` for a truncated header, a missing or short RTA_OIF, or
/// when the attribute walk breaks before RTA_OIF is reached.
pub fn notification_oif(payload: &[u8]) -> Option<u32> {
    let attrs = payload.get(RtMsg::SIZE..)?;
    AttrIter::new(attrs)
        .valid()
        .filter(|(kind, _)| *kind == attr_ids::RTA_OIF)
        .find_map(|(_, data)| get::u32_ne(data).ok())
}

/// Classify a route-change notification against the monitored interface.
///
/// Unresolvable interface indices (the interface went away) are irrelevant.
pub fn classify_notification<R: InterfaceResolver + ?Sized>(
    payload: &[u8],
    target: &str,
    resolver: &R,
) -> Relevance {
    if resolves_to(notification_oif(payload), target, resolver) {
        Relevance::Relevant
    } else {
        Relevance::Irrelevant
    }
}

fn resolves_to<R: InterfaceResolver + ?Sized>(oif: Option<u32>, target: &str, resolver: &R) -> bool {
    oif.and_then(|index| resolver.index_to_name(index))
        .is_some_and(|name| name == target)
}
