//! Netlink message fixtures for testing.
//!
//! Route payloads captured from a router with `wan0` at index 2, plus
//! builders for whole messages so that dump and notification sequences can be
//! replayed without a kernel.
//!
//! The fixtures are provided as functions that return Vec<u8> to ensure
//! proper alignment for the parser.

use super::builder::MessageBuilder;
use super::message::{NLM_F_MULTI, NlMsgHdr, NlMsgType};
use super::route::{RT_TABLE_MAIN, RtMsg};

/// Default route payload (rtmsg + attributes).
/// Captured from: ip route add default via 192.168.1.1 dev wan0
pub fn route_default_v4() -> Vec<u8> {
    vec![
        // rtmsg: family=AF_INET, dst_len=0, src_len=0, tos=0, table=RT_TABLE_MAIN, protocol=RTPROT_BOOT, scope=RT_SCOPE_UNIVERSE, type=RTN_UNICAST
        0x02, // family = AF_INET
        0x00, // dst_len = 0 (default route)
        0x00, // src_len = 0
        0x00, // tos = 0
        0xfe, // table = RT_TABLE_MAIN (254)
        0x03, // protocol = RTPROT_BOOT (3)
        0x00, // scope = RT_SCOPE_UNIVERSE (0)
        0x01, // type = RTN_UNICAST (1)
        0x00, 0x00, 0x00, 0x00, // flags = 0
        // RTA_TABLE = 254
        0x08, 0x00, // len = 8
        0x0f, 0x00, // type = RTA_TABLE (15)
        0xfe, 0x00, 0x00, 0x00, // table = 254
        // RTA_GATEWAY = 192.168.1.1
        0x08, 0x00, // len = 8
        0x05, 0x00, // type = RTA_GATEWAY (5)
        0xc0, 0xa8, 0x01, 0x01, // 192.168.1.1
        // RTA_OIF = 2
        0x08, 0x00, // len = 8
        0x04, 0x00, // type = RTA_OIF (4)
        0x02, 0x00, 0x00, 0x00, // oif = 2
    ]
}

/// Connected subnet route payload.
/// Captured from: ip addr add 192.168.1.10/24 dev wan0
pub fn route_connected_v4() -> Vec<u8> {
    vec![
        // rtmsg: family=AF_INET, dst_len=24, table=RT_TABLE_MAIN, protocol=RTPROT_KERNEL, scope=RT_SCOPE_LINK, type=RTN_UNICAST
        0x02, // family = AF_INET
        0x18, // dst_len = 24
        0x00, // src_len = 0
        0x00, // tos = 0
        0xfe, // table = RT_TABLE_MAIN (254)
        0x02, // protocol = RTPROT_KERNEL (2)
        0xfd, // scope = RT_SCOPE_LINK (253)
        0x01, // type = RTN_UNICAST (1)
        0x00, 0x00, 0x00, 0x00, // flags = 0
        // RTA_TABLE = 254
        0x08, 0x00, // len = 8
        0x0f, 0x00, // type = RTA_TABLE (15)
        0xfe, 0x00, 0x00, 0x00, // table = 254
        // RTA_DST = 192.168.1.0
        0x08, 0x00, // len = 8
        0x01, 0x00, // type = RTA_DST (1)
        0xc0, 0xa8, 0x01, 0x00, // 192.168.1.0
        // RTA_PREFSRC = 192.168.1.10
        0x08, 0x00, // len = 8
        0x07, 0x00, // type = RTA_PREFSRC (7)
        0xc0, 0xa8, 0x01, 0x0a, // 192.168.1.10
        // RTA_OIF = 2
        0x08, 0x00, // len = 8
        0x04, 0x00, // type = RTA_OIF (4)
        0x02, 0x00, 0x00, 0x00, // oif = 2
    ]
}

/// Header of an IPv4 default route in the main table.
pub fn rtmsg_default_v4() -> RtMsg {
    RtMsg {
        rtm_protocol: 3, // RTPROT_BOOT
        rtm_type: 1,     // RTN_UNICAST
        ..RtMsg::new()
            .with_family(libc::AF_INET as u8)
            .with_table(RT_TABLE_MAIN as u8)
    }
}

/// Header of a connected /24 route in the main table.
pub fn rtmsg_connected_v4() -> RtMsg {
    rtmsg_default_v4().with_dst_len(24)
}

/// Concatenate whole messages into one datagram.
pub fn datagram(messages: &[Vec<u8>]) -> Vec<u8> {
    messages.concat()
}

/// Route message with arbitrary attributes.
pub fn route_message_with(
    msg_type: u16,
    seq: u32,
    pid: u32,
    rtm: &RtMsg,
    attrs: &[(u16, Vec<u8>)],
) -> Vec<u8> {
    let mut builder = MessageBuilder::new(msg_type, 0);
    builder.set_seq(seq);
    builder.set_pid(pid);
    builder.append(rtm);
    for (kind, data) in attrs {
        builder.append_attr(*kind, data);
    }
    builder.finish()
}

/// Route message with an RTA_TABLE and an RTA_OIF attribute.
pub fn route_message(msg_type: u16, seq: u32, pid: u32, rtm: &RtMsg, oif: u32) -> Vec<u8> {
    route_message_with(msg_type, seq, pid, rtm, &[
        (15, (rtm.rtm_table as u32).to_ne_bytes().to_vec()), // RTA_TABLE
        (4, oif.to_ne_bytes().to_vec()),                      // RTA_OIF
    ])
}

/// One entry of a route dump answering `seq` from port `pid`.
pub fn route_entry(seq: u32, pid: u32, flags: u16, rtm: &RtMsg, oif: u32) -> Vec<u8> {
    let mut msg = route_message(NlMsgType::RTM_NEWROUTE, seq, pid, rtm, oif);
    let flags = flags | NLM_F_MULTI;
    msg[6..8].copy_from_slice(&flags.to_ne_bytes());
    msg
}

/// Route-change notification sent by the kernel itself.
pub fn route_notification(msg_type: u16, oif: u32) -> Vec<u8> {
    route_message(msg_type, 0, 0, &rtmsg_default_v4(), oif)
}

/// End-of-dump marker for a dump that ran to completion.
pub fn done(seq: u32, pid: u32) -> Vec<u8> {
    done_with_status(seq, pid, 0)
}

/// End-of-dump marker carrying `status` (a negative errno on abort).
pub fn done_with_status(seq: u32, pid: u32, status: i32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::DONE, NLM_F_MULTI);
    builder.set_seq(seq);
    builder.set_pid(pid);
    builder.append_bytes(&status.to_ne_bytes());
    builder.finish()
}

/// Error reply to request `seq`, quoting the request header.
pub fn error_reply(seq: u32, pid: u32, errno: i32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::ERROR, 0);
    builder.set_seq(seq);
    builder.set_pid(pid);
    builder.append_bytes(&(-errno).to_ne_bytes());
    let request = NlMsgHdr {
        nlmsg_seq: seq,
        nlmsg_pid: pid,
        ..NlMsgHdr::new(NlMsgType::RTM_GETROUTE, 0)
    };
    builder.append(&request);
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::{MessageIter, NLMSG_HDRLEN, NlMsgError};

    #[test]
    fn test_done_layout() {
        let msg = done(3, 4);
        assert_eq!(msg.len(), NLMSG_HDRLEN + 4);
        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert!(header.is_done());
        assert!(header.answers(3, 4));
    }

    #[test]
    fn test_error_reply_decodes() {
        let msg = error_reply(9, 1, libc::EBUSY);
        let (header, payload) = MessageIter::new(&msg).next().unwrap().unwrap();
        assert!(header.is_error());
        let err = NlMsgError::from_bytes(payload).unwrap();
        assert_eq!(err.error, -libc::EBUSY);
        assert_eq!(err.msg.nlmsg_seq, 9);
    }

    #[test]
    fn test_route_entry_is_multipart() {
        let msg = route_entry(1, 2, 0, &rtmsg_connected_v4(), 5);
        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert!(header.is_multi());
        assert!(header.is_route());
        assert_eq!(header.nlmsg_len as usize, msg.len());
    }
}
