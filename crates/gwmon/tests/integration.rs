//! Integration tests against the running kernel.
//!
//! # Running Tests
//!
//! ```bash
//! # Dump tests run unprivileged; namespace tests need root
//! sudo cargo test -p gwmon --test integration --features integration
//! ```

#![cfg(feature = "integration")]

#[macro_use]
#[path = "common/mod.rs"]
mod common;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gwmon::Result;
use gwmon::alert::{AlertSink, Direction};
use gwmon::monitor::{MonitorContext, drive};
use gwmon::netlink::rtnetlink_groups::RTNLGRP_IPV4_ROUTE;
use gwmon::netlink::{
    FromNetlink, MessageIter, NetlinkChannel, NlMsgType, RouteChannel, RouteSelector,
};
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};

use crate::common::{KernelResolver, in_new_netns, ip};

#[derive(Default)]
struct Recorder(Vec<Direction>);

impl AlertSink for Recorder {
    fn set_indicator(&mut self, _on: bool) {}

    fn play_transition_cue(&mut self, direction: Direction) {
        self.0.push(direction);
    }
}

#[tokio::test]
async fn test_route_dump_completes() -> Result<()> {
    let mut channel = NetlinkChannel::open(RTNLGRP_IPV4_ROUTE)?;
    let seq = channel.send_dump_request(libc::AF_INET as u8)?;
    let pid = channel.port_id();

    let mut routes = 0;
    let finished = timeout(Duration::from_secs(5), async {
        loop {
            channel.readable().await?;
            while let Some(datagram) = channel.receive()? {
                for msg in MessageIter::new(&datagram) {
                    let (header, payload) = msg?;
                    if !header.answers(seq, pid) {
                        continue;
                    }
                    if header.is_done() {
                        return Ok::<_, gwmon::Error>(());
                    }
                    if header.nlmsg_type == NlMsgType::RTM_NEWROUTE {
                        let route = RouteSelector::from_bytes(payload)?;
                        assert_eq!(route.family, libc::AF_INET as u8);
                        routes += 1;
                    }
                }
            }
        }
    })
    .await;

    assert!(finished.is_ok(), "dump did not finish");
    finished.unwrap()?;
    // The local table always holds at least the loopback routes.
    assert!(routes > 0);
    Ok(())
}

#[tokio::test]
async fn test_sequence_numbers_increase() -> Result<()> {
    let mut channel = NetlinkChannel::open(RTNLGRP_IPV4_ROUTE)?;
    let first = channel.send_dump_request(libc::AF_INET as u8)?;
    let second = channel.send_dump_request(libc::AF_INET as u8)?;
    assert!(second > first);
    Ok(())
}

#[tokio::test]
async fn test_first_sequence_follows_clock_seed() -> Result<()> {
    let unix_secs = || {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32
    };

    let before = unix_secs();
    let mut channel = NetlinkChannel::open(RTNLGRP_IPV4_ROUTE)?;
    let after = unix_secs();

    let first = channel.send_dump_request(libc::AF_INET as u8)?;
    assert!(first > before && first <= after + 1, "seq {first} outside {before}..={after} + 1");
    Ok(())
}

#[test]
fn test_default_route_transitions_in_netns() -> std::io::Result<()> {
    require_root!();

    let (presence, cues) = in_new_netns(|| {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        rt.block_on(async {
            ip(&["link", "set", "lo", "up"])?;
            ip(&["link", "add", "gwt0", "type", "dummy"])?;
            ip(&["link", "set", "gwt0", "up"])?;

            let channel = NetlinkChannel::open(RTNLGRP_IPV4_ROUTE)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            let mut ctx = MonitorContext::new("gwt0", channel, KernelResolver, Recorder::default())
                .with_debounce(Duration::from_millis(200));
            let (stop, stopped) = oneshot::channel::<()>();

            let script = async {
                sleep(Duration::from_millis(300)).await;
                ip(&["route", "add", "default", "dev", "gwt0"])?;
                sleep(Duration::from_millis(600)).await;
                ip(&["route", "del", "default", "dev", "gwt0"])?;
                sleep(Duration::from_millis(600)).await;
                let _ = stop.send(());
                Ok::<_, std::io::Error>(())
            };
            let shutdown = async {
                let _ = stopped.await;
            };

            let (result, script) = tokio::join!(drive(&mut ctx, shutdown), script);
            result.map_err(|e| std::io::Error::other(e.to_string()))?;
            script?;

            Ok::<_, std::io::Error>((ctx.presence().current, ctx.alert().0.clone()))
        })
    })?;

    assert!(!presence);
    assert_eq!(cues, vec![Direction::Up, Direction::Down]);
    Ok(())
}
