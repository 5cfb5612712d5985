//! Single-threaded event loop driving a [`MonitorContext`].

use std::future::Future;

use tokio::time::{Instant, sleep_until};
use tracing::info;

use super::config::MonitorConfig;
use super::context::{Event, MonitorContext, Step};
use crate::alert::AlertSink;
use crate::netlink::rtnetlink_groups::RTNLGRP_IPV4_ROUTE;
use crate::netlink::{NetlinkChannel, Result, RouteChannel};
use crate::util::ifname::{InterfaceResolver, SysfsResolver};

/// Monitor the configured interface until `shutdown` resolves.
///
/// Fails only on invalid configuration or channel setup; everything after
/// that is logged and absorbed.
pub async fn run<A, F>(config: &MonitorConfig, alert: A, shutdown: F) -> Result<()>
where
    A: AlertSink,
    F: Future<Output = ()>,
{
    config.validate()?;

    let channel = NetlinkChannel::open(RTNLGRP_IPV4_ROUTE)?;
    let mut ctx = MonitorContext::new(&*config.interface, channel, SysfsResolver::new(), alert)
        .with_debounce(config.debounce())
        .with_policy(config.debounce_policy);

    info!(
        interface = %config.interface,
        debounce_ms = config.debounce_ms,
        policy = ?config.debounce_policy,
        "monitoring default route"
    );

    drive(&mut ctx, shutdown).await?;
    info!("monitor stopped");
    Ok(())
}

/// Run the event loop over an existing context.
///
/// Starts with an immediate snapshot, then multiplexes channel readiness, the
/// debounce deadline and `shutdown` until the context asks to stop.
pub async fn drive<C, R, A, F>(ctx: &mut MonitorContext<C, R, A>, shutdown: F) -> Result<()>
where
    C: RouteChannel,
    R: InterfaceResolver,
    A: AlertSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut deadline = None;
    apply(ctx.start(), &mut deadline);

    loop {
        let event = tokio::select! {
            biased;

            () = &mut shutdown => Event::Shutdown,
            () = expiry(deadline) => {
                deadline = None;
                Event::TimerFired
            }
            ready = ctx.channel().readable() => {
                ready?;
                Event::Readable
            }
        };

        if apply(ctx.dispatch(event), &mut deadline) {
            return Ok(());
        }
    }
}

/// Update the deadline for `step`; returns whether to stop.
fn apply(step: Step, deadline: &mut Option<Instant>) -> bool {
    match step {
        Step::Continue => false,
        Step::ArmTimer(after) => {
            *deadline = Some(Instant::now() + after);
            false
        }
        Step::Stop => true,
    }
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
