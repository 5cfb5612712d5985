//! The debounce/dump state machine.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::DebouncePolicy;
use crate::alert::{AlertSink, Direction};
use crate::netlink::message::{NlMsgError, done_status};
use crate::netlink::route::{Relevance, classify_notification};
use crate::netlink::{MessageIter, NlMsgHdr, NlMsgType, RouteChannel, RouteSelector};
use crate::util::ifname::InterfaceResolver;

/// Input to [`MonitorContext::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The channel may have datagrams queued.
    Readable,
    /// The debounce timer expired.
    TimerFired,
    /// Stop monitoring.
    Shutdown,
}

/// What the reactor must do after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep waiting; leave the timer as it is.
    Continue,
    /// (Re)arm the debounce timer to fire after the duration.
    ArmTimer(Duration),
    /// Leave the event loop.
    Stop,
}

impl Step {
    /// Combine the steps of two consecutive messages; arming wins.
    fn then(self, next: Step) -> Step {
        match (self, next) {
            (Step::Stop, _) | (_, Step::Stop) => Step::Stop,
            (_, Step::ArmTimer(d)) => Step::ArmTimer(d),
            (step, Step::Continue) => step,
        }
    }
}

/// Authoritative presence of the default route on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceState {
    /// Result of the last completed dump.
    pub current: bool,
    /// Value before the last transition.
    pub previous: bool,
}

/// An outstanding route dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpSession {
    /// Sequence number of the request.
    pub seq: u32,
    /// Whether a qualifying default route was seen so far.
    pub found: bool,
}

/// Debounce phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for a relevant change.
    #[default]
    Idle,
    /// Timer armed; waiting for the burst to settle.
    DebounceArmed,
    /// A dump is outstanding.
    DumpInFlight(DumpSession),
}

/// Monitor state: channel, collaborators and the debounce machine.
///
/// Socket- and timer-free; the reactor feeds it [`Event`]s and acts on the
/// returned [`Step`].
pub struct MonitorContext<C, R, A> {
    target: String,
    channel: C,
    resolver: R,
    alert: A,
    debounce: Duration,
    policy: DebouncePolicy,
    phase: Phase,
    presence: PresenceState,
    last_seq: Option<u32>,
}

impl<C: RouteChannel, R: InterfaceResolver, A: AlertSink> MonitorContext<C, R, A> {
    /// Create a context in `Idle` with the route considered absent.
    pub fn new(target: impl Into<String>, channel: C, resolver: R, alert: A) -> Self {
        Self {
            target: target.into(),
            channel,
            resolver,
            alert,
            debounce: Duration::from_millis(super::config::DEFAULT_DEBOUNCE_MS),
            policy: DebouncePolicy::default(),
            phase: Phase::Idle,
            presence: PresenceState::default(),
            last_seq: None,
        }
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Set the debounce policy.
    pub fn with_policy(mut self, policy: DebouncePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Monitored interface name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current debounce phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current presence state.
    pub fn presence(&self) -> PresenceState {
        self.presence
    }

    /// Sequence number of the most recent dump request.
    pub fn last_seq(&self) -> Option<u32> {
        self.last_seq
    }

    /// The channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The alert sink.
    pub fn alert(&self) -> &A {
        &self.alert
    }

    /// Mutable access to the alert sink.
    pub fn alert_mut(&mut self) -> &mut A {
        &mut self.alert
    }

    /// Arm an immediate snapshot so the initial state is known at startup.
    pub fn start(&mut self) -> Step {
        debug!(target_if = %self.target, "requesting initial snapshot");
        self.phase = Phase::DebounceArmed;
        Step::ArmTimer(Duration::ZERO)
    }

    /// Feed one event into the machine.
    pub fn dispatch(&mut self, event: Event) -> Step {
        match event {
            Event::Readable => self.on_readable(),
            Event::TimerFired => self.on_timer(),
            Event::Shutdown => {
                debug!("shutdown requested");
                Step::Stop
            }
        }
    }

    fn on_readable(&mut self) -> Step {
        let mut step = Step::Continue;
        loop {
            match self.channel.receive() {
                Ok(Some(datagram)) => step = step.then(self.on_datagram(&datagram)),
                Ok(None) => break,
                Err(e) if e.is_overrun() => {
                    warn!("route notifications lost, resampling");
                    step = step.then(self.on_relevant_change());
                }
                Err(e) => {
                    warn!(error = %e, "receive failed");
                    break;
                }
            }
        }
        step
    }

    fn on_datagram(&mut self, datagram: &[u8]) -> Step {
        let mut step = Step::Continue;
        for msg in MessageIter::new(datagram) {
            match msg {
                Ok((header, payload)) => step = step.then(self.on_message(header, payload)),
                Err(e) => {
                    warn!(error = %e, "dropping rest of malformed datagram");
                    break;
                }
            }
        }
        step
    }

    fn on_message(&mut self, header: &NlMsgHdr, payload: &[u8]) -> Step {
        let port_id = self.channel.port_id();

        if let Phase::DumpInFlight(session) = self.phase
            && header.answers(session.seq, port_id)
        {
            self.on_dump_message(session, header, payload);
            return Step::Continue;
        }

        // Replies to an earlier request of ours are not notifications.
        if header.nlmsg_pid == port_id && port_id != 0 {
            debug!(seq = header.nlmsg_seq, "ignoring stale reply");
            return Step::Continue;
        }

        if !header.is_route() {
            debug!(msg_type = header.nlmsg_type, "ignoring message");
            return Step::Continue;
        }

        match classify_notification(payload, &self.target, &self.resolver) {
            Relevance::Relevant => self.on_relevant_change(),
            Relevance::Irrelevant => Step::Continue,
        }
    }

    fn on_relevant_change(&mut self) -> Step {
        match self.phase {
            Phase::Idle => {
                info!("route change detected");
                self.phase = Phase::DebounceArmed;
                Step::ArmTimer(self.debounce)
            }
            Phase::DebounceArmed => match self.policy {
                DebouncePolicy::Fixed => Step::Continue,
                DebouncePolicy::Restart => Step::ArmTimer(self.debounce),
            },
            Phase::DumpInFlight(_) => {
                debug!("route change during dump, not rescheduling");
                Step::Continue
            }
        }
    }

    fn on_timer(&mut self) -> Step {
        if self.phase != Phase::DebounceArmed {
            debug!(phase = ?self.phase, "spurious timer");
            return Step::Continue;
        }

        match self.channel.send_dump_request(libc::AF_INET as u8) {
            Ok(seq) => {
                debug!(seq, "route dump requested");
                self.last_seq = Some(seq);
                self.phase = Phase::DumpInFlight(DumpSession { seq, found: false });
            }
            Err(e) => {
                warn!(error = %e, "route dump request failed");
                self.phase = Phase::Idle;
            }
        }
        Step::Continue
    }

    fn on_dump_message(&mut self, mut session: DumpSession, header: &NlMsgHdr, payload: &[u8]) {
        if header.is_done() {
            let status = done_status(payload);
            if status < 0 {
                let e = crate::Error::from_errno(status);
                warn!(seq = session.seq, error = %e, "route dump aborted");
                self.phase = Phase::Idle;
                return;
            }
            self.complete(session.found);
            return;
        }

        if header.is_error() {
            match NlMsgError::from_bytes(payload) {
                Ok(err) if err.is_ack() => {}
                Ok(err) => {
                    let e = crate::Error::from_errno(err.error);
                    warn!(seq = session.seq, error = %e, "route dump rejected");
                    self.phase = Phase::Idle;
                }
                Err(e) => {
                    warn!(seq = session.seq, error = %e, "malformed dump error reply");
                    self.phase = Phase::Idle;
                }
            }
            return;
        }

        if header.nlmsg_type != NlMsgType::RTM_NEWROUTE {
            return;
        }

        match RouteSelector::from_message(header, payload) {
            Ok(route) if route.is_default_via(&self.target, &self.resolver) => {
                info!("default route found");
                session.found = true;
                self.phase = Phase::DumpInFlight(session);
            }
            Ok(_) => {}
            Err(e) => warn!(seq = session.seq, error = %e, "skipping malformed route"),
        }
    }

    fn complete(&mut self, found: bool) {
        self.phase = Phase::Idle;
        if found == self.presence.current {
            debug!(found, "route dump complete, no change");
            return;
        }

        self.presence.previous = self.presence.current;
        self.presence.current = found;
        info!("state change detected: {}", if found { "ON" } else { "OFF" });
        self.alert.set_indicator(found);
        self.alert.play_transition_cue(Direction::towards(found));
    }
}
