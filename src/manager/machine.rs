use statig::prelude::*;

use crate::monitor::{LinkStatus, SessionStatus};
use crate::status::{Fault, Phase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HopPolicy {
    pub(crate) hopping: bool,
    pub(crate) max_attempts: u8,
}

/// What the monitors reported at the start of a poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Observation {
    pub(crate) link: LinkStatus,
    pub(crate) session: SessionStatus,
    pub(crate) messaging_configured: bool,
    pub(crate) retry_ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Established,
    Pending,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PhaseEvent {
    Tick(Observation),
    LinkAttempt(AttemptOutcome),
    MessagingAttempt(AttemptOutcome),
    Configure(HopPolicy),
    Reset,
}

/// Work the manager must carry out against the monitors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Action {
    #[default]
    None,
    ConnectLink,
    ConnectMessaging,
    DropMessaging,
    ResetLink,
}

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct DispatchContext {
    pub(super) action: Action,
    pub(super) link_up: bool,
    pub(super) messaging_up: bool,
    pub(super) messaging_down: bool,
    pub(super) resubscribe: bool,
    pub(super) hop: bool,
    pub(super) fault: Option<Fault>,
}

pub(super) struct PhaseMachine {
    pub(super) phase: Phase,
    failures: u8,
    attempt_open: bool,
    policy: HopPolicy,
}

impl PhaseMachine {
    pub(super) fn new(policy: HopPolicy) -> Self {
        Self {
            phase: Phase::Disconnected,
            failures: 0,
            attempt_open: false,
            policy,
        }
    }

    pub(super) fn failures(&self) -> u8 {
        self.failures
    }

    fn enter(&mut self, phase: Phase) -> Outcome<State> {
        self.phase = phase;
        if matches!(phase, Phase::Disconnected) {
            self.attempt_open = false;
        }
        Transition(match phase {
            Phase::Disconnected => State::disconnected(),
            Phase::LinkConnecting => State::link_connecting(),
            Phase::LinkUp => State::link_up(),
            Phase::MessagingConnecting => State::messaging_connecting(),
            Phase::FullyUp => State::fully_up(),
            Phase::Degraded => State::degraded(),
            Phase::HoppingPending => State::hopping_pending(),
        })
    }

    fn issue(&mut self, context: &mut DispatchContext, action: Action) {
        context.action = action;
        self.attempt_open = true;
    }

    /// Books one failed attempt. Returns true when the profile is used up and
    /// the caller should move to the next one.
    fn attempt_failed(&mut self, context: &mut DispatchContext, fault: Fault) -> bool {
        self.attempt_open = false;
        self.failures = self.failures.saturating_add(1);
        context.fault = Some(fault);
        if self.policy.hopping && self.failures >= self.policy.max_attempts {
            self.failures = 0;
            context.hop = true;
            return true;
        }
        false
    }

    fn link_established(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.attempt_open = false;
        context.link_up = true;
        self.enter(Phase::LinkUp)
    }

    fn messaging_established(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.attempt_open = false;
        self.failures = 0;
        context.messaging_up = true;
        context.resubscribe = true;
        self.enter(Phase::FullyUp)
    }
}

#[state_machine(initial = "State::disconnected()")]
impl PhaseMachine {
    #[superstate]
    fn supervising(
        &mut self,
        context: &mut DispatchContext,
        event: &PhaseEvent,
    ) -> Outcome<State> {
        match event {
            PhaseEvent::Configure(policy) => {
                self.policy = *policy;
                Handled
            }
            PhaseEvent::Reset => {
                if matches!(self.phase, Phase::FullyUp) {
                    context.messaging_down = true;
                }
                self.failures = 0;
                self.enter(Phase::Disconnected)
            }
            // Late attempt outcomes after a phase change carry no information.
            _ => Handled,
        }
    }

    #[state(superstate = "supervising")]
    fn disconnected(&mut self, context: &mut DispatchContext, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Tick(observation) => {
                if observation.link.is_connected() {
                    return self.link_established(context);
                }
                if observation.link.is_pending() {
                    return self.enter(Phase::LinkConnecting);
                }
                if observation.retry_ready {
                    self.issue(context, Action::ConnectLink);
                    return self.enter(Phase::LinkConnecting);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "supervising")]
    fn link_connecting(
        &mut self,
        context: &mut DispatchContext,
        event: &PhaseEvent,
    ) -> Outcome<State> {
        match event {
            PhaseEvent::Tick(observation) => {
                if observation.link.is_connected() {
                    return self.link_established(context);
                }
                if observation.link.is_pending() || !observation.retry_ready {
                    return Handled;
                }
                if self.attempt_open && self.attempt_failed(context, Fault::LinkAttemptFailed) {
                    return self.enter(Phase::HoppingPending);
                }
                self.issue(context, Action::ConnectLink);
                Handled
            }
            PhaseEvent::LinkAttempt(AttemptOutcome::Established) => self.link_established(context),
            PhaseEvent::LinkAttempt(AttemptOutcome::Pending) => Handled,
            PhaseEvent::LinkAttempt(AttemptOutcome::Failed) => {
                if self.attempt_failed(context, Fault::LinkAttemptFailed) {
                    return self.enter(Phase::HoppingPending);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "supervising")]
    fn link_up(&mut self, context: &mut DispatchContext, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Tick(observation) => {
                if !observation.link.is_connected() {
                    return self.enter(Phase::Disconnected);
                }
                if !observation.messaging_configured {
                    self.failures = 0;
                    return Handled;
                }
                if observation.session.is_connected() {
                    return self.messaging_established(context);
                }
                if observation.session.is_pending() || !observation.retry_ready {
                    return Handled;
                }
                self.issue(context, Action::ConnectMessaging);
                self.enter(Phase::MessagingConnecting)
            }
            _ => Super,
        }
    }

    #[state(superstate = "supervising")]
    fn messaging_connecting(
        &mut self,
        context: &mut DispatchContext,
        event: &PhaseEvent,
    ) -> Outcome<State> {
        match event {
            PhaseEvent::Tick(observation) => {
                if !observation.link.is_connected() {
                    return self.enter(Phase::Disconnected);
                }
                if observation.session.is_connected() {
                    return self.messaging_established(context);
                }
                if !observation.messaging_configured {
                    return self.enter(Phase::LinkUp);
                }
                if observation.session.is_pending() || !observation.retry_ready {
                    return Handled;
                }
                if self.attempt_open
                    && self.attempt_failed(context, Fault::MessagingAttemptFailed)
                {
                    return self.enter(Phase::HoppingPending);
                }
                self.issue(context, Action::ConnectMessaging);
                Handled
            }
            PhaseEvent::MessagingAttempt(AttemptOutcome::Established) => {
                self.messaging_established(context)
            }
            PhaseEvent::MessagingAttempt(AttemptOutcome::Pending) => Handled,
            PhaseEvent::MessagingAttempt(AttemptOutcome::Failed) => {
                if self.attempt_failed(context, Fault::MessagingAttemptFailed) {
                    return self.enter(Phase::HoppingPending);
                }
                self.enter(Phase::Degraded)
            }
            _ => Super,
        }
    }

    #[state(superstate = "supervising")]
    fn fully_up(&mut self, context: &mut DispatchContext, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Tick(observation) => {
                if !observation.link.is_connected() {
                    context.messaging_down = true;
                    context.action = Action::DropMessaging;
                    return self.enter(Phase::Disconnected);
                }
                if !observation.session.is_connected() {
                    context.messaging_down = true;
                    return self.enter(Phase::Degraded);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "supervising")]
    fn degraded(&mut self, context: &mut DispatchContext, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Tick(observation) => {
                if !observation.link.is_connected() {
                    return self.enter(Phase::Disconnected);
                }
                if observation.session.is_connected() {
                    return self.messaging_established(context);
                }
                if !observation.messaging_configured {
                    return self.enter(Phase::LinkUp);
                }
                if observation.session.is_pending() || !observation.retry_ready {
                    return Handled;
                }
                self.issue(context, Action::ConnectMessaging);
                self.enter(Phase::MessagingConnecting)
            }
            _ => Super,
        }
    }

    #[state(superstate = "supervising")]
    fn hopping_pending(
        &mut self,
        context: &mut DispatchContext,
        event: &PhaseEvent,
    ) -> Outcome<State> {
        match event {
            PhaseEvent::Tick(_) => {
                self.issue(context, Action::ResetLink);
                self.enter(Phase::LinkConnecting)
            }
            _ => Super,
        }
    }
}
