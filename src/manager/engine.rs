use statig::blocking::IntoStateMachineExt as _;

use super::machine::{
    Action, AttemptOutcome, DispatchContext, HopPolicy, Observation, PhaseEvent, PhaseMachine,
};
use crate::status::{Fault, Phase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PhaseOutput {
    pub(crate) before: Phase,
    pub(crate) after: Phase,
    pub(crate) action: Action,
    pub(crate) link_up: bool,
    pub(crate) messaging_up: bool,
    pub(crate) messaging_down: bool,
    pub(crate) resubscribe: bool,
    pub(crate) hop: bool,
    pub(crate) fault: Option<Fault>,
}

impl PhaseOutput {
    pub(crate) fn changed(self) -> bool {
        self.before != self.after
    }
}

pub(crate) struct PhaseEngine {
    machine: statig::blocking::StateMachine<PhaseMachine>,
}

impl PhaseEngine {
    pub(crate) fn new(policy: HopPolicy) -> Self {
        Self {
            machine: PhaseMachine::new(policy).state_machine(),
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.machine.inner().phase
    }

    pub(crate) fn failures(&self) -> u8 {
        self.machine.inner().failures()
    }

    pub(crate) fn tick(&mut self, observation: Observation) -> PhaseOutput {
        self.apply(PhaseEvent::Tick(observation))
    }

    pub(crate) fn link_attempt(&mut self, outcome: AttemptOutcome) -> PhaseOutput {
        self.apply(PhaseEvent::LinkAttempt(outcome))
    }

    pub(crate) fn messaging_attempt(&mut self, outcome: AttemptOutcome) -> PhaseOutput {
        self.apply(PhaseEvent::MessagingAttempt(outcome))
    }

    pub(crate) fn configure(&mut self, policy: HopPolicy) {
        let _ = self.apply(PhaseEvent::Configure(policy));
    }

    pub(crate) fn reset(&mut self) -> PhaseOutput {
        self.apply(PhaseEvent::Reset)
    }

    fn apply(&mut self, event: PhaseEvent) -> PhaseOutput {
        let before = self.phase();
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        PhaseOutput {
            before,
            after: self.phase(),
            action: context.action,
            link_up: context.link_up,
            messaging_up: context.messaging_up,
            messaging_down: context.messaging_down,
            resubscribe: context.resubscribe,
            hop: context.hop,
            fault: context.fault,
        }
    }
}
