//! Press/release debounce driven once per polling tick.

use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::config::DebounceConfig;

use super::types::{TouchEvent, TouchPoint};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebounceState {
    #[default]
    Idle,
    WaitingForPress,
    ConfirmedPress,
}

#[derive(Clone, Copy, Debug)]
enum DebounceHsmEvent {
    Tick { sample: Option<TouchPoint> },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebounceOutput {
    pub event: Option<TouchEvent>,
}

#[derive(Clone, Copy, Debug, Default)]
struct DispatchContext {
    event: Option<TouchEvent>,
}

impl DispatchContext {
    fn emit(&mut self, event: TouchEvent) {
        self.event = Some(event);
    }

    fn finish(self) -> DebounceOutput {
        DebounceOutput { event: self.event }
    }
}

pub struct DebounceEngine {
    config: DebounceConfig,
    machine: statig::blocking::StateMachine<DebounceHsm>,
}

impl DebounceEngine {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            machine: DebounceHsm::new(config).state_machine(),
        }
    }

    /// Advances one polling tick. `sample` is the filtered, mapped position,
    /// or `None` when the panel is not (stably) pressed.
    pub fn tick(&mut self, sample: Option<TouchPoint>) -> DebounceOutput {
        let mut context = DispatchContext::default();
        self.machine
            .handle_with_context(&DebounceHsmEvent::Tick { sample }, &mut context);
        context.finish()
    }

    pub fn state(&self) -> DebounceState {
        self.machine.inner().phase
    }

    pub fn press_timer_ms(&self) -> u32 {
        self.machine.inner().press_ms
    }

    pub fn release_timer_ms(&self) -> u32 {
        self.machine.inner().release_ms
    }

    pub fn reset(&mut self) {
        self.machine = DebounceHsm::new(self.config).state_machine();
    }
}

struct DebounceHsm {
    debounce_ms: u32,
    tick_ms: u32,
    press_ms: u32,
    release_ms: u32,
    phase: DebounceState,
}

impl DebounceHsm {
    fn new(config: DebounceConfig) -> Self {
        Self {
            debounce_ms: config.debounce_ms,
            tick_ms: config.tick_ms.max(1),
            press_ms: 0,
            release_ms: 0,
            phase: DebounceState::Idle,
        }
    }

    fn enter(&mut self, phase: DebounceState) {
        self.press_ms = 0;
        self.release_ms = 0;
        self.phase = phase;
    }
}

#[state_machine(initial = "State::idle()")]
impl DebounceHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &DebounceHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            DebounceHsmEvent::Tick { .. } => {
                self.enter(DebounceState::WaitingForPress);
                Transition(State::waiting_for_press())
            }
        }
    }

    #[state]
    fn waiting_for_press(
        &mut self,
        context: &mut DispatchContext,
        event: &DebounceHsmEvent,
    ) -> Outcome<State> {
        match event {
            DebounceHsmEvent::Tick {
                sample: Some(point),
            } => {
                self.press_ms = self.press_ms.saturating_add(self.tick_ms);
                if self.press_ms < self.debounce_ms {
                    return Handled;
                }
                context.emit(TouchEvent::from(*point));
                self.enter(DebounceState::ConfirmedPress);
                Transition(State::confirmed_press())
            }
            DebounceHsmEvent::Tick { sample: None } => {
                self.press_ms = 0;
                Handled
            }
        }
    }

    #[state]
    fn confirmed_press(
        &mut self,
        context: &mut DispatchContext,
        event: &DebounceHsmEvent,
    ) -> Outcome<State> {
        let _ = context;
        match event {
            DebounceHsmEvent::Tick { sample: None } => {
                self.release_ms = self.release_ms.saturating_add(self.tick_ms);
                if self.release_ms < self.debounce_ms {
                    return Handled;
                }
                self.enter(DebounceState::WaitingForPress);
                Transition(State::waiting_for_press())
            }
            DebounceHsmEvent::Tick { sample: Some(_) } => {
                self.release_ms = 0;
                Handled
            }
        }
    }
}
