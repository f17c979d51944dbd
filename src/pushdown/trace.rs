use serde::Serialize;

/// One successful rule application during a guided run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEvent {
    /// 1-based position in the derivation.
    pub step: usize,
    /// 1-based rule index.
    pub rule: usize,
    pub depth: usize,
    pub from_state: String,
    pub to_state: String,
    pub pending_before: usize,
    pub pending_after: usize,
    /// Tape after the step, top first.
    pub tape: Vec<String>,
}

/// Receives step events from a simulation.
pub trait TraceObserver {
    fn on_step(&mut self, event: &StepEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {
    fn on_step(&mut self, _event: &StepEvent) {}
}

/// Forwards events to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl TraceObserver for LogObserver {
    fn on_step(&mut self, event: &StepEvent) {
        log::debug!(
            "step {}: rule {} (depth {}) {} -> {}, pending {} -> {}, tape: {}",
            event.step,
            event.rule,
            event.depth,
            event.from_state,
            event.to_state,
            event.pending_before,
            event.pending_after,
            event.tape.join(" ")
        );
    }
}

/// Collects events, mostly for tests.
impl TraceObserver for Vec<StepEvent> {
    fn on_step(&mut self, event: &StepEvent) {
        self.push(event.clone());
    }
}
