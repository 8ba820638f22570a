use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct StepTimings {
    pub step: Duration,
    pub record: Duration,
    pub total: Duration,
}

/// Hook for capturing per-step timings from [`crate::HeadlessRunner::step_profiled`].
pub trait Profiler {
    fn on_step(&mut self, _frame: usize, _timings: StepTimings) {}
}

/// Keeps the slowest step seen so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorstStep {
    pub frame: usize,
    pub timings: StepTimings,
}

impl Profiler for WorstStep {
    fn on_step(&mut self, frame: usize, timings: StepTimings) {
        if timings.total >= self.timings.total {
            self.frame = frame;
            self.timings = timings;
        }
    }
}
