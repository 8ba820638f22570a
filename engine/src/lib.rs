pub mod agent;
pub mod profiling;
pub mod regression;

use std::{
    fs, io,
    path::Path,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Frame-indexed state history with rewind/forward and branch-on-record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeMachine<State> {
    states: Vec<State>,
    frame: usize,
}

impl<State> TimeMachine<State> {
    pub fn new(initial_state: State) -> Self {
        Self {
            states: vec![initial_state],
            frame: 0,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self) -> &State {
        &self.states[self.frame]
    }

    pub fn state_at(&self, frame: usize) -> Option<&State> {
        self.states.get(frame)
    }

    pub fn history(&self) -> &[State] {
        &self.states
    }

    pub fn can_rewind(&self) -> bool {
        self.frame > 0
    }

    pub fn can_forward(&self) -> bool {
        self.frame + 1 < self.states.len()
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.frame = self.frame.saturating_sub(frames);
        self.frame
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        let max_frame = self.states.len().saturating_sub(1);
        self.frame = (self.frame + frames).min(max_frame);
        self.frame
    }

    pub fn seek(&mut self, frame: usize) -> usize {
        let max_frame = self.states.len().saturating_sub(1);
        self.frame = frame.min(max_frame);
        self.frame
    }

    /// Appends `state` after the current frame, discarding any frames that
    /// were ahead of it.
    pub fn record(&mut self, state: State) -> usize {
        if self.frame + 1 < self.states.len() {
            self.states.truncate(self.frame + 1);
        }
        self.states.push(state);
        self.frame += 1;
        self.frame
    }
}

impl<State: Serialize> TimeMachine<State> {
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, bytes)
    }
}

impl<State: DeserializeOwned> TimeMachine<State> {
    pub fn load_json_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let tm: Self = serde_json::from_slice(&bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed parsing timemachine json {}: {e}", path.display()),
            )
        })?;
        if tm.states.is_empty() || tm.frame >= tm.states.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("timemachine json {} has no state at frame {}", path.display(), tm.frame),
            ));
        }
        Ok(tm)
    }
}

/// Pure step function over an owned state type.
///
/// `is_finished` lets runners stop feeding inputs to a session that has
/// reached a terminal state (won, lost, ...).
pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self) -> Self::State;
    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State;

    fn is_finished(&self, _state: &Self::State) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    timemachine: TimeMachine<G::State>,
}

impl<G: GameLogic> HeadlessRunner<G> {
    pub fn new(game: G) -> Self {
        let initial_state = game.initial_state();
        Self {
            game,
            timemachine: TimeMachine::new(initial_state),
        }
    }

    pub fn from_timemachine(game: G, timemachine: TimeMachine<G::State>) -> Self {
        Self { game, timemachine }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn frame(&self) -> usize {
        self.timemachine.frame()
    }

    pub fn state(&self) -> &G::State {
        self.timemachine.state()
    }

    pub fn history(&self) -> &[G::State] {
        self.timemachine.history()
    }

    pub fn timemachine(&self) -> &TimeMachine<G::State> {
        &self.timemachine
    }

    pub fn is_finished(&self) -> bool {
        self.game.is_finished(self.state())
    }

    pub fn step(&mut self, input: G::Input) -> usize {
        let next_state = self.game.step(self.timemachine.state(), input);
        self.timemachine.record(next_state)
    }

    pub fn step_profiled<P: profiling::Profiler>(
        &mut self,
        input: G::Input,
        profiler: &mut P,
    ) -> usize {
        use std::time::Instant;

        let total_start = Instant::now();

        let step_start = Instant::now();
        let next_state = self.game.step(self.timemachine.state(), input);
        let step_dt = step_start.elapsed();

        let record_start = Instant::now();
        let frame = self.timemachine.record(next_state);
        let record_dt = record_start.elapsed();

        profiler.on_step(
            frame,
            profiling::StepTimings {
                step: step_dt,
                record: record_dt,
                total: total_start.elapsed(),
            },
        );

        frame
    }

    pub fn run<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        let mut last_frame = self.frame();
        for input in inputs {
            last_frame = self.step(input);
        }
        last_frame
    }

    /// Like [`HeadlessRunner::run`] but stops as soon as the game reports a
    /// terminal state. Remaining inputs are not consumed.
    pub fn run_until_finished<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        let mut last_frame = self.frame();
        for input in inputs {
            if self.is_finished() {
                break;
            }
            last_frame = self.step(input);
        }
        last_frame
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.timemachine.rewind(frames)
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        self.timemachine.forward(frames)
    }

    pub fn seek(&mut self, frame: usize) -> usize {
        self.timemachine.seek(frame)
    }
}
