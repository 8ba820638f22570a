use crate::{GameLogic, HeadlessRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCommand<I> {
    Step(I),
    /// Feed inputs in order until the game reports a terminal state.
    Play(Vec<I>),
    Reset,
    GetState,
    GetHistory,
    Rewind { frames: usize },
    Forward { frames: usize },
    Seek { frame: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse<S> {
    State {
        frame: usize,
        finished: bool,
        state: S,
    },
    History {
        frame: usize,
        history: Vec<S>,
    },
}

/// Command-driven wrapper around a [`HeadlessRunner`], used by bots and
/// scripted opponents that only speak in commands.
pub struct AgentHost<G>
where
    G: GameLogic + Clone,
{
    game: G,
    runner: HeadlessRunner<G>,
}

impl<G> AgentHost<G>
where
    G: GameLogic + Clone,
    G::State: Clone,
{
    pub fn new(game: G) -> Self {
        let runner = HeadlessRunner::new(game.clone());
        Self { game, runner }
    }

    pub fn handle(&mut self, command: AgentCommand<G::Input>) -> AgentResponse<G::State> {
        match command {
            AgentCommand::Step(input) => {
                self.runner.step(input);
            }
            AgentCommand::Play(inputs) => {
                self.runner.run_until_finished(inputs);
            }
            AgentCommand::Reset => {
                self.runner = HeadlessRunner::new(self.game.clone());
            }
            AgentCommand::GetState => {}
            AgentCommand::GetHistory => {
                return AgentResponse::History {
                    frame: self.runner.frame(),
                    history: self.runner.history().to_vec(),
                };
            }
            AgentCommand::Rewind { frames } => {
                self.runner.rewind(frames);
            }
            AgentCommand::Forward { frames } => {
                self.runner.forward(frames);
            }
            AgentCommand::Seek { frame } => {
                self.runner.seek(frame);
            }
        }
        self.state_response()
    }

    pub fn runner(&self) -> &HeadlessRunner<G> {
        &self.runner
    }

    fn state_response(&self) -> AgentResponse<G::State> {
        AgentResponse::State {
            frame: self.runner.frame(),
            finished: self.runner.is_finished(),
            state: self.runner.state().clone(),
        }
    }
}
