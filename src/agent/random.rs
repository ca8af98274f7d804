use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{seeded_rng, Agent, AgentError};
use crate::action::Action;
use crate::config::AgentConfig;
use crate::engine::{Board, Direction};

/// Plays a uniformly random legal slide.
pub struct RandomSlider {
    config: AgentConfig,
    rng: StdRng,
    order: [Direction; 4],
}

impl RandomSlider {
    pub fn new(args: &str) -> Result<Self, AgentError> {
        let config = AgentConfig::with_defaults("slide", "slider", args)?;
        Ok(Self { rng: seeded_rng(config.seed), config, order: Direction::ALL })
    }
}

impl Agent for RandomSlider {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn take_action(&mut self, board: &Board) -> Option<Action> {
        self.order.shuffle(&mut self.rng);
        self.order
            .iter()
            .copied()
            .find(|&dir| board.can_slide(dir))
            .map(Action::slide)
    }
}
