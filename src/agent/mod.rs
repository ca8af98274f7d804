//! Agents: the players (sliders) and the environment (placer).
//!
//! Every variant implements [`Agent`]. The set of sliders is closed and
//! picked at construction through [`Slider`].

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::action::Action;
use crate::config::{AgentConfig, ConfigError};
use crate::engine::Board;
use crate::ntuple::PatternError;
use crate::weights::WeightError;

mod heuristic;
mod placer;
mod random;
pub mod td;

pub use heuristic::MergeLargerSlider;
pub use placer::RandomPlacer;
pub use random::RandomSlider;
pub use td::TdSlider;

#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Weights(#[from] WeightError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("unknown slider kind `{0}` (expected random, heuristic or td)")]
    UnknownKind(String),
}

/// The contract shared by every agent.
pub trait Agent {
    fn config(&self) -> &AgentConfig;

    fn open_episode(&mut self, _flag: &str) {}

    fn close_episode(&mut self, _flag: &str) {}

    /// Next action for `board`, or `None` when the agent has nothing legal to play.
    fn take_action(&mut self, board: &Board) -> Option<Action>;

    fn check_for_win(&self, _board: &Board) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.config().name
    }

    fn role(&self) -> &str {
        &self.config().role
    }

    /// Write any state the agent is configured to save.
    fn persist(&self) -> Result<(), AgentError> {
        Ok(())
    }
}

/// Seeded generator when `seed` is given, otherwise one seeded from the OS.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Index of the largest value, the first one on ties.
///
/// Entries that are `-inf` or NaN are never selected; `None` when nothing else is left.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, v)| v > f32::NEG_INFINITY)
        .fold(None, |best: Option<(usize, f32)>, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderKind {
    Random,
    Heuristic,
    Td,
}

impl FromStr for SliderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SliderKind::Random),
            "heuristic" | "merge-larger" => Ok(SliderKind::Heuristic),
            "td" | "ntuple" => Ok(SliderKind::Td),
            other => Err(AgentError::UnknownKind(other.to_owned())),
        }
    }
}

impl fmt::Display for SliderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SliderKind::Random => "random",
            SliderKind::Heuristic => "heuristic",
            SliderKind::Td => "td",
        })
    }
}

/// One of the slider variants.
pub enum Slider {
    Random(RandomSlider),
    Heuristic(MergeLargerSlider),
    Td(Box<TdSlider>),
}

impl Slider {
    pub fn new(kind: SliderKind, args: &str) -> Result<Self, AgentError> {
        Ok(match kind {
            SliderKind::Random => Slider::Random(RandomSlider::new(args)?),
            SliderKind::Heuristic => Slider::Heuristic(MergeLargerSlider::new(args)?),
            SliderKind::Td => Slider::Td(Box::new(TdSlider::new(args)?)),
        })
    }

    fn inner(&self) -> &dyn Agent {
        match self {
            Slider::Random(a) => a,
            Slider::Heuristic(a) => a,
            Slider::Td(a) => a.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Agent {
        match self {
            Slider::Random(a) => a,
            Slider::Heuristic(a) => a,
            Slider::Td(a) => a.as_mut(),
        }
    }
}

impl Agent for Slider {
    fn config(&self) -> &AgentConfig {
        self.inner().config()
    }

    fn open_episode(&mut self, flag: &str) {
        self.inner_mut().open_episode(flag)
    }

    fn close_episode(&mut self, flag: &str) {
        self.inner_mut().close_episode(flag)
    }

    fn take_action(&mut self, board: &Board) -> Option<Action> {
        self.inner_mut().take_action(board)
    }

    fn check_for_win(&self, board: &Board) -> bool {
        self.inner().check_for_win(board)
    }

    fn persist(&self) -> Result<(), AgentError> {
        self.inner().persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_argmax_picks_first_maximum() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax(&[f32::NEG_INFINITY, -5.0, f32::NEG_INFINITY, -7.0]), Some(1));
        assert_eq!(argmax(&[f32::NEG_INFINITY; 4]), None);
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 0.5]), Some(1));
    }

    #[test]
    fn it_parses_slider_kinds() {
        assert_eq!("td".parse::<SliderKind>().unwrap(), SliderKind::Td);
        assert_eq!("merge-larger".parse::<SliderKind>().unwrap(), SliderKind::Heuristic);
        assert!(matches!("greedy".parse::<SliderKind>(), Err(AgentError::UnknownKind(_))));
        assert_eq!(SliderKind::Random.to_string(), "random");
    }

    #[test]
    fn it_builds_each_slider() {
        let board = Board::from_cells([0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        for (kind, args) in [
            (SliderKind::Random, "seed=1"),
            (SliderKind::Heuristic, ""),
            (SliderKind::Td, "init=65536,65536"),
        ] {
            let mut slider = Slider::new(kind, args).unwrap();
            assert_eq!(slider.role(), "slider");
            slider.open_episode("");
            assert!(slider.take_action(&board).is_some_and(|a| a.is_slide()));
            slider.close_episode("");
        }
    }

    #[test]
    fn learner_without_weights_is_a_config_error() {
        let err = Slider::new(SliderKind::Td, "alpha=0.1").err().unwrap();
        assert!(matches!(err, AgentError::Config(ConfigError::Missing(_))));
    }
}
