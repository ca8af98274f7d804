use super::{Agent, AgentError};
use crate::action::Action;
use crate::config::AgentConfig;
use crate::engine::{Board, Direction};

const BASE_PAIR_SCORE: u32 = 5;
const SPACE_SCORE: u32 = 1;

/// Greedy slider that favours the axis with the larger merges.
///
/// LEFT is tried when the horizontal score is at least the vertical one,
/// UP otherwise; after that the first legal direction in the fixed order.
pub struct MergeLargerSlider {
    config: AgentConfig,
}

impl MergeLargerSlider {
    pub fn new(args: &str) -> Result<Self, AgentError> {
        Ok(Self { config: AgentConfig::with_defaults("merge-larger", "slider", args)? })
    }
}

impl Agent for MergeLargerSlider {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn take_action(&mut self, board: &Board) -> Option<Action> {
        let horizontal = merge_potential(board);
        let mut transposed = *board;
        transposed.transpose();
        let vertical = merge_potential(&transposed);

        let preferred = if horizontal >= vertical { Direction::Left } else { Direction::Up };
        std::iter::once(preferred)
            .chain(Direction::ALL)
            .find(|&dir| board.can_slide(dir))
            .map(Action::slide)
    }
}

/// Merge score of sliding the rows toward index 0.
///
/// A 1-2 pair scores [`BASE_PAIR_SCORE`], an equal pair of rank 3 or more
/// scores its rank, and any empty cell adds [`SPACE_SCORE`] once.
pub fn merge_potential(board: &Board) -> u32 {
    let mut space = 0;
    let mut score = 0;
    for r in 0..4 {
        let row = board.row(r);
        let mut pivot = row[0];
        let mut c = 1;
        while c < 4 {
            let tile = row[c];
            let gain = if tile == 0 {
                space = SPACE_SCORE;
                None
            } else if pivot == 0 {
                pivot = tile;
                None
            } else if tile + pivot == 3 {
                Some(BASE_PAIR_SCORE)
            } else if tile > 2 && tile == pivot {
                Some(pivot as u32)
            } else {
                pivot = tile;
                None
            };
            if let Some(gain) = gain {
                score += gain;
                // The partner is absorbed; resume from the cell after it.
                if c < 3 {
                    pivot = row[c + 1];
                    c += 1;
                }
            }
            c += 1;
        }
    }
    score + space
}
