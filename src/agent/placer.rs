use rand::rngs::StdRng;

use super::{seeded_rng, Agent, AgentError};
use crate::action::Action;
use crate::bag::{plan_placement, plan_placement_anywhere};
use crate::config::AgentConfig;
use crate::engine::Board;

/// The environment: places the hint tile and announces the next one.
pub struct RandomPlacer {
    config: AgentConfig,
    rng: StdRng,
}

impl RandomPlacer {
    pub fn new(args: &str) -> Result<Self, AgentError> {
        let config = AgentConfig::with_defaults("place", "placer", args)?;
        Ok(Self { rng: seeded_rng(config.seed), config })
    }
}

impl Agent for RandomPlacer {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn take_action(&mut self, board: &Board) -> Option<Action> {
        plan_placement(board, &mut self.rng).or_else(|| {
            let fallback = plan_placement_anywhere(board, &mut self.rng);
            if fallback.is_some() {
                log::warn!("edge after {:?} is full, placing anywhere", board.last());
            }
            fallback
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Direction, ILLEGAL_MOVE};

    #[test]
    fn it_falls_back_to_any_empty_cell() {
        let mut board = Board::from_cells([
            0, 3, 1, 0, //
            3, 0, 0, 0, //
            3, 0, 0, 0, //
            3, 0, 0, 0, //
        ]);
        assert_ne!(board.slide(Direction::Left), ILLEGAL_MOVE);
        for pos in [3, 7, 11, 15] {
            board.set_cell(pos, 2);
        }
        let mut placer = RandomPlacer::new("seed=2").unwrap();
        let action = placer.take_action(&board).expect("board has room");
        assert_eq!(action.apply(&mut board), 0);
    }

    #[test]
    fn it_is_deterministic_for_a_seed() {
        let mut a = RandomPlacer::new("seed=99").unwrap();
        let mut b = RandomPlacer::new("seed=99").unwrap();
        let board = Board::EMPTY;
        for _ in 0..10 {
            assert_eq!(a.take_action(&board), b.take_action(&board));
        }
        assert_eq!(a.role(), "placer");
    }

    #[test]
    fn it_passes_on_a_full_board() {
        let board = Board::from_raw(0x1313_3131_1313_3131);
        assert_eq!(RandomPlacer::new("").unwrap().take_action(&board), None);
    }
}
