//! One game: the live board, turn order and the record of applied moves.
//!
//! The placer opens with [`INITIAL_TILES`] placements; after that slider and
//! placer alternate, slider first.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::action::Action;
use crate::agent::Agent;
use crate::bag::placement_positions;
use crate::engine::{Board, Rank, Reward, ILLEGAL_MOVE};

/// Placements made before the first slide.
pub const INITIAL_TILES: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Slider,
    Placer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub action: Action,
    pub reward: Reward,
    /// Time since the previous move was applied.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub score: u64,
    pub max_rank: Rank,
    pub highest_tile: u32,
    pub slides: usize,
    pub placements: usize,
    pub duration_secs: f64,
}

impl EpisodeSummary {
    pub fn moves(&self) -> usize {
        self.slides + self.placements
    }
}

#[derive(Debug, Clone)]
pub struct Episode {
    board: Board,
    score: u64,
    moves: Vec<Move>,
    started: Instant,
    last_tick: Instant,
    ended: Option<Instant>,
}

impl Default for Episode {
    fn default() -> Self {
        Self::new()
    }
}

impl Episode {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { board: Board::EMPTY, score: 0, moves: Vec::with_capacity(1024), started: now, last_tick: now, ended: None }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Whose move it is.
    pub fn turn(&self) -> Turn {
        match self.moves.len() {
            n if n < INITIAL_TILES => Turn::Placer,
            n if (n - INITIAL_TILES) % 2 == 0 => Turn::Slider,
            _ => Turn::Placer,
        }
    }

    /// Apply `action` for the side whose turn it is.
    ///
    /// Returns false, leaving the episode untouched, when the action belongs to
    /// the other side, when the board rejects it, or when a placement misses
    /// the vacated edge while that edge still has room.
    pub fn apply_action(&mut self, action: Action) -> bool {
        match (self.turn(), action) {
            (Turn::Slider, Action::Slide(_)) => {}
            (Turn::Placer, Action::Place { pos, .. }) => {
                let edge = placement_positions(self.board.last());
                let pos = pos as usize;
                if !edge.contains(&pos) && edge.iter().any(|&p| self.board.cell(p) == 0) {
                    return false;
                }
            }
            _ => return false,
        }

        let reward = action.apply(&mut self.board);
        if reward == ILLEGAL_MOVE {
            return false;
        }
        self.score += reward as u64;
        let now = Instant::now();
        self.moves.push(Move { action, reward, elapsed: now - self.last_tick });
        self.last_tick = now;
        true
    }

    /// Run the episode to its end and summarize it.
    ///
    /// Stops when the agent to move has no action, its action is rejected, or
    /// it reports a win.
    pub fn play(&mut self, slider: &mut dyn Agent, placer: &mut dyn Agent) -> EpisodeSummary {
        let flag = format!("{}:{}", slider.name(), placer.name());
        slider.open_episode(&flag);
        placer.open_episode(&flag);

        loop {
            let who: &mut dyn Agent = match self.turn() {
                Turn::Slider => &mut *slider,
                Turn::Placer => &mut *placer,
            };
            let Some(action) = who.take_action(&self.board) else {
                break;
            };
            if !self.apply_action(action) {
                log::debug!("{} played rejected action {action} on {:?}", who.name(), self.board);
                break;
            }
            if who.check_for_win(&self.board) {
                break;
            }
        }
        self.ended = Some(Instant::now());

        slider.close_episode(&flag);
        placer.close_episode(&flag);
        let summary = self.summary();
        log::debug!("episode {flag} finished: score {}, max tile {}", summary.score, summary.highest_tile);
        summary
    }

    pub fn summary(&self) -> EpisodeSummary {
        let slides = self.moves.iter().filter(|m| m.action.is_slide()).count();
        let end = self.ended.unwrap_or_else(Instant::now);
        EpisodeSummary {
            score: self.score,
            max_rank: self.board.max_rank(),
            highest_tile: self.board.highest_tile(),
            slides,
            placements: self.moves.len() - slides,
            duration_secs: (end - self.started).as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{RandomPlacer, RandomSlider};
    use crate::bag::plan_placement;
    use crate::engine::Direction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn it_follows_turn_order() {
        let mut episode = Episode::new();
        let mut placer = RandomPlacer::new("seed=1").unwrap();
        for _ in 0..INITIAL_TILES {
            assert_eq!(episode.turn(), Turn::Placer);
            assert!(!episode.apply_action(Action::slide(Direction::Left)));
            let action = placer.take_action(episode.board()).unwrap();
            assert!(episode.apply_action(action));
        }
        assert_eq!(episode.turn(), Turn::Slider);
        assert_eq!(episode.board().count_empty() as usize, 16 - INITIAL_TILES);
    }

    #[test]
    fn it_keeps_placements_on_the_vacated_edge() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut episode = Episode::new();
        let mut placer = RandomPlacer::new("seed=8").unwrap();
        for _ in 0..INITIAL_TILES {
            let action = placer.take_action(episode.board()).unwrap();
            assert!(episode.apply_action(action));
        }
        let dir = Direction::ALL.into_iter().find(|&d| episode.board().can_slide(d)).unwrap();
        assert!(episode.apply_action(Action::slide(dir)));

        let (tile, hint) = match plan_placement(episode.board(), &mut rng).unwrap() {
            Action::Place { tile, hint, .. } => (tile, hint),
            other => panic!("expected a placement, got {other:?}"),
        };
        let edge = placement_positions(Some(dir));
        let off = (0..16).find(|p| !edge.contains(p) && episode.board().cell(*p) == 0).unwrap();
        let on = edge.iter().copied().find(|&p| episode.board().cell(p) == 0).unwrap();
        let before = episode.moves().len();
        assert!(!episode.apply_action(Action::place(off, tile, hint)));
        assert_eq!(episode.moves().len(), before);
        assert!(episode.apply_action(Action::place(on, tile, hint)));
        assert_eq!(episode.turn(), Turn::Slider);
    }

    #[test]
    fn it_plays_to_the_end() {
        let mut slider = RandomSlider::new("seed=21").unwrap();
        let mut placer = RandomPlacer::new("seed=22").unwrap();
        let mut episode = Episode::new();
        let summary = episode.play(&mut slider, &mut placer);

        assert!(episode.board().is_game_over());
        assert_eq!(summary.placements, INITIAL_TILES + summary.slides);
        assert_eq!(summary.moves(), episode.moves().len());
        let rewards: u64 = episode.moves().iter().map(|m| m.reward as u64).sum();
        assert_eq!(summary.score, rewards);
        assert_eq!(summary.highest_tile, episode.board().highest_tile());
        assert!(summary.max_rank >= 3);
    }

    #[test]
    fn it_replays_with_the_same_seeds() {
        let run = || {
            let mut slider = RandomSlider::new("seed=5").unwrap();
            let mut placer = RandomPlacer::new("seed=6").unwrap();
            let mut episode = Episode::new();
            let summary = episode.play(&mut slider, &mut placer);
            (summary.score, summary.slides, episode.board().raw())
        };
        assert_eq!(run(), run());
    }
}
