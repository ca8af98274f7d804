//! threes-td: a Threes! engine and an n-tuple TD(0) learner
//!
//! This crate provides:
//! - A packed `Board` with table-driven slides (`engine`) and the tile bag that
//!   feeds new tiles onto the vacated edge (`bag`)
//! - Weight tables with a binary file format (`weights`) indexed through
//!   n-tuple patterns (`ntuple`)
//! - Agents behind one `Agent` contract: random, heuristic and TD sliders plus
//!   the random placer (`agent`)
//! - Episode orchestration and block statistics (`episode`, `statistic`)
//!
//! Quick start:
//! ```
//! use threes_td::engine::{self as GameEngine, Board, Direction};
//!
//! // One-time table init
//! GameEngine::new();
//!
//! let mut b = Board::from_cells([0, 3, 3, 0, 1, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
//! assert_eq!(b.slide(Direction::Left), 6 + 3);
//! assert_eq!(b.row(0), [4, 0, 0, 0]);
//! assert_eq!(b.row(1), [3, 0, 0, 0]);
//! ```
//!
//! Training a learner against the random environment:
//! ```
//! use threes_td::agent::{Agent, RandomPlacer, TdSlider};
//! use threes_td::episode::Episode;
//!
//! let mut slider = TdSlider::new("init=65536,65536 alpha=0.1 seed=7").unwrap();
//! let mut placer = RandomPlacer::new("seed=11").unwrap();
//! for _ in 0..3 {
//!     let summary = Episode::new().play(&mut slider, &mut placer);
//!     assert!(summary.slides > 0);
//! }
//! assert!(slider.weights().table(0).iter().any(|&w| w != 0.0));
//! slider.persist().unwrap(); // no `save=` configured: nothing is written
//! ```
pub mod action;
pub mod agent;
pub mod bag;
pub mod config;
pub mod engine;
pub mod episode;
pub mod ntuple;
pub mod statistic;
pub mod weights;
