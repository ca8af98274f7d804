//! N-tuple TD(0) slider.
//!
//! Moves are chosen greedily over the 1-ply afterstate value: compressed
//! slide reward plus the n-tuple estimate of the resulting board. Every
//! chosen afterstate is recorded in a [`Trajectory`]; at episode end
//! [`backward_update`] walks it from the last step to the first.

use serde::Serialize;

use super::{argmax, Agent, AgentError};
use crate::action::Action;
use crate::config::{AgentConfig, ConfigError};
use crate::engine::{Board, Direction, Reward, ILLEGAL_MOVE};
use crate::ntuple::{FeatureExtractor, Pattern};
use crate::weights::{Address, Weight, WeightError, WeightStore};

const TRAJECTORY_RESERVE: usize = 1000;

/// Map a raw slide reward onto a power-of-two scale: `(1 << floor(ln(r + 1))) << 5`.
#[inline]
pub fn compress_reward(reward: Reward) -> Weight {
    let bin = (reward.max(0) as f64 + 1.0).ln().floor() as u32;
    ((1u32 << bin) << 5) as Weight
}

/// Per-episode record of chosen afterstates.
///
/// Addresses live in one flat buffer, `stride` per step, so clearing between
/// episodes keeps the allocation.
#[derive(Debug, Clone)]
pub struct Trajectory {
    stride: usize,
    addresses: Vec<Address>,
    rewards: Vec<Weight>,
}

impl Trajectory {
    /// `stride` is the number of addresses per step and must be non-zero.
    pub fn with_capacity(stride: usize, steps: usize) -> Self {
        assert!(stride > 0, "trajectory stride must be non-zero");
        Self { stride, addresses: Vec::with_capacity(stride * steps), rewards: Vec::with_capacity(steps) }
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
        self.rewards.clear();
    }

    pub fn record<I: IntoIterator<Item = Address>>(&mut self, addresses: I, reward: Weight) {
        let before = self.addresses.len();
        self.addresses.extend(addresses);
        debug_assert_eq!(self.addresses.len() - before, self.stride);
        self.rewards.push(reward);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Steps in play order; call `.rev()` to walk them backward.
    pub fn steps(&self) -> impl DoubleEndedIterator<Item = (&[Address], Weight)> + '_ {
        self.addresses.chunks_exact(self.stride).zip(self.rewards.iter().copied())
    }
}

/// Outcome of one backward pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BackupStats {
    pub steps: usize,
    pub max_abs_loss: Weight,
    pub mean_abs_loss: Weight,
}

/// One backward TD pass over `trajectory`.
///
/// Walking from the last step, each step's target is the reward recorded one
/// step later plus that step's value before its own update; the terminal step
/// targets 0. Every address of a step moves by `alpha * loss`, once per
/// occurrence, so tied patterns receive the update repeatedly.
pub fn backward_update(store: &mut WeightStore, trajectory: &Trajectory, alpha: Weight) -> BackupStats {
    let mut next_value = 0.0;
    let mut pending_reward = 0.0;
    let mut stats = BackupStats { steps: trajectory.len(), ..Default::default() };
    let mut abs_sum = 0.0f64;

    for (addresses, reward) in trajectory.steps().rev() {
        let current_value = store.value(addresses);
        let loss = pending_reward + next_value - current_value;
        for &addr in addresses {
            store.add(addr, alpha * loss);
        }
        stats.max_abs_loss = stats.max_abs_loss.max(loss.abs());
        abs_sum += loss.abs() as f64;
        next_value = current_value;
        pending_reward = reward;
    }
    if stats.steps > 0 {
        stats.mean_abs_loss = (abs_sum / stats.steps as f64) as Weight;
    }
    stats
}

/// Greedy afterstate learner over an n-tuple network.
pub struct TdSlider {
    config: AgentConfig,
    store: WeightStore,
    features: FeatureExtractor,
    trajectory: Trajectory,
}

impl TdSlider {
    /// Build from a `key=value` string; needs `init` or `load`.
    pub fn new(args: &str) -> Result<Self, AgentError> {
        Self::from_config(AgentConfig::with_defaults("td", "slider", args)?)
    }

    /// Rows and columns as 4-tuples over the store built from `config`.
    pub fn from_config(config: AgentConfig) -> Result<Self, AgentError> {
        let store = open_store(&config)?;
        Self::with_store(config, store, FeatureExtractor::rows_and_columns())
    }

    pub fn with_store(config: AgentConfig, store: WeightStore, patterns: Vec<Pattern>) -> Result<Self, AgentError> {
        let features = FeatureExtractor::for_store(patterns, &store)?;
        let trajectory = Trajectory::with_capacity(features.len(), TRAJECTORY_RESERVE);
        Ok(Self { config, store, features, trajectory })
    }

    /// Swap in a different pattern set over the same weights.
    pub fn with_patterns(self, patterns: Vec<Pattern>) -> Result<Self, AgentError> {
        Self::with_store(self.config, self.store, patterns)
    }

    pub fn weights(&self) -> &WeightStore {
        &self.store
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Candidate value per direction in `Direction::ALL` order; `-inf` marks an illegal slide.
    pub fn evaluate(&self, board: &Board) -> [Weight; 4] {
        Direction::ALL.map(|dir| {
            let mut after = *board;
            match after.slide(dir) {
                ILLEGAL_MOVE => Weight::NEG_INFINITY,
                reward => compress_reward(reward) + self.features.value(&after, &self.store),
            }
        })
    }
}

impl Agent for TdSlider {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn open_episode(&mut self, _flag: &str) {
        self.trajectory.clear();
    }

    fn close_episode(&mut self, _flag: &str) {
        if self.config.alpha != 0.0 {
            let stats = backward_update(&mut self.store, &self.trajectory, self.config.alpha);
            log::debug!(
                "td update over {} steps, max |loss| {:.3}, mean |loss| {:.3}",
                stats.steps,
                stats.max_abs_loss,
                stats.mean_abs_loss
            );
        }
        self.trajectory.clear();
    }

    fn take_action(&mut self, board: &Board) -> Option<Action> {
        let values = self.evaluate(board);
        if values.iter().any(|v| v.is_nan()) {
            log::warn!("weights diverged: afterstate values {values:?} on {board:?}");
        }
        let best = argmax(&values)?;
        let dir = Direction::ALL[best];
        let mut after = *board;
        let reward = after.slide(dir);
        self.trajectory.record(self.features.addresses(&after), compress_reward(reward));
        Some(Action::slide(dir))
    }

    fn persist(&self) -> Result<(), AgentError> {
        if let Some(path) = &self.config.save {
            self.store.save(path)?;
            log::info!("saved weights {:?} to {}", self.store.sizes(), path.display());
        }
        Ok(())
    }
}

// `load` wins over `init`; when both are given their table sizes must agree.
fn open_store(config: &AgentConfig) -> Result<WeightStore, AgentError> {
    match (&config.init, &config.load) {
        (None, None) => Err(ConfigError::Missing("init".into()).into()),
        (Some(sizes), None) => Ok(WeightStore::with_sizes(sizes)?),
        (init, Some(path)) => {
            let store = WeightStore::load(path)?;
            match init {
                Some(sizes) if *sizes != store.sizes() => {
                    Err(WeightError::Shape { expected: sizes.clone(), found: store.sizes() }.into())
                }
                _ => Ok(store),
            }
        }
    }
}
