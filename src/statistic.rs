//! Block statistics over finished episodes.

use std::fmt;

use serde::Serialize;

use crate::engine::{face_value, Rank, MAX_RANK};
use crate::episode::EpisodeSummary;

/// Share of a block whose highest tile was exactly `tile`, and the share
/// that reached at least `tile`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileRate {
    pub tile: u32,
    pub exact: f64,
    pub reached: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub first_episode: usize,
    pub last_episode: usize,
    pub avg_score: f64,
    pub max_score: u64,
    pub moves_per_sec: f64,
    pub tiles: Vec<TileRate>,
}

impl fmt::Display for BlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\tavg = {:.0}, max = {}, ops = {:.0}",
            self.last_episode, self.avg_score, self.max_score, self.moves_per_sec
        )?;
        for t in &self.tiles {
            write!(f, "\n\t{}\t{:.1}%\t({:.1}%)", t.tile, t.reached * 100.0, t.exact * 100.0)?;
        }
        Ok(())
    }
}

/// Collects episode summaries and reports once per `block` episodes.
#[derive(Debug, Clone)]
pub struct Statistic {
    block: usize,
    episodes: usize,
    window: Vec<EpisodeSummary>,
}

impl Statistic {
    pub fn new(block: usize) -> Self {
        let block = block.max(1);
        Self { block, episodes: 0, window: Vec::with_capacity(block) }
    }

    /// Total episodes seen.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Record one episode; returns the report when it completes a block.
    pub fn push(&mut self, summary: EpisodeSummary) -> Option<BlockReport> {
        self.episodes += 1;
        self.window.push(summary);
        if self.window.len() < self.block {
            return None;
        }
        let report = report(self.episodes - self.window.len() + 1, self.episodes, &self.window);
        self.window.clear();
        Some(report)
    }

    /// Report on a trailing partial block, if any.
    pub fn flush(&mut self) -> Option<BlockReport> {
        if self.window.is_empty() {
            return None;
        }
        let report = report(self.episodes - self.window.len() + 1, self.episodes, &self.window);
        self.window.clear();
        Some(report)
    }
}

fn report(first_episode: usize, last_episode: usize, window: &[EpisodeSummary]) -> BlockReport {
    let n = window.len() as f64;
    let total_score: u64 = window.iter().map(|s| s.score).sum();
    let max_score = window.iter().map(|s| s.score).max().unwrap_or(0);
    let moves: usize = window.iter().map(|s| s.moves()).sum();
    let secs: f64 = window.iter().map(|s| s.duration_secs).sum();

    let mut counts = [0usize; MAX_RANK as usize + 1];
    for s in window {
        counts[s.max_rank as usize] += 1;
    }
    let lowest = counts.iter().position(|&c| c > 0).unwrap_or(0);
    let highest = counts.iter().rposition(|&c| c > 0).unwrap_or(0);
    let mut reached = window.len();
    let tiles = (lowest..=highest)
        .map(|rank| {
            let rate = TileRate {
                tile: face_value(rank as Rank),
                exact: counts[rank] as f64 / n,
                reached: reached as f64 / n,
            };
            reached -= counts[rank];
            rate
        })
        .collect();

    BlockReport {
        first_episode,
        last_episode,
        avg_score: total_score as f64 / n,
        max_score,
        moves_per_sec: if secs > 0.0 { moves as f64 / secs } else { 0.0 },
        tiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(score: u64, max_rank: Rank) -> EpisodeSummary {
        EpisodeSummary {
            score,
            max_rank,
            highest_tile: face_value(max_rank),
            slides: 40,
            placements: 49,
            duration_secs: 0.5,
        }
    }

    #[test]
    fn it_reports_every_block() {
        let mut stat = Statistic::new(2);
        assert_eq!(stat.push(summary(10, 5)), None);
        let report = stat.push(summary(30, 6)).unwrap();
        assert_eq!((report.first_episode, report.last_episode), (1, 2));
        assert_eq!(report.avg_score, 20.0);
        assert_eq!(report.max_score, 30);
        assert_eq!(report.moves_per_sec, 178.0);

        assert_eq!(stat.push(summary(1, 3)), None);
        let tail = stat.flush().unwrap();
        assert_eq!((tail.first_episode, tail.last_episode), (3, 3));
        assert_eq!(stat.flush(), None);
        assert_eq!(stat.episodes(), 3);
    }

    #[test]
    fn it_accumulates_tile_rates() {
        let mut stat = Statistic::new(4);
        let report = [5, 5, 7, 8].into_iter().filter_map(|r| stat.push(summary(0, r))).last().unwrap();
        let tiles: Vec<_> = report.tiles.iter().map(|t| (t.tile, t.reached, t.exact)).collect();
        assert_eq!(
            tiles,
            vec![(12, 1.0, 0.5), (24, 0.5, 0.0), (48, 0.5, 0.25), (96, 0.25, 0.25)]
        );
        let text = report.to_string();
        assert!(text.starts_with("4\tavg = 0, max = 0"));
        assert!(text.contains("\n\t48\t50.0%\t(25.0%)"));
    }

    #[test]
    fn it_serializes_as_json() {
        let mut stat = Statistic::new(1);
        let report = stat.push(summary(7, 4)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["max_score"], 7);
        assert_eq!(json["tiles"][0]["tile"], 6);
    }
}
