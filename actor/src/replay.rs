//! In-memory replay buffer for self-play positions
//!
//! Every finished self-play game yields one [`PositionRecord`] per move:
//! the encoded board, the search distribution over all cells and the final
//! outcome from the mover's perspective. The buffer keeps the most recent
//! `capacity` positions; square boards are stored together with their
//! rotations and reflections.
//!
//! Finished games can additionally be appended to a JSON Lines file by
//! [`EpisodeWriter`], one [`EpisodeRecord`] per line, and the buffer's own
//! contents saved with [`ReplayBuffer::save`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One training position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Board encoding, `shape[0]` planes of `shape[1] × shape[2]`, row-major
    pub state: Vec<f32>,
    /// `[planes, height, width]`
    pub shape: [usize; 3],
    /// Search distribution over every cell, indexed like the board
    pub probabilities: Vec<f32>,
    /// Side to move: 1 or 2
    pub player: u8,
    /// Final result for `player`: +1 win, -1 loss, 0 tie
    pub outcome: f32,
}

/// One finished self-play game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode_id: String,
    pub actor_id: String,
    /// Winning side (1 or 2), `None` for a tie
    pub winner: Option<u8>,
    pub length: u32,
    /// Moves in play order, as cell indices
    pub moves: Vec<usize>,
    pub positions: Vec<PositionRecord>,
    pub timestamp: u64,
}

/// Bounded FIFO of training positions.
#[derive(Debug)]
pub struct ReplayBuffer {
    capacity: usize,
    positions: VecDeque<PositionRecord>,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            positions: VecDeque::with_capacity(capacity.min(1 << 16)),
        }
    }

    /// Add the positions of one game, augmented with board symmetries.
    ///
    /// Returns the number of positions added. The oldest positions are
    /// dropped once the buffer is full.
    pub fn push_episode(&mut self, positions: &[PositionRecord]) -> usize {
        let mut added = 0;
        for position in positions {
            for variant in symmetries(position) {
                if self.capacity == 0 {
                    return added;
                }
                if self.positions.len() == self.capacity {
                    self.positions.pop_front();
                }
                self.positions.push_back(variant);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionRecord> {
        self.positions.iter()
    }

    /// Write every buffered position to `path` as JSON Lines, oldest first,
    /// replacing any earlier snapshot. Returns the number of lines written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        // Write to temp file then rename
        let temp_path = path.with_extension("jsonl.tmp");
        let file = File::create(&temp_path)
            .with_context(|| format!("creating {}", temp_path.display()))?;
        let mut writer = BufWriter::new(file);
        for position in self.iter() {
            serde_json::to_writer(&mut writer, position).context("serializing position")?;
            writer.write_all(b"\n")?;
        }
        writer
            .flush()
            .with_context(|| format!("flushing {}", temp_path.display()))?;
        drop(writer);

        fs::rename(&temp_path, path)
            .with_context(|| format!("renaming {} to {}", temp_path.display(), path.display()))?;
        debug!(
            positions = self.positions.len(),
            path = %path.display(),
            "Saved replay buffer"
        );
        Ok(self.positions.len())
    }
}

/// The eight rotations and reflections of a position on a square board.
///
/// Non-square boards only have their identity here. The first element is
/// always the position itself.
pub fn symmetries(position: &PositionRecord) -> Vec<PositionRecord> {
    let [planes, height, width] = position.shape;
    let cells = height * width;
    if height != width
        || position.probabilities.len() != cells
        || position.state.len() != planes * cells
    {
        return vec![position.clone()];
    }

    let n = width;
    let mut variants = Vec::with_capacity(8);
    let mut map: Vec<usize> = (0..cells).collect();
    for _ in 0..4 {
        variants.push(remap(position, &map));
        variants.push(remap(position, &flip(&map, n)));
        map = rotate(&map, n);
    }
    variants
}

/// Quarter turn counter-clockwise of a source-index map.
fn rotate(map: &[usize], n: usize) -> Vec<usize> {
    (0..n * n)
        .map(|i| {
            let (r, c) = (i / n, i % n);
            map[c * n + (n - 1 - r)]
        })
        .collect()
}

/// Left-right mirror of a source-index map.
fn flip(map: &[usize], n: usize) -> Vec<usize> {
    (0..n * n)
        .map(|i| {
            let (r, c) = (i / n, i % n);
            map[r * n + (n - 1 - c)]
        })
        .collect()
}

/// `new[i] = old[map[i]]` on every plane and on the probabilities.
fn remap(position: &PositionRecord, map: &[usize]) -> PositionRecord {
    let cells = map.len();
    let state = position
        .state
        .chunks(cells)
        .flat_map(|plane| map.iter().map(move |&src| plane[src]))
        .collect();
    let probabilities = map.iter().map(|&src| position.probabilities[src]).collect();

    PositionRecord {
        state,
        shape: position.shape,
        probabilities,
        player: position.player,
        outcome: position.outcome,
    }
}

/// Appends finished games to a JSON Lines file.
pub struct EpisodeWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl EpisodeWriter {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, record: &EpisodeRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .with_context(|| format!("serializing episode {}", record.episode_id))?;
        self.writer.write_all(b"\n")?;
        debug!(
            episode_id = %record.episode_id,
            path = %self.path.display(),
            "Appended episode record"
        );
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("flushing {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
