//! The 16x16 step grid and its tempo state.

use crate::error::{Error, Result};
use crate::instrument::INSTRUMENT_COUNT;

/// Sixteenth-note steps in one loop.
pub const STEP_COUNT: usize = 16;

/// Total number of cells in a pattern.
pub const CELL_COUNT: usize = INSTRUMENT_COUNT * STEP_COUNT;

/// Tempo a fresh pattern plays at.
pub const DEFAULT_BPM: f64 = 120.0;

/// All 256 cells flattened row-major (instrument 0 steps 0..16, then
/// instrument 1, ...). This is exactly what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializedPattern(pub [bool; CELL_COUNT]);

impl SerializedPattern {
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

impl TryFrom<&[bool]> for SerializedPattern {
    type Error = Error;

    fn try_from(cells: &[bool]) -> Result<Self> {
        let cells: [bool; CELL_COUNT] = cells.try_into().map_err(|_| {
            Error::Format(format!(
                "expected {} cells, found {}",
                CELL_COUNT,
                cells.len()
            ))
        })?;
        Ok(Self(cells))
    }
}

/// The grid of active steps per instrument plus the current tempo.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    grid: [[bool; STEP_COUNT]; INSTRUMENT_COUNT],
    bpm: f64,
    tempo_factor: f64,
}

impl Pattern {
    pub fn new() -> Self {
        Self {
            grid: [[false; STEP_COUNT]; INSTRUMENT_COUNT],
            bpm: DEFAULT_BPM,
            tempo_factor: 1.0,
        }
    }

    fn check(instrument: usize, step: usize) -> Result<()> {
        if instrument < INSTRUMENT_COUNT && step < STEP_COUNT {
            Ok(())
        } else {
            Err(Error::Index { instrument, step })
        }
    }

    /// Flip one cell.
    pub fn toggle(&mut self, instrument: usize, step: usize) -> Result<()> {
        Self::check(instrument, step)?;
        let cell = &mut self.grid[instrument][step];
        *cell = !*cell;
        Ok(())
    }

    pub fn set_cell(&mut self, instrument: usize, step: usize, value: bool) -> Result<()> {
        Self::check(instrument, step)?;
        self.grid[instrument][step] = value;
        Ok(())
    }

    pub fn cell(&self, instrument: usize, step: usize) -> Result<bool> {
        Self::check(instrument, step)?;
        Ok(self.grid[instrument][step])
    }

    /// One instrument's steps. Panics on an out-of-range row, like slice indexing.
    pub fn row(&self, instrument: usize) -> &[bool; STEP_COUNT] {
        &self.grid[instrument]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool; STEP_COUNT]> {
        self.grid.iter()
    }

    /// Turn every cell off. Tempo is left alone.
    pub fn clear(&mut self) {
        self.grid = [[false; STEP_COUNT]; INSTRUMENT_COUNT];
    }

    /// Number of cells currently on.
    pub fn active_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|&&on| on).count()
    }

    /// Base tempo in beats per minute.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm;
    }

    pub fn tempo_factor(&self) -> f64 {
        self.tempo_factor
    }

    /// Multiply the tempo-scale factor. Not clamped.
    pub fn scale_tempo_factor(&mut self, multiplier: f64) {
        self.tempo_factor *= multiplier;
    }

    pub fn reset_tempo_factor(&mut self) {
        self.tempo_factor = 1.0;
    }

    /// Tempo the loop actually runs at.
    pub fn effective_bpm(&self) -> f64 {
        self.bpm * self.tempo_factor
    }

    pub fn to_flat_array(&self) -> SerializedPattern {
        let mut cells = [false; CELL_COUNT];
        for (i, row) in self.grid.iter().enumerate() {
            cells[i * STEP_COUNT..(i + 1) * STEP_COUNT].copy_from_slice(row);
        }
        SerializedPattern(cells)
    }

    /// Overwrite every cell from a flat row-major slice.
    ///
    /// Fails with [`Error::Format`] unless the slice holds exactly 256 cells;
    /// the grid is not touched in that case.
    pub fn load_flat_array(&mut self, cells: &[bool]) -> Result<()> {
        let serialized = SerializedPattern::try_from(cells)?;
        self.load_serialized(&serialized);
        Ok(())
    }

    pub fn load_serialized(&mut self, serialized: &SerializedPattern) {
        for (i, row) in self.grid.iter_mut().enumerate() {
            row.copy_from_slice(&serialized.0[i * STEP_COUNT..(i + 1) * STEP_COUNT]);
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}
