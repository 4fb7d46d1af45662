//! Draggable bottom panel with three detents.
//!
//! Drag gestures move the panel continuously, but its state only changes
//! when the gesture ends (or on a programmatic request). The end-of-drag
//! decision uses two thresholds, expressed as fractions of panel height:
//!
//! ```text
//!   Δ > large            collapse one step   High→Mid, Mid→Low
//!   small < Δ ≤ large    High→Low            (other states unchanged)
//!   |Δ| ≤ small          unchanged           (springs back)
//!   -large ≤ Δ < -small  Low→High            (other states unchanged)
//!   Δ < -large           expand one step     Low→Mid, Mid→High
//! ```
//!
//! Positive Δ is downward (collapsing).

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

/// Default panel height in points.
pub const DEFAULT_PANEL_HEIGHT: f64 = 800.0;

/// Default small-gesture threshold (fraction of height).
pub const DEFAULT_SMALL_THRESHOLD: f64 = 0.15;

/// Default large-gesture threshold (fraction of height).
pub const DEFAULT_LARGE_THRESHOLD: f64 = 0.33;

/// Panel detents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PanelState {
    /// Mostly collapsed.
    #[default]
    Low,
    /// Half open.
    Mid,
    /// Mostly expanded.
    High,
}

impl PanelState {
    /// One step towards `Low`, saturating.
    pub fn collapsed(self) -> Self {
        match self {
            PanelState::High => PanelState::Mid,
            PanelState::Mid | PanelState::Low => PanelState::Low,
        }
    }

    /// One step towards `High`, saturating.
    pub fn expanded(self) -> Self {
        match self {
            PanelState::Low => PanelState::Mid,
            PanelState::Mid | PanelState::High => PanelState::High,
        }
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PanelState::Low => "low",
            PanelState::Mid => "mid",
            PanelState::High => "high",
        };
        f.write_str(name)
    }
}

/// Invalid panel geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelConfigError {
    #[error("Panel height must be positive, got {0}")]
    InvalidHeight(f64),

    #[error("Thresholds must satisfy 0 < small ({small}) < large ({large}) < 1")]
    InvalidThresholds { small: f64, large: f64 },

    #[error("Offset fractions must satisfy 0 <= high ({high}) < mid ({mid}) < low ({low}) <= 1")]
    InvalidOffsets { low: f64, mid: f64, high: f64 },
}

/// Panel geometry and gesture thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    /// Total travel range of the panel, in points.
    pub height: f64,
    /// Gestures at or below this fraction of `height` never change state.
    pub small_threshold: f64,
    /// Gestures beyond this fraction step one detent.
    pub large_threshold: f64,
    /// Resting offset of `Low` as a fraction of `height`.
    pub low_offset: f64,
    /// Resting offset of `Mid` as a fraction of `height`.
    pub mid_offset: f64,
    /// Resting offset of `High` as a fraction of `height`.
    pub high_offset: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_PANEL_HEIGHT,
            small_threshold: DEFAULT_SMALL_THRESHOLD,
            large_threshold: DEFAULT_LARGE_THRESHOLD,
            low_offset: 0.81,
            mid_offset: 0.50,
            high_offset: 0.10,
        }
    }
}

impl PanelConfig {
    /// Set the panel height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Set both gesture thresholds.
    pub fn with_thresholds(mut self, small: f64, large: f64) -> Self {
        self.small_threshold = small;
        self.large_threshold = large;
        self
    }

    /// Check geometry invariants.
    pub fn validate(&self) -> Result<(), PanelConfigError> {
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(PanelConfigError::InvalidHeight(self.height));
        }
        let (small, large) = (self.small_threshold, self.large_threshold);
        if !(0.0 < small && small < large && large < 1.0) {
            return Err(PanelConfigError::InvalidThresholds { small, large });
        }
        let (low, mid, high) = (self.low_offset, self.mid_offset, self.high_offset);
        if !(0.0 <= high && high < mid && mid < low && low <= 1.0) {
            return Err(PanelConfigError::InvalidOffsets { low, mid, high });
        }
        Ok(())
    }

    fn fraction(&self, state: PanelState) -> f64 {
        match state {
            PanelState::Low => self.low_offset,
            PanelState::Mid => self.mid_offset,
            PanelState::High => self.high_offset,
        }
    }
}

/// End-of-gesture transition for a drag of `delta` (fraction of height).
pub fn resolve(state: PanelState, delta: f64, small: f64, large: f64) -> PanelState {
    if delta > large {
        state.collapsed()
    } else if delta > small {
        match state {
            PanelState::High => PanelState::Low,
            other => other,
        }
    } else if delta < -large {
        state.expanded()
    } else if delta < -small {
        match state {
            PanelState::Low => PanelState::High,
            other => other,
        }
    } else {
        state
    }
}

/// Converts drag gestures into detent transitions.
#[derive(Debug, Clone)]
pub struct PanelStateMachine {
    config: PanelConfig,
    state: PanelState,
    drag_offset: f64,
}

impl PanelStateMachine {
    /// Create a machine resting at `Low`.
    pub fn new(config: PanelConfig) -> Result<Self, PanelConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: PanelState::Low,
            drag_offset: 0.0,
        })
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Live translation of the active gesture, in points. Zero when idle.
    pub fn drag_offset(&self) -> f64 {
        self.drag_offset
    }

    /// Resting offset of `state`, in points from the top of the range.
    pub fn resting_offset(&self, state: PanelState) -> f64 {
        self.config.fraction(state) * self.config.height
    }

    /// Offset to draw right now: resting position plus any live drag,
    /// clamped to the panel range.
    pub fn rendered_offset(&self) -> f64 {
        (self.resting_offset(self.state) + self.drag_offset).clamp(0.0, self.config.height)
    }

    /// Track the gesture's net translation so far. Never changes state.
    pub fn drag_changed(&mut self, delta: f64) {
        self.drag_offset = if delta.is_finite() { delta } else { 0.0 };
    }

    /// Finish the gesture with net translation `delta` (points) and settle.
    pub fn drag_ended(&mut self, delta: f64) -> PanelState {
        self.drag_offset = 0.0;
        if !delta.is_finite() {
            return self.state;
        }
        let fraction = delta / self.config.height;
        let next = resolve(
            self.state,
            fraction,
            self.config.small_threshold,
            self.config.large_threshold,
        );
        if next != self.state {
            info!(from = %self.state, to = %next, delta_fraction = fraction, "Panel moved");
        } else {
            debug!(state = %self.state, delta_fraction = fraction, "Panel sprang back");
        }
        self.state = next;
        next
    }

    /// Programmatic state change.
    pub fn set_state(&mut self, state: PanelState) {
        if state != self.state {
            info!(from = %self.state, to = %state, "Panel set");
            self.state = state;
        }
    }

    /// The search field gained focus.
    pub fn focus_search(&mut self) {
        self.set_state(PanelState::High);
    }

    /// Search was cancelled: collapse and drop any live gesture.
    pub fn cancel(&mut self) {
        self.drag_offset = 0.0;
        self.set_state(PanelState::Low);
    }
}

impl Default for PanelStateMachine {
    fn default() -> Self {
        Self {
            config: PanelConfig::default(),
            state: PanelState::Low,
            drag_offset: 0.0,
        }
    }
}
