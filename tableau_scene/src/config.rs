// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain configuration structs, loadable with `serde`.

use serde::Deserialize;

/// Stage geometry and initial state.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Stage width in stage units.
    pub width: f64,
    /// Stage height in stage units.
    pub height: f64,
    /// Horizontal display scale.
    pub scale_x: f64,
    /// Vertical display scale.
    pub scale_y: f64,
    /// Start paused.
    pub paused: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            scale_x: 1.0,
            scale_y: 1.0,
            paused: false,
        }
    }
}

/// Tick source settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    /// Nominal time between ticks in milliseconds.
    pub interval_ms: f64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self { interval_ms: 50.0 }
    }
}
