// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick source driving [`Stage::step`](crate::Stage::step).
//!
//! [`Ticker`] is clock-agnostic: callers feed it the current time in milliseconds
//! through [`Ticker::advance`]. [`Ticker::run`] is a convenience loop over the
//! monotonic clock.
//!
//! ```
//! use tableau_scene::timer::Ticker;
//! use tableau_scene::TickerConfig;
//!
//! let mut ticker = Ticker::new(TickerConfig::default());
//! ticker.start(1000.0);
//! let tick = ticker.advance(1040.0).unwrap();
//! assert_eq!(tick.delta_time, 40.0);
//! ticker.pause();
//! assert!(ticker.advance(1090.0).is_none());
//! ```

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::TickerConfig;

/// Timing delivered with every tick, in milliseconds.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickInfo {
    /// Time of the previous tick.
    pub last_time: f64,
    /// Time of this tick.
    pub current_time: f64,
    /// Elapsed time used for animation.
    pub delta_time: f64,
    /// Measured elapsed time.
    pub real_delta_time: f64,
}

impl TickInfo {
    /// A tick `delta` milliseconds after `last_time`.
    pub fn new(last_time: f64, delta: f64) -> Self {
        Self {
            last_time,
            current_time: last_time + delta,
            delta_time: delta,
            real_delta_time: delta,
        }
    }
}

struct Delayed {
    due: f64,
    callback: Box<dyn FnOnce(&TickInfo)>,
}

/// A start/stop/pause-able tick generator.
pub struct Ticker {
    interval: Duration,
    info: TickInfo,
    running: bool,
    paused: bool,
    delayed: Vec<Delayed>,
}

impl core::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ticker")
            .field("interval", &self.interval)
            .field("info", &self.info)
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("delayed", &self.delayed.len())
            .finish()
    }
}

impl Ticker {
    /// A stopped ticker.
    pub fn new(config: TickerConfig) -> Self {
        Self {
            interval: Duration::from_secs_f64(config.interval_ms.max(0.0) / 1000.0),
            info: TickInfo::default(),
            running: false,
            paused: false,
            delayed: Vec::new(),
        }
    }

    /// Nominal time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The last delivered tick.
    pub fn info(&self) -> &TickInfo {
        &self.info
    }

    /// Whether the ticker is started.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether ticks are currently skipped.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Start ticking from `now`. Starting a running ticker does nothing.
    pub fn start(&mut self, now: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.info.last_time = now;
        self.info.current_time = now;
        debug!(now, "ticker started");
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        self.running = false;
        debug!("ticker stopped");
    }

    /// Skip ticks until [`Ticker::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Deliver ticks again. Time spent paused shows up in the next delta.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Produce the tick for `now` and fire due delayed callbacks.
    ///
    /// Returns `None`, without touching any state, while stopped or paused.
    pub fn advance(&mut self, now: f64) -> Option<TickInfo> {
        if !self.running || self.paused {
            return None;
        }
        let delta = now - self.info.last_time;
        self.info.current_time = now;
        self.info.delta_time = delta;
        self.info.real_delta_time = delta;

        let info = self.info;
        let (due, pending): (Vec<_>, Vec<_>) =
            core::mem::take(&mut self.delayed).into_iter().partition(|d| now >= d.due);
        self.delayed = pending;
        for d in due {
            (d.callback)(&info);
        }

        self.info.last_time = now;
        Some(info)
    }

    /// Run `callback` once, on the first tick at or after `now + after`.
    pub fn delay(&mut self, after: f64, now: f64, callback: impl FnOnce(&TickInfo) + 'static) {
        self.delayed.push(Delayed {
            due: now + after,
            callback: Box::new(callback),
        });
    }

    /// Tick on the monotonic clock until `on_tick` returns `false` or the ticker is
    /// stopped. Blocks the calling thread between ticks.
    pub fn run(&mut self, mut on_tick: impl FnMut(&TickInfo) -> bool) {
        let epoch = Instant::now();
        let now = || epoch.elapsed().as_secs_f64() * 1000.0;
        self.start(now());
        while self.running {
            let started = Instant::now();
            if let Some(info) = self.advance(now()) {
                if !on_tick(&info) {
                    self.stop();
                    break;
                }
            }
            if let Some(rest) = self.interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn stopped_and_paused_tickers_do_nothing() {
        let mut t = Ticker::new(TickerConfig::default());
        assert!(t.advance(10.0).is_none(), "not started");
        t.start(0.0);
        t.pause();
        assert!(t.advance(50.0).is_none(), "paused");
        assert_eq!(t.info().current_time, 0.0, "paused tick must not mutate");
        t.resume();
        let tick = t.advance(100.0).unwrap();
        assert_eq!(tick.delta_time, 100.0);
        assert_eq!(tick.last_time, 0.0);
        t.stop();
        assert!(t.advance(150.0).is_none(), "stopped");
    }

    #[test]
    fn delay_fires_once_when_due() {
        let fired = Rc::new(Cell::new(0));
        let mut t = Ticker::new(TickerConfig { interval_ms: 10.0 });
        t.start(0.0);
        let seen = fired.clone();
        t.delay(25.0, 0.0, move |info| {
            assert_eq!(info.current_time, 30.0, "fires on the first tick past due");
            seen.set(seen.get() + 1);
        });
        t.advance(10.0);
        t.advance(20.0);
        assert_eq!(fired.get(), 0);
        t.advance(30.0);
        t.advance(40.0);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn run_stops_when_callback_declines() {
        let mut t = Ticker::new(TickerConfig { interval_ms: 1.0 });
        let mut ticks = 0;
        t.run(|_| {
            ticks += 1;
            ticks < 3
        });
        assert_eq!(ticks, 3);
        assert!(!t.is_running());
    }
}
