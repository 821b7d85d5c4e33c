// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame sequences for animated bitmap nodes.
//!
//! An [`AnimatedSequence`] is a list of [`Frame`]s, each naming a region of the
//! node's drawable. Frames can carry a label, a display interval, a stop flag and a
//! jump to another frame.

use std::collections::HashMap;

use kurbo::Rect;
use tracing::warn;

use crate::error::SceneError;

/// A reference to a frame by index or label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameRef {
    /// Zero-based index.
    Index(usize),
    /// Frame label.
    Label(String),
}

impl From<usize> for FrameRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for FrameRef {
    fn from(label: &str) -> Self {
        Self::Label(label.to_owned())
    }
}

impl core::fmt::Display for FrameRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Label(l) => write!(f, "{l:?}"),
        }
    }
}

/// One frame of an [`AnimatedSequence`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Region of the drawable shown by this frame.
    pub rect: Rect,
    /// Optional label, usable with [`FrameRef::Label`].
    pub label: Option<String>,
    /// Display interval overriding the sequence default.
    pub interval: Option<f64>,
    /// Pause the sequence when this frame is reached.
    pub stop: bool,
    /// Frame to continue with instead of the next one.
    pub jump: Option<FrameRef>,
}

impl Frame {
    /// A plain frame showing `rect`.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            ..Default::default()
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the display interval.
    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Mark as a stop frame.
    pub fn with_stop(mut self) -> Self {
        self.stop = true;
        self
    }

    /// Set the jump target.
    pub fn with_jump(mut self, target: impl Into<FrameRef>) -> Self {
        self.jump = Some(target.into());
        self
    }
}

/// Frame playback state.
///
/// The interval counter accumulates tick deltas while a frame is shown. With an
/// interval of `n`, a frame stays on screen while the accumulated count does not
/// exceed `n`; with delta 1 that is `n` ticks, and the change happens on tick
/// `n + 1`.
#[derive(Clone, Debug, Default)]
pub struct AnimatedSequence {
    frames: Vec<Frame>,
    labels: HashMap<String, usize>,
    current: usize,
    paused: bool,
    /// Advance by one per tick instead of by the tick's elapsed time.
    pub use_frames: bool,
    /// Interval for frames without their own.
    pub interval: f64,
    displayed: f64,
}

impl AnimatedSequence {
    /// A playing sequence over `frames`.
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        let mut seq = Self::default();
        seq.add_frames(frames);
        seq
    }

    /// Use one tick per step rather than elapsed milliseconds.
    pub fn with_use_frames(mut self, use_frames: bool) -> Self {
        self.use_frames = use_frames;
        self
    }

    /// Set the default interval.
    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    /// Append a frame.
    pub fn add_frame(&mut self, frame: Frame) {
        let len = self.frames.len();
        self.set_frame(frame, len);
    }

    /// Append several frames.
    pub fn add_frames(&mut self, frames: impl IntoIterator<Item = Frame>) {
        for frame in frames {
            self.add_frame(frame);
        }
    }

    /// Replace the frame at `index`, or append when `index` is past the end.
    pub fn set_frame(&mut self, frame: Frame, index: usize) {
        let index = if index < self.frames.len() {
            if let Some(old) = self.frames[index].label.take() {
                self.labels.remove(&old);
            }
            self.frames[index] = frame;
            index
        } else {
            self.frames.push(frame);
            self.frames.len() - 1
        };
        if let Some(label) = &self.frames[index].label {
            self.labels.insert(label.clone(), index);
        }
    }

    /// Resolve a frame reference to a valid index.
    pub fn frame_index(&self, frame: &FrameRef) -> Option<usize> {
        match frame {
            FrameRef::Index(i) => (*i < self.frames.len()).then_some(*i),
            FrameRef::Label(l) => self.labels.get(l).copied(),
        }
    }

    /// Look up a frame.
    pub fn frame(&self, frame: &FrameRef) -> Option<&Frame> {
        self.frame_index(frame).and_then(|i| self.frames.get(i))
    }

    /// Index of the frame on screen.
    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Region of the frame on screen.
    pub fn current_rect(&self) -> Option<Rect> {
        self.frames.get(self.current).map(|f| f.rect)
    }

    /// Number of frames.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Resume playback.
    pub fn play(&mut self) {
        self.paused = false;
    }

    /// Pause playback.
    pub fn stop(&mut self) {
        self.paused = true;
    }

    /// Whether playback is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Jump to `frame` and play.
    pub fn goto_and_play(&mut self, frame: impl Into<FrameRef>) -> Result<(), SceneError> {
        self.goto(frame.into())?;
        self.play();
        Ok(())
    }

    /// Jump to `frame` and pause.
    pub fn goto_and_stop(&mut self, frame: impl Into<FrameRef>) -> Result<(), SceneError> {
        self.goto(frame.into())?;
        self.stop();
        Ok(())
    }

    fn goto(&mut self, frame: FrameRef) -> Result<(), SceneError> {
        let index = self
            .frame_index(&frame)
            .ok_or_else(|| SceneError::UnknownFrame(frame.to_string()))?;
        self.current = index;
        self.displayed = 0.0;
        Ok(())
    }

    /// Advance playback by `delta` (milliseconds, or one when counting ticks).
    pub fn next_frame(&mut self, delta: f64) {
        let Some(frame) = self.frames.get(self.current) else {
            return;
        };
        let interval = frame.interval.unwrap_or(self.interval);
        if interval > 0.0 {
            let count = self.displayed + delta;
            self.displayed = if count > interval { 0.0 } else { count };
        }
        if let Some(jump) = &frame.jump {
            if self.displayed == 0.0 || interval <= 0.0 {
                match self.frame_index(jump) {
                    Some(target) => {
                        self.current = target;
                        self.displayed = 0.0;
                        return;
                    }
                    None => warn!(%jump, from = self.current, "unresolved frame jump"),
                }
            }
        }
        if interval > 0.0 && self.displayed > 0.0 {
            return;
        }
        self.current = if self.current + 1 >= self.frames.len() {
            0
        } else {
            self.current + 1
        };
    }

    /// Whether the frame on screen stops playback.
    pub(crate) fn at_stop_frame(&self) -> bool {
        self.frames.get(self.current).is_some_and(|f| f.stop)
    }
}
