// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for fallible scene operations.

use crate::types::NodeId;

/// Errors reported by scene construction and mutation.
///
/// Lookups that merely miss (an unknown label, a point over nothing) return `None`
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A stage was built without a render target.
    #[error("stage requires a render target")]
    MissingRenderTarget,
    /// A surface of zero or negative size was requested.
    #[error("invalid surface size {width}x{height}")]
    InvalidSurfaceSize {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
    /// The id refers to a destroyed node.
    #[error("node {0:?} is no longer alive")]
    StaleNode(NodeId),
    /// Children can only be added to containers and stages.
    #[error("node {0:?} cannot hold children")]
    NotAContainer(NodeId),
    /// Adding the child would make a node its own ancestor.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    WouldCycle {
        /// Proposed parent.
        parent: NodeId,
        /// Proposed child.
        child: NodeId,
    },
    /// Stage roots cannot be placed inside another node.
    #[error("stage root {0:?} cannot be added to a container")]
    StageNotAttachable(NodeId),
    /// A frame index or label did not resolve.
    #[error("unknown frame {0}")]
    UnknownFrame(String),
    /// An animated sequence needs at least one frame.
    #[error("animated sequence has no frames")]
    EmptySequence,
    /// Font data could not be parsed.
    #[error("invalid font data: {0}")]
    Font(String),
    /// SVG path data failed to parse.
    #[error("invalid SVG path data")]
    SvgPath(#[from] kurbo::SvgParseError),
}
