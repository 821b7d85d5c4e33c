// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the display tree: node identifiers, flags, kinds, and geometry.

use kurbo::{Affine, Point, Rect};
use tableau_geom::Matrix;

use crate::clip::AnimatedSequence;
use crate::graphics::Graphics;
use crate::text::Text;

/// Identifier for a node in a [`Scene`](crate::Scene).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On destroy, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Use [`Scene::is_alive`](crate::Scene::is_alive) to check whether a `NodeId` still
/// refers to a live node. Stale ids never alias a different live node because the
/// generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and interaction.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is drawn.
        const VISIBLE       = 0b0000_0001;
        /// Node takes part in picking and receives pointer events.
        const EVENT_ENABLED = 0b0000_0010;
        /// Show the hand cursor while the pointer is over this node.
        const HAND_CURSOR   = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::EVENT_ENABLED
    }
}

/// Per-node geometry, appearance and interaction state.
///
/// Rotation is in degrees. The registration point (`reg_x`, `reg_y`) is the local
/// pivot for rotation and scaling and is placed at (`x`, `y`) in the parent.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayProps {
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Horizontal position in the parent.
    pub x: f64,
    /// Vertical position in the parent.
    pub y: f64,
    /// Horizontal registration point.
    pub reg_x: f64,
    /// Vertical registration point.
    pub reg_y: f64,
    /// Untransformed width.
    pub width: f64,
    /// Untransformed height.
    pub height: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    /// Visibility and interaction flags.
    pub flags: NodeFlags,
    /// Optional hit polygon in local coordinates, replacing the local rectangle.
    pub poly_area: Option<Vec<Point>>,
    /// Node whose drawn pixels clip this node's output.
    pub mask: Option<NodeId>,
}

impl Default for DisplayProps {
    fn default() -> Self {
        Self {
            name: None,
            x: 0.0,
            y: 0.0,
            reg_x: 0.0,
            reg_y: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            alpha: 1.0,
            flags: NodeFlags::default(),
            poly_area: None,
            mask: None,
        }
    }
}

impl DisplayProps {
    /// Props for a node at `(x, y)` with the given size.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    /// Visible flag.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Event-enabled flag.
    pub fn is_event_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::EVENT_ENABLED)
    }

    /// Whether the node draws at all (visible with positive alpha).
    pub fn is_shown(&self) -> bool {
        self.is_visible() && self.alpha > 0.0
    }

    /// Local rectangle `(0, 0, width, height)`.
    pub fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Transform from this node's space to its parent's: shift by the negative
    /// registration point, scale, rotate, then translate to (`x`, `y`).
    pub fn local_transform(&self) -> Matrix {
        let (mut sin, mut cos) = (0.0, 1.0);
        if self.rotation % 360.0 != 0.0 {
            (sin, cos) = self.rotation.to_radians().sin_cos();
        }
        let mut m = Matrix::identity();
        m.translate(-self.reg_x, -self.reg_y);
        m.concat(&Matrix::new(
            cos * self.scale_x,
            sin * self.scale_x,
            -sin * self.scale_y,
            cos * self.scale_y,
            self.x,
            self.y,
        ));
        m
    }

    /// [`DisplayProps::local_transform`] as a Kurbo affine.
    pub fn local_affine(&self) -> Affine {
        self.local_transform().into()
    }
}

/// Properties compared by state diffing.
///
/// See [`Scene::prop_changed`](crate::Scene::prop_changed).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TrackedProp {
    /// `x`.
    X,
    /// `y`.
    Y,
    /// `reg_x`.
    RegX,
    /// `reg_y`.
    RegY,
    /// `width`.
    Width,
    /// `height`.
    Height,
    /// `alpha`.
    Alpha,
    /// `scale_x`.
    ScaleX,
    /// `scale_y`.
    ScaleY,
    /// `rotation`.
    Rotation,
    /// Visible flag.
    Visible,
    /// Depth among siblings.
    Depth,
    /// Source rectangle left edge (bitmap-like nodes).
    SourceX,
    /// Source rectangle top edge.
    SourceY,
    /// Source rectangle width.
    SourceWidth,
    /// Source rectangle height.
    SourceHeight,
}

impl TrackedProp {
    /// The properties tracked for every node.
    pub const DEFAULT: &'static [Self] = &[
        Self::X,
        Self::Y,
        Self::RegX,
        Self::RegY,
        Self::Width,
        Self::Height,
        Self::Alpha,
        Self::ScaleX,
        Self::ScaleY,
        Self::Rotation,
        Self::Visible,
        Self::Depth,
    ];

    /// Extra properties tracked for bitmap-like nodes.
    pub const SOURCE: &'static [Self] = &[
        Self::SourceX,
        Self::SourceY,
        Self::SourceWidth,
        Self::SourceHeight,
    ];

    /// Properties saved for hidden nodes.
    pub const HIDDEN: &'static [Self] = &[Self::Visible, Self::Alpha];
}

/// What a node is.
///
/// Containers and stages hold children; the other kinds are leaves with their own
/// content.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A plain leaf drawing its drawable over its local rectangle.
    Shape,
    /// A leaf drawing the `source` region of its drawable.
    Bitmap {
        /// Region of the drawable to show.
        source: Rect,
    },
    /// An ordered group of children.
    Container,
    /// The root of a stage.
    Stage,
    /// Recorded vector drawing commands.
    Graphics(Graphics),
    /// Laid-out text.
    Text(Text),
    /// A bitmap cycling through frames of its drawable.
    Clip(AnimatedSequence),
}

impl NodeKind {
    /// Whether the kind holds children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container | Self::Stage)
    }

    /// Source region for bitmap-like kinds.
    pub fn source_rect(&self) -> Option<Rect> {
        match self {
            Self::Bitmap { source } => Some(*source),
            Self::Clip(seq) => seq.current_rect(),
            _ => None,
        }
    }

    /// Prefix for generated node ids.
    pub(crate) fn uid_prefix(&self) -> &'static str {
        match self {
            Self::Shape => "Shape",
            Self::Bitmap { .. } => "Bitmap",
            Self::Container => "Container",
            Self::Stage => "Stage",
            Self::Graphics(_) => "Graphics",
            Self::Text(_) => "Text",
            Self::Clip(_) => "Clip",
        }
    }
}
