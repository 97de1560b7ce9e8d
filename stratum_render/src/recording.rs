// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A drawing context that records its calls.

use kurbo::{Rect, RoundedRect};

use stratum_core::transform::Transform3d;
use stratum_core::visual::{Brush, ClipShape, SurfaceId};

use crate::context::DrawingContext;

/// One recorded [`DrawingContext`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`DrawingContext::set_transform`].
    SetTransform(Transform3d),
    /// [`DrawingContext::push_opacity`].
    PushOpacity(f64),
    /// [`DrawingContext::pop_opacity`].
    PopOpacity,
    /// [`DrawingContext::push_clip`].
    PushClip(Rect),
    /// [`DrawingContext::pop_clip`].
    PopClip,
    /// [`DrawingContext::push_geometry_clip`].
    PushGeometryClip(ClipShape),
    /// [`DrawingContext::pop_geometry_clip`].
    PopGeometryClip,
    /// [`DrawingContext::push_opacity_mask`].
    PushOpacityMask {
        /// Mask paint.
        mask: Brush,
        /// Mask area.
        bounds: Rect,
    },
    /// [`DrawingContext::pop_opacity_mask`].
    PopOpacityMask,
    /// [`DrawingContext::draw_rectangle`].
    Rectangle {
        /// Paint.
        brush: Brush,
        /// Filled area.
        rect: Rect,
    },
    /// [`DrawingContext::draw_rounded_rectangle`].
    RoundedRectangle {
        /// Paint.
        brush: Brush,
        /// Filled area.
        rect: RoundedRect,
    },
    /// [`DrawingContext::draw_surface`].
    Surface {
        /// The surface.
        surface: SurfaceId,
        /// Destination.
        rect: Rect,
    },
}

impl DrawCommand {
    /// Does this command paint pixels?
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::Rectangle { .. } | Self::RoundedRectangle { .. } | Self::Surface { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Group {
    Opacity,
    Clip,
    GeometryClip,
    OpacityMask,
}

/// A [`DrawingContext`] that records every call as a [`DrawCommand`].
///
/// Push and pop calls are checked for balance: popping a group that is not
/// the innermost open one panics.
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    open: Vec<Group>,
}

impl RecordingContext {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded commands in call order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Takes the recorded commands, leaving the recording empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        core::mem::take(&mut self.commands)
    }

    /// Only the commands that paint pixels.
    pub fn draws(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| c.is_draw())
    }

    /// Number of groups pushed and not yet popped.
    #[must_use]
    pub fn open_groups(&self) -> usize {
        self.open.len()
    }

    fn push(&mut self, group: Group, command: DrawCommand) {
        self.open.push(group);
        self.commands.push(command);
    }

    fn pop(&mut self, group: Group, command: DrawCommand) {
        let top = self.open.pop();
        assert_eq!(top, Some(group), "unbalanced pop of {group:?}");
        self.commands.push(command);
    }
}

impl DrawingContext for RecordingContext {
    fn set_transform(&mut self, transform: &Transform3d) {
        self.commands.push(DrawCommand::SetTransform(*transform));
    }

    fn push_opacity(&mut self, opacity: f64) {
        self.push(Group::Opacity, DrawCommand::PushOpacity(opacity));
    }

    fn pop_opacity(&mut self) {
        self.pop(Group::Opacity, DrawCommand::PopOpacity);
    }

    fn push_clip(&mut self, rect: Rect) {
        self.push(Group::Clip, DrawCommand::PushClip(rect));
    }

    fn pop_clip(&mut self) {
        self.pop(Group::Clip, DrawCommand::PopClip);
    }

    fn push_geometry_clip(&mut self, shape: &ClipShape) {
        self.push(Group::GeometryClip, DrawCommand::PushGeometryClip(*shape));
    }

    fn pop_geometry_clip(&mut self) {
        self.pop(Group::GeometryClip, DrawCommand::PopGeometryClip);
    }

    fn push_opacity_mask(&mut self, mask: &Brush, bounds: Rect) {
        self.push(
            Group::OpacityMask,
            DrawCommand::PushOpacityMask {
                mask: mask.clone(),
                bounds,
            },
        );
    }

    fn pop_opacity_mask(&mut self) {
        self.pop(Group::OpacityMask, DrawCommand::PopOpacityMask);
    }

    fn draw_rectangle(&mut self, brush: &Brush, rect: Rect) {
        self.commands.push(DrawCommand::Rectangle {
            brush: brush.clone(),
            rect,
        });
    }

    fn draw_rounded_rectangle(&mut self, brush: &Brush, rect: RoundedRect) {
        self.commands.push(DrawCommand::RoundedRectangle {
            brush: brush.clone(),
            rect,
        });
    }

    fn draw_surface(&mut self, surface: SurfaceId, rect: Rect) {
        self.commands.push(DrawCommand::Surface { surface, rect });
    }
}
