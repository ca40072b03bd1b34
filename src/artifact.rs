//! Renderable artifacts built from committed measurements.
//!
//! An [`Artifact`] is plain data: an origin, an orientation [`Constraint`] and
//! a list of [`Primitive`]s positioned in the artifact's local frame. The
//! [`ArtifactManager`] owns committed artifacts behind opaque
//! [`ArtifactHandle`]s and queues a [`SceneChange`] for every create and
//! remove, which the renderer drains once per frame:
//!
//! ```text
//! create_line_artifact ──▶ Attached(h) ─┐
//! create_label_artifact ─▶ Attached(h) ─┼─▶ drain_changes() ──▶ renderer
//! remove_artifact/clear ─▶ Detached(h) ─┘
//! ```
//!
//! Preview lines are not owned by the manager. Build them with
//! [`line_artifact`] each tick and throw them away.

use std::collections::BTreeMap;

use bevy::{color::Color, prelude::Resource};
use derive_more::Display;
use tracing::debug;

use crate::{
    error::{MeasureError, Result},
    types::{Point, Segment, Value, Vector},
};

/// Opaque identifier for an artifact owned by an [`ArtifactManager`].
///
/// Handles are never reused, even after [`ArtifactManager::clear_all`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("artifact#{_0}")]
pub struct ArtifactHandle(u64);

/// Geometry of a single primitive, in metres.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box in the artifact frame. `length` runs along Z.
    Box {
        width: Value,
        height: Value,
        length: Value,
        chamfer: Value,
    },
    Sphere {
        radius: Value,
    },
    /// Extruded, horizontally centred text.
    Text {
        content: String,
        font_size: Value,
        extrusion: Value,
        scale: Value,
    },
}

/// A shape placed in its artifact's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub offset: Vector,
    pub color: Color,
}

/// Rotational axis left free by a billboard constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// How the renderer orients an artifact every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Local `-Z` points at the target. See [`crate::geometry::look_rotation`].
    LookAt(Point),
    /// Face the viewer, rotating only around `axis`.
    Billboard { axis: Axis },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Line,
    Label,
}

/// Engine-neutral description of something to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub origin: Point,
    pub constraint: Constraint,
    pub parts: Vec<Primitive>,
}

impl Artifact {
    /// Number of endpoint marker spheres.
    pub fn marker_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part.shape, Shape::Sphere { .. }))
            .count()
    }

    /// Text of a label artifact.
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.shape {
            Shape::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }
}

/// Dimensions and colours of generated artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactStyle {
    /// Cross-section of the line box.
    pub line_thickness: Value,
    pub line_chamfer: Value,
    pub marker_radius: Value,
    /// Lift of labels above their anchor so they don't z-fight the line.
    pub label_offset: Value,
    pub text_extrusion: Value,
    pub text_scale: Value,
    pub font_size: Value,
    pub label_color: Color,
}

impl Default for ArtifactStyle {
    fn default() -> Self {
        Self {
            line_thickness: 0.001,
            line_chamfer: 0.0005,
            marker_radius: 0.003,
            label_offset: 0.02,
            text_extrusion: 0.01,
            text_scale: 0.2,
            font_size: 0.1,
            label_color: Color::BLACK,
        }
    }
}

impl ArtifactStyle {
    /// Checks every dimension is finite and positive.
    ///
    /// `line_chamfer` may be zero.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("line_thickness", self.line_thickness),
            ("marker_radius", self.marker_radius),
            ("label_offset", self.label_offset),
            ("text_extrusion", self.text_extrusion),
            ("text_scale", self.text_scale),
            ("font_size", self.font_size),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MeasureError::InvalidConfig { field, value });
            }
        }
        if !self.line_chamfer.is_finite() || self.line_chamfer < 0.0 {
            return Err(MeasureError::InvalidConfig {
                field: "line_chamfer",
                value: self.line_chamfer,
            });
        }
        Ok(())
    }
}

/// Builds a line from `segment.start` to `segment.end`.
///
/// The artifact sits at the start point and looks at the end point, so the
/// box and markers are laid out along local `-Z`:
///
/// ```text
///  start                              end
///    ●━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━(●)   (●) only when undirected
///    0            -length/2          -length
/// ```
pub fn line_artifact(segment: &Segment, color: Color, style: &ArtifactStyle) -> Artifact {
    let length = segment.length();

    let mut parts = vec![
        Primitive {
            shape: Shape::Box {
                width: style.line_thickness,
                height: style.line_thickness,
                length,
                chamfer: style.line_chamfer,
            },
            offset: Vector::new(0.0, 0.0, -length / 2.0),
            color,
        },
        Primitive {
            shape: Shape::Sphere {
                radius: style.marker_radius,
            },
            offset: Vector::zeros(),
            color,
        },
    ];

    if !segment.directed {
        parts.push(Primitive {
            shape: Shape::Sphere {
                radius: style.marker_radius,
            },
            offset: Vector::new(0.0, 0.0, -length),
            color,
        });
    }

    Artifact {
        kind: ArtifactKind::Line,
        origin: segment.start,
        constraint: Constraint::LookAt(segment.end),
        parts,
    }
}

/// Builds a vertical-axis billboard label raised above `position`.
pub fn label_artifact(text: impl Into<String>, position: Point, style: &ArtifactStyle) -> Artifact {
    Artifact {
        kind: ArtifactKind::Label,
        origin: position + Vector::y() * style.label_offset,
        constraint: Constraint::Billboard { axis: Axis::Y },
        parts: vec![Primitive {
            shape: Shape::Text {
                content: text.into(),
                font_size: style.font_size,
                extrusion: style.text_extrusion,
                scale: style.text_scale,
            },
            offset: Vector::zeros(),
            color: style.label_color,
        }],
    }
}

/// Where a segment's distance label is anchored, before the lift.
pub fn label_anchor(segment: &Segment) -> Point {
    segment.midpoint()
}

/// A pending mutation of the rendered scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Attached(ArtifactHandle),
    Detached(ArtifactHandle),
}

/// Sole owner of committed measurement artifacts.
#[derive(Resource, Debug, Default)]
pub struct ArtifactManager {
    style: ArtifactStyle,
    next_id: u64,
    artifacts: BTreeMap<ArtifactHandle, Artifact>,
    changes: Vec<SceneChange>,
}

impl ArtifactManager {
    pub fn new(style: ArtifactStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    pub fn style(&self) -> &ArtifactStyle {
        &self.style
    }

    fn insert(&mut self, artifact: Artifact) -> ArtifactHandle {
        let handle = ArtifactHandle(self.next_id);
        self.next_id += 1;
        debug!(%handle, kind = ?artifact.kind, "artifact created");
        self.artifacts.insert(handle, artifact);
        self.changes.push(SceneChange::Attached(handle));
        handle
    }

    /// Adds a permanent line for a committed segment.
    pub fn create_line_artifact(&mut self, segment: &Segment, color: Color) -> ArtifactHandle {
        let artifact = line_artifact(segment, color, &self.style);
        self.insert(artifact)
    }

    /// Adds a permanent label at `position` (usually [`label_anchor`]).
    pub fn create_label_artifact(&mut self, text: impl Into<String>, position: Point) -> ArtifactHandle {
        let artifact = label_artifact(text, position, &self.style);
        self.insert(artifact)
    }

    /// Removes an artifact. Returns `false` if it was already gone.
    pub fn remove_artifact(&mut self, handle: ArtifactHandle) -> bool {
        if self.artifacts.remove(&handle).is_none() {
            return false;
        }
        debug!(%handle, "artifact removed");
        self.changes.push(SceneChange::Detached(handle));
        true
    }

    /// Removes every owned artifact and returns how many there were.
    pub fn clear_all(&mut self) -> usize {
        let removed = std::mem::take(&mut self.artifacts);
        self.changes
            .extend(removed.keys().map(|&handle| SceneChange::Detached(handle)));
        debug!(count = removed.len(), "artifacts cleared");
        removed.len()
    }

    pub fn get(&self, handle: ArtifactHandle) -> Option<&Artifact> {
        self.artifacts.get(&handle)
    }

    pub fn contains(&self, handle: ArtifactHandle) -> bool {
        self.artifacts.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Owned artifacts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArtifactHandle, &Artifact)> {
        self.artifacts.iter().map(|(&handle, artifact)| (handle, artifact))
    }

    /// Takes the scene changes queued since the last call, oldest first.
    pub fn drain_changes(&mut self) -> std::vec::Drain<'_, SceneChange> {
        self.changes.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn segment(directed: bool) -> Segment {
        Segment::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.3, 0.4), directed)
    }

    #[test]
    fn test_line_markers_follow_direction() {
        let style = ArtifactStyle::default();
        let directed = line_artifact(&segment(true), Color::WHITE, &style);
        let undirected = line_artifact(&segment(false), Color::WHITE, &style);

        assert_eq!(directed.marker_count(), 1);
        assert_eq!(undirected.marker_count(), 2);

        let end_marker = &undirected.parts[2];
        assert_relative_eq!(end_marker.offset, Vector::new(0.0, 0.0, -0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_line_spans_segment() {
        let artifact = line_artifact(&segment(true), Color::WHITE, &ArtifactStyle::default());
        assert_eq!(artifact.origin, Point::new(0.0, 0.0, 0.0));
        assert_eq!(artifact.constraint, Constraint::LookAt(Point::new(0.0, 0.3, 0.4)));

        let Shape::Box { length, width, .. } = artifact.parts[0].shape else {
            panic!("expected the line box first");
        };
        assert_relative_eq!(length, 0.5, epsilon = 1e-12);
        assert_relative_eq!(width, 0.001);
        assert_relative_eq!(artifact.parts[0].offset.z, -0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_line() {
        let p = Point::new(1.0, 1.0, 1.0);
        let artifact = line_artifact(&Segment::new(p, p, false), Color::WHITE, &ArtifactStyle::default());
        assert_eq!(artifact.marker_count(), 2);
        for part in &artifact.parts {
            assert!(part.offset.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_label_is_lifted_billboard() {
        let seg = segment(false);
        let label = label_artifact("50.00 cm", label_anchor(&seg), &ArtifactStyle::default());
        assert_eq!(label.text(), Some("50.00 cm"));
        assert_eq!(label.constraint, Constraint::Billboard { axis: Axis::Y });
        assert_relative_eq!(label.origin, Point::new(0.0, 0.17, 0.2), epsilon = 1e-12);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut manager = ArtifactManager::default();
        let handle = manager.create_line_artifact(&segment(true), Color::WHITE);
        assert!(manager.remove_artifact(handle));
        assert!(!manager.remove_artifact(handle));
        assert!(!manager.remove_artifact(handle));
        assert!(manager.is_empty());

        let changes: Vec<_> = manager.drain_changes().collect();
        assert_eq!(
            changes,
            vec![SceneChange::Attached(handle), SceneChange::Detached(handle)]
        );
    }

    #[test]
    fn test_clear_all_then_create_gives_fresh_handle() {
        let mut manager = ArtifactManager::default();
        let line = manager.create_line_artifact(&segment(true), Color::WHITE);
        let label = manager.create_label_artifact("1.00 cm", Point::origin());
        manager.drain_changes();

        assert_eq!(manager.clear_all(), 2);
        let detached: Vec<_> = manager.drain_changes().collect();
        assert_eq!(
            detached,
            vec![SceneChange::Detached(line), SceneChange::Detached(label)]
        );

        let fresh = manager.create_line_artifact(&segment(false), Color::WHITE);
        assert_ne!(fresh, line);
        assert_ne!(fresh, label);
        assert!(manager.contains(fresh));
        assert!(!manager.remove_artifact(line));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_style_validation() {
        assert!(ArtifactStyle::default().validate().is_ok());

        let style = ArtifactStyle {
            marker_radius: -0.1,
            ..Default::default()
        };
        assert_eq!(
            style.validate(),
            Err(MeasureError::InvalidConfig {
                field: "marker_radius",
                value: -0.1
            })
        );

        let style = ArtifactStyle {
            label_offset: f64::NAN,
            ..Default::default()
        };
        assert!(style.validate().is_err());
    }
}
