use bevy::prelude::{Message, Resource};
use tracing::{debug, info, trace};

use crate::{
    geometry::distance,
    types::{Edge, Point, Segment},
    units::{self, Unit},
};

/// Where the session is in the two-edge measuring flow.
///
/// ```text
///            advance              advance                 advance
///   Idle ───────────▶ FirstEdge ───────────▶ SecondEdge ───────────▶ Idle
///     ▲                                                                 │
///     └──────────────────────── reset (from any state) ─────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MeasurementState {
    #[default]
    Idle,
    MeasuringFirstEdge,
    MeasuringSecondEdge,
}

impl MeasurementState {
    pub fn is_measuring(self) -> bool {
        !matches!(self, MeasurementState::Idle)
    }
}

/// A segment committed by [`MeasurementSession::begin_or_advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit {
    pub segment: Segment,
    pub edge: Edge,
    /// Length of `segment` in centimetres.
    pub centimeters: f64,
}

/// Notifications the session produces for renderers and UI.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The in-progress segment moved. Redraw the transient preview.
    PreviewUpdated(Segment),
    /// An edge was committed. Materialise a permanent line and label.
    SegmentCommitted(Commit),
    /// Everything was cleared. Destroy all owned artifacts.
    SessionReset,
    /// The display unit changed. Relabel readouts.
    UnitChanged(Unit),
}

/// Overlay hint derived from the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// No surface under the reticle: ask the user to scan a plane.
    FindSurface,
    /// A surface is tracked: ask the user to aim at a corner.
    AimAtCorner,
}

/// Read-only projection of the session onto the UI controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    /// The last sample hit a surface.
    pub surface_found: bool,
    /// The commit ("plus") control should be enabled.
    pub can_commit: bool,
    /// The discard ("bin") control should be enabled.
    pub can_undo: bool,
    /// A full width and height pair is available to hand off.
    pub can_apply: bool,
}

impl Controls {
    pub fn hint(&self) -> Hint {
        if self.surface_found {
            Hint::AimAtCorner
        } else {
            Hint::FindSurface
        }
    }
}

/// State machine turning per-frame surface hits into committed edges.
///
/// Call [`on_sample`](Self::on_sample) once per tick with the latest hit and
/// [`begin_or_advance`](Self::begin_or_advance) whenever the user commits.
/// The first committed edge is the height, the second the width; both are
/// stored in centimetres and converted to [`Unit`] only for display.
///
/// The anchor is seeded as soon as measuring starts, from the hit recorded by
/// the most recent sample. If no surface was under the reticle at that moment
/// the next hit seeds it instead.
///
/// ```
/// use bevy_ar_measure::{session::MeasurementSession, types::Point};
///
/// let mut session = MeasurementSession::default();
/// session.on_sample(Some(Point::new(0.0, 0.0, 0.0)));
/// session.begin_or_advance();
/// session.on_sample(Some(Point::new(0.0, 0.5, 0.0)));
/// let commit = session.begin_or_advance().unwrap();
/// assert!((commit.centimeters - 50.0).abs() < 1e-9);
/// assert_eq!(session.height_cm(), Some(commit.centimeters));
/// ```
#[derive(Resource, Debug, Clone, Default)]
pub struct MeasurementSession {
    state: MeasurementState,
    anchor: Option<Point>,
    live: Option<Point>,
    last_hit: Option<Point>,
    committed: Vec<Segment>,
    width_cm: Option<f64>,
    height_cm: Option<f64>,
    unit: Unit,
}

impl MeasurementSession {
    /// Creates an idle session that displays lengths in `unit`.
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            ..Default::default()
        }
    }

    /// Feeds one tick's surface hit.
    ///
    /// Returns the preview segment to draw this tick, or `None` when there is
    /// nothing to preview (no hit, or not measuring).
    pub fn on_sample(&mut self, hit: Option<Point>) -> Option<Segment> {
        self.last_hit = hit;

        let point = hit?;
        if !self.state.is_measuring() {
            return None;
        }

        trace!(x = point.x, y = point.y, z = point.z, "measure sample");
        let anchor = *self.anchor.get_or_insert(point);
        self.live = Some(point);
        Some(Segment::new(anchor, point, true))
    }

    /// The user's commit action.
    ///
    /// From `Idle` this starts a new measurement. While measuring it commits
    /// the segment from the anchor to the live point, unless nothing has been
    /// sampled yet, in which case it does nothing.
    pub fn begin_or_advance(&mut self) -> Option<Commit> {
        match self.state {
            MeasurementState::Idle => {
                self.anchor = self.last_hit;
                self.live = self.last_hit;
                self.state = MeasurementState::MeasuringFirstEdge;
                debug!(seeded = self.anchor.is_some(), "measuring first edge");
                None
            }
            MeasurementState::MeasuringFirstEdge => {
                let commit = self.commit(Edge::Height, true)?;
                self.height_cm = Some(commit.centimeters);
                // The second edge starts where the first one ended.
                self.anchor = Some(commit.segment.end);
                self.state = MeasurementState::MeasuringSecondEdge;
                debug!("measuring second edge");
                Some(commit)
            }
            MeasurementState::MeasuringSecondEdge => {
                let commit = self.commit(Edge::Width, false)?;
                self.width_cm = Some(commit.centimeters);
                self.anchor = None;
                self.live = None;
                self.state = MeasurementState::Idle;
                Some(commit)
            }
        }
    }

    fn commit(&mut self, edge: Edge, directed: bool) -> Option<Commit> {
        let (Some(start), Some(end)) = (self.anchor, self.live) else {
            debug!(?edge, "commit ignored, nothing sampled yet");
            return None;
        };

        let segment = Segment::new(start, end, directed);
        let centimeters = units::to_centimeters(distance(&start, &end));
        self.committed.push(segment);
        info!(?edge, centimeters, "committed edge");

        Some(Commit {
            segment,
            edge,
            centimeters,
        })
    }

    /// Drops the measurement in progress and everything committed.
    ///
    /// The display unit and the last surface hit survive.
    pub fn reset(&mut self) {
        self.state = MeasurementState::Idle;
        self.anchor = None;
        self.live = None;
        self.committed.clear();
        self.width_cm = None;
        self.height_cm = None;
        info!("measurement reset");
    }

    /// Switches the display unit. Stored lengths are untouched.
    pub fn set_unit(&mut self, unit: Unit) {
        if self.unit != unit {
            debug!(%unit, "display unit changed");
        }
        self.unit = unit;
    }

    pub fn state(&self) -> MeasurementState {
        self.state
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn live(&self) -> Option<Point> {
        self.live
    }

    pub fn last_hit(&self) -> Option<Point> {
        self.last_hit
    }

    pub fn committed(&self) -> &[Segment] {
        &self.committed
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn width_cm(&self) -> Option<f64> {
        self.width_cm
    }

    pub fn height_cm(&self) -> Option<f64> {
        self.height_cm
    }

    /// Width in the display unit.
    pub fn width(&self) -> Option<f64> {
        self.width_cm.map(|cm| units::from_centimeters(cm, self.unit))
    }

    /// Height in the display unit.
    pub fn height(&self) -> Option<f64> {
        self.height_cm.map(|cm| units::from_centimeters(cm, self.unit))
    }

    /// The current in-progress segment, if both ends are known.
    pub fn preview(&self) -> Option<Segment> {
        if !self.state.is_measuring() {
            return None;
        }
        Some(Segment::new(self.anchor?, self.live?, true))
    }

    /// Both edges of a measurement have been committed and not reset since.
    pub fn is_complete(&self) -> bool {
        self.width_cm.is_some() && self.height_cm.is_some()
    }

    pub fn controls(&self) -> Controls {
        let surface_found = self.last_hit.is_some();
        let holding_result = self.state == MeasurementState::Idle && self.is_complete();
        Controls {
            surface_found,
            can_commit: surface_found && !holding_result,
            can_undo: self.state.is_measuring() || !self.committed.is_empty(),
            can_apply: holding_result,
        }
    }

    /// Width and height label texts in the display unit.
    pub fn readouts(&self, width_caption: &str, height_caption: &str) -> (String, String) {
        (
            units::format_readout(width_caption, self.width()),
            units::format_readout(height_caption, self.height()),
        )
    }
}
