#[cfg(feature = "auto_sync")]
use std::collections::HashMap;

use bevy::prelude::*;

use crate::{
    artifact::{ArtifactHandle, ArtifactManager, ArtifactStyle, label_anchor},
    error::{MeasureError, Result},
    session::{MeasurementSession, SessionEvent},
    types::{Point, Segment},
    units::{self, Unit},
};
#[cfg(feature = "auto_sync")]
use crate::{
    artifact::{Artifact, ArtifactKind, Constraint, SceneChange, Shape, line_artifact},
    geometry::look_rotation,
    utils::{point_to_vec3, rotation_to_quat, vector_to_vec3},
};

/// System sets for the measuring pipeline.
///
/// All three run back to back in `Update`, so every session mutation happens
/// in one place, in one order:
///
/// ```text
/// MeasureSet::Sample  →  MeasureSet::Act  →  MeasureSet::Sync
///   SurfaceHit            MeasureAction       scene entities
/// ```
///
/// Write [`SurfaceHit`] from your tracking system before `MeasureSet::Sample`:
///
/// ```rust,ignore
/// app.add_systems(Update, raycast_reticle.before(MeasureSet::Sample));
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeasureSet {
    /// Feeds the current [`SurfaceHit`] to the session.
    Sample,
    /// Applies queued [`MeasureAction`]s and materialises committed artifacts.
    Act,
    /// Mirrors artifacts and the preview line into the scene.
    Sync,
}

/// The surface under the reticle this frame, in world-space metres.
///
/// Owned by the host's tracking integration. `None` means no surface is
/// detected, which hides the preview but keeps the measurement.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceHit(pub Option<Point>);

/// User input for the session. Send it from buttons, keys or remote control.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureAction {
    /// Start measuring or commit the current edge.
    Advance,
    /// Discard everything.
    Reset,
    /// Switch between centimetres and inches.
    ToggleUnit,
    SetUnit(Unit),
}

/// Runtime configuration for the measuring pipeline.
///
/// Inserted as a resource by [`MeasurePlugin`].
#[derive(Resource, Debug, Clone)]
pub struct MeasureConfig {
    /// Colour of the line that follows the reticle.
    pub preview_color: Color,
    /// Colour of committed lines.
    pub committed_color: Color,
    pub style: ArtifactStyle,
    /// Float a distance label over each committed edge.
    pub show_distance_labels: bool,
    /// On-screen size of distance labels.
    pub label_font_px: f32,
    pub default_unit: Unit,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            preview_color: Color::WHITE,
            committed_color: Color::srgb(1.0, 1.0, 0.0),
            style: ArtifactStyle::default(),
            show_distance_labels: true,
            label_font_px: 18.0,
            default_unit: Unit::Centimeter,
        }
    }
}

impl MeasureConfig {
    pub fn validate(&self) -> Result<()> {
        self.style.validate()?;
        if !self.label_font_px.is_finite() || self.label_font_px <= 0.0 {
            return Err(MeasureError::InvalidConfig {
                field: "label_font_px",
                value: self.label_font_px as f64,
            });
        }
        Ok(())
    }
}

/// Bevy plugin that drives the measuring session.
///
/// ```text
/// SurfaceHit updated by host
///   → session.on_sample              (MeasureSet::Sample)
///   → MeasureAction messages applied (MeasureSet::Act)
///       → committed line + label added to ArtifactManager
///       → SessionEvent written
///   → entities spawned/despawned     (MeasureSet::Sync, `auto_sync` feature)
/// ```
///
/// Without the `auto_sync` feature, drain
/// [`ArtifactManager::drain_changes`] yourself and draw the artifacts with
/// whatever renderer you like.
#[derive(Default)]
pub struct MeasurePlugin {
    /// Initial value for the [`MeasureConfig`] resource.
    pub config: MeasureConfig,
}

impl Plugin for MeasurePlugin {
    fn build(&self, app: &mut App) {
        let config = match self.config.validate() {
            Ok(()) => self.config.clone(),
            Err(err) => {
                warn!(%err, "rejected measure config, falling back to defaults");
                MeasureConfig::default()
            }
        };

        app.insert_resource(MeasurementSession::new(config.default_unit))
            .insert_resource(ArtifactManager::new(config.style.clone()))
            .insert_resource(config)
            .init_resource::<SurfaceHit>()
            .init_resource::<DistanceLabels>()
            .add_message::<MeasureAction>()
            .add_message::<SessionEvent>()
            .configure_sets(
                Update,
                (MeasureSet::Sample, MeasureSet::Act, MeasureSet::Sync).chain(),
            )
            .add_systems(
                Update,
                (
                    apply_surface_hit.in_set(MeasureSet::Sample),
                    apply_actions.in_set(MeasureSet::Act),
                ),
            );

        #[cfg(feature = "auto_sync")]
        app.init_resource::<ArtifactEntities>().add_systems(
            Update,
            (sync_artifacts, refresh_preview, place_labels)
                .chain()
                .in_set(MeasureSet::Sync),
        );
    }
}

/// A distance label and what it was built from, so it can be relabelled.
#[derive(Debug, Clone, Copy)]
struct DistanceLabel {
    handle: ArtifactHandle,
    anchor: Point,
    centimeters: f64,
}

#[derive(Resource, Debug, Default)]
struct DistanceLabels(Vec<DistanceLabel>);

fn apply_surface_hit(
    hit: Res<SurfaceHit>,
    mut session: ResMut<MeasurementSession>,
    mut events: MessageWriter<SessionEvent>,
) {
    if let Some(preview) = session.on_sample(hit.0) {
        events.write(SessionEvent::PreviewUpdated(preview));
    }
}

fn apply_actions(
    mut actions: MessageReader<MeasureAction>,
    mut session: ResMut<MeasurementSession>,
    mut artifacts: ResMut<ArtifactManager>,
    mut labels: ResMut<DistanceLabels>,
    config: Res<MeasureConfig>,
    mut events: MessageWriter<SessionEvent>,
) {
    for action in actions.read() {
        match *action {
            MeasureAction::Advance => {
                let Some(commit) = session.begin_or_advance() else {
                    continue;
                };
                artifacts.create_line_artifact(&commit.segment, config.committed_color);
                if config.show_distance_labels {
                    let label = add_distance_label(
                        &mut artifacts,
                        &commit.segment,
                        commit.centimeters,
                        session.unit(),
                    );
                    labels.0.push(label);
                }
                events.write(SessionEvent::SegmentCommitted(commit));
            }
            MeasureAction::Reset => {
                session.reset();
                artifacts.clear_all();
                labels.0.clear();
                events.write(SessionEvent::SessionReset);
            }
            MeasureAction::ToggleUnit => {
                let unit = session.unit().toggled();
                change_unit(&mut session, &mut artifacts, &mut labels, unit);
                events.write(SessionEvent::UnitChanged(unit));
            }
            MeasureAction::SetUnit(unit) => {
                if unit == session.unit() {
                    continue;
                }
                change_unit(&mut session, &mut artifacts, &mut labels, unit);
                events.write(SessionEvent::UnitChanged(unit));
            }
        }
    }
}

fn annotation(centimeters: f64, unit: Unit) -> String {
    units::format_annotation(units::from_centimeters(centimeters, unit), unit.symbol())
}

fn add_distance_label(
    artifacts: &mut ArtifactManager,
    segment: &Segment,
    centimeters: f64,
    unit: Unit,
) -> DistanceLabel {
    let anchor = label_anchor(segment);
    let handle = artifacts.create_label_artifact(annotation(centimeters, unit), anchor);
    DistanceLabel {
        handle,
        anchor,
        centimeters,
    }
}

/// Records the unit and rebuilds floating labels from their stored lengths.
fn change_unit(
    session: &mut MeasurementSession,
    artifacts: &mut ArtifactManager,
    labels: &mut DistanceLabels,
    unit: Unit,
) {
    session.set_unit(unit);
    for label in labels.0.iter_mut() {
        artifacts.remove_artifact(label.handle);
        label.handle =
            artifacts.create_label_artifact(annotation(label.centimeters, unit), label.anchor);
    }
}

/// Marks the root entity of a committed artifact.
#[cfg(feature = "auto_sync")]
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementArtifact(pub ArtifactHandle);

/// Marks the transient preview line, rebuilt every frame.
#[cfg(feature = "auto_sync")]
#[derive(Component)]
pub struct MeasurePreview;

/// World position a screen-space label follows.
#[cfg(feature = "auto_sync")]
#[derive(Component, Debug, Clone, Copy)]
pub struct LabelAnchor(pub Vec3);

/// Scene entity for every artifact handle currently attached.
#[cfg(feature = "auto_sync")]
#[derive(Resource, Debug, Default)]
pub struct ArtifactEntities(pub HashMap<ArtifactHandle, Entity>);

/// Applies queued [`SceneChange`]s: spawns attached artifacts, despawns detached ones.
#[cfg(feature = "auto_sync")]
fn sync_artifacts(
    mut commands: Commands,
    mut artifacts: ResMut<ArtifactManager>,
    mut entities: ResMut<ArtifactEntities>,
    config: Res<MeasureConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let changes: Vec<SceneChange> = artifacts.drain_changes().collect();
    for change in changes {
        match change {
            SceneChange::Attached(handle) => {
                // Attached and removed again within the same frame.
                let Some(artifact) = artifacts.get(handle) else {
                    continue;
                };
                let entity = spawn_artifact(
                    &mut commands,
                    artifact,
                    config.label_font_px,
                    &mut meshes,
                    &mut materials,
                    MeasurementArtifact(handle),
                );
                entities.0.insert(handle, entity);
            }
            SceneChange::Detached(handle) => {
                if let Some(entity) = entities.0.remove(&handle) {
                    commands.entity(entity).despawn();
                }
            }
        }
    }
}

/// Rebuilds the preview line from the session each frame.
///
/// The preview is hidden while no surface is under the reticle.
#[cfg(feature = "auto_sync")]
fn refresh_preview(
    mut commands: Commands,
    session: Res<MeasurementSession>,
    config: Res<MeasureConfig>,
    existing: Query<Entity, With<MeasurePreview>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for entity in &existing {
        commands.entity(entity).despawn();
    }

    if session.last_hit().is_none() {
        return;
    }
    let Some(preview) = session.preview() else {
        return;
    };

    let artifact = line_artifact(&preview, config.preview_color, &config.style);
    spawn_artifact(
        &mut commands,
        &artifact,
        config.label_font_px,
        &mut meshes,
        &mut materials,
        MeasurePreview,
    );
}

/// Moves label nodes to the screen position of their anchor.
///
/// Screen-space text always faces the viewer, which satisfies the
/// vertical-axis billboard constraint.
#[cfg(feature = "auto_sync")]
fn place_labels(
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut labels: Query<(&LabelAnchor, &mut Node, &mut Visibility)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };

    for (anchor, mut node, mut visibility) in &mut labels {
        match camera.world_to_viewport(camera_transform, anchor.0) {
            Ok(position) => {
                node.left = Val::Px(position.x);
                node.top = Val::Px(position.y);
                *visibility = Visibility::Inherited;
            }
            // Behind the camera or outside the viewport.
            Err(_) => *visibility = Visibility::Hidden,
        }
    }
}

#[cfg(feature = "auto_sync")]
fn spawn_artifact(
    commands: &mut Commands,
    artifact: &Artifact,
    label_font_px: f32,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    marker: impl Bundle,
) -> Entity {
    match artifact.kind {
        ArtifactKind::Line => spawn_line(commands, artifact, meshes, materials, marker),
        ArtifactKind::Label => spawn_label(commands, artifact, label_font_px, marker),
    }
}

#[cfg(feature = "auto_sync")]
fn spawn_line(
    commands: &mut Commands,
    artifact: &Artifact,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    marker: impl Bundle,
) -> Entity {
    let rotation = match artifact.constraint {
        Constraint::LookAt(target) => rotation_to_quat(&look_rotation(&artifact.origin, &target)),
        Constraint::Billboard { .. } => Quat::IDENTITY,
    };

    commands
        .spawn((
            Transform::from_translation(point_to_vec3(&artifact.origin)).with_rotation(rotation),
            Visibility::default(),
            marker,
        ))
        .with_children(|parent| {
            for part in &artifact.parts {
                // Bevy's cuboid has no chamfer; at a millimetre it is invisible anyway.
                let mesh = match part.shape {
                    Shape::Box {
                        width,
                        height,
                        length,
                        ..
                    } => meshes.add(Cuboid::new(width as f32, height as f32, length as f32)),
                    Shape::Sphere { radius } => meshes.add(Sphere::new(radius as f32)),
                    Shape::Text { .. } => continue,
                };
                parent.spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: part.color,
                        unlit: true,
                        ..default()
                    })),
                    Transform::from_translation(vector_to_vec3(&part.offset)),
                ));
            }
        })
        .id()
}

#[cfg(feature = "auto_sync")]
fn spawn_label(
    commands: &mut Commands,
    artifact: &Artifact,
    label_font_px: f32,
    marker: impl Bundle,
) -> Entity {
    let color = artifact
        .parts
        .first()
        .map_or(Color::BLACK, |part| part.color);

    commands
        .spawn((
            Text::new(artifact.text().unwrap_or_default()),
            TextFont {
                font_size: label_font_px,
                ..default()
            },
            TextColor(color),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            // Shown by place_labels once the anchor is projected.
            Visibility::Hidden,
            LabelAnchor(point_to_vec3(&artifact.origin)),
            marker,
        ))
        .id()
}
