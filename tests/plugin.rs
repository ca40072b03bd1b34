//! Drives `MeasurePlugin` in a headless app.

use bevy::prelude::*;
use bevy_ar_measure::{
    MeasurePlugin,
    artifact::{ArtifactKind, ArtifactManager},
    plugin::{MeasureAction, SurfaceHit},
    session::{MeasurementSession, MeasurementState},
    types::Point,
    units::Unit,
};

fn app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .init_resource::<Assets<Mesh>>()
        .init_resource::<Assets<StandardMaterial>>()
        .add_plugins(MeasurePlugin::default());
    app
}

fn tick(app: &mut App, hit: Option<Point>, action: Option<MeasureAction>) {
    app.world_mut().resource_mut::<SurfaceHit>().0 = hit;
    if let Some(action) = action {
        app.world_mut().write_message(action);
    }
    app.update();
}

fn label_texts(app: &App) -> Vec<String> {
    app.world()
        .resource::<ArtifactManager>()
        .iter()
        .filter(|(_, artifact)| artifact.kind == ArtifactKind::Label)
        .filter_map(|(_, artifact)| artifact.text().map(str::to_string))
        .collect()
}

#[test]
fn test_full_measurement_through_messages() {
    let mut app = app();

    tick(&mut app, Some(Point::new(0.0, 0.0, 0.0)), Some(MeasureAction::Advance));
    assert_eq!(
        app.world().resource::<MeasurementSession>().state(),
        MeasurementState::MeasuringFirstEdge
    );

    tick(&mut app, Some(Point::new(0.0, 1.0, 0.0)), Some(MeasureAction::Advance));
    {
        let session = app.world().resource::<MeasurementSession>();
        assert_eq!(session.state(), MeasurementState::MeasuringSecondEdge);
        assert_eq!(session.height_cm(), Some(100.0));
    }
    // One line and one label per committed edge.
    assert_eq!(app.world().resource::<ArtifactManager>().len(), 2);
    assert_eq!(label_texts(&app), vec!["100.00 cm".to_string()]);

    tick(&mut app, Some(Point::new(0.5, 1.0, 0.0)), Some(MeasureAction::Advance));
    {
        let session = app.world().resource::<MeasurementSession>();
        assert_eq!(session.state(), MeasurementState::Idle);
        assert_eq!(session.width_cm(), Some(50.0));
        assert!(session.controls().can_apply);
    }
    assert_eq!(app.world().resource::<ArtifactManager>().len(), 4);

    tick(&mut app, None, Some(MeasureAction::ToggleUnit));
    assert_eq!(app.world().resource::<MeasurementSession>().unit(), Unit::Inch);
    assert_eq!(app.world().resource::<ArtifactManager>().len(), 4);
    let texts = label_texts(&app);
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().all(|text| text.ends_with(" in")));

    tick(&mut app, None, Some(MeasureAction::Reset));
    let session = app.world().resource::<MeasurementSession>();
    assert_eq!(session.state(), MeasurementState::Idle);
    assert!(session.committed().is_empty());
    assert!(app.world().resource::<ArtifactManager>().is_empty());
}

#[test]
fn test_advance_without_commit_adds_nothing() {
    let mut app = app();
    tick(&mut app, None, Some(MeasureAction::Advance));
    tick(&mut app, None, Some(MeasureAction::Advance));

    let session = app.world().resource::<MeasurementSession>();
    assert_eq!(session.state(), MeasurementState::MeasuringFirstEdge);
    assert!(app.world().resource::<ArtifactManager>().is_empty());
}

#[cfg(feature = "auto_sync")]
mod scene {
    use super::*;
    use bevy_ar_measure::plugin::{ArtifactEntities, MeasurePreview, MeasurementArtifact};

    fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
        let world = app.world_mut();
        let mut query = world.query_filtered::<Entity, F>();
        query.iter(world).count()
    }

    #[test]
    fn test_entities_follow_artifacts() {
        let mut app = app();

        tick(&mut app, Some(Point::new(0.0, 0.0, 0.0)), Some(MeasureAction::Advance));
        tick(&mut app, Some(Point::new(0.0, 0.2, 0.0)), None);
        assert_eq!(count::<With<MeasurePreview>>(&mut app), 1);
        assert_eq!(count::<With<MeasurementArtifact>>(&mut app), 0);

        tick(&mut app, Some(Point::new(0.0, 0.2, 0.0)), Some(MeasureAction::Advance));
        assert_eq!(count::<With<MeasurementArtifact>>(&mut app), 2);
        assert_eq!(app.world().resource::<ArtifactEntities>().0.len(), 2);

        // No surface: the preview disappears, committed artifacts stay.
        tick(&mut app, None, None);
        assert_eq!(count::<With<MeasurePreview>>(&mut app), 0);
        assert_eq!(count::<With<MeasurementArtifact>>(&mut app), 2);

        tick(&mut app, None, Some(MeasureAction::Reset));
        assert_eq!(count::<With<MeasurementArtifact>>(&mut app), 0);
        assert!(app.world().resource::<ArtifactEntities>().0.is_empty());
    }
}
