//! Desktop stand-in for an AR measuring session.
//!
//! The reticle in the middle of the window casts a ray into a small room made
//! of a floor and a back wall; that hit plays the part of the AR surface hit.
//!
//! - Space: start measuring / commit the current edge
//! - Backspace: discard the measurement
//! - U: toggle centimetres and inches
//! - Right drag / middle drag / wheel: orbit, pan, zoom
use bevy::{prelude::*, window::PrimaryWindow};
use bevy_ar_measure::{
    MeasurePlugin,
    plugin::{MeasureAction, MeasureSet, SurfaceHit},
    session::{Hint, MeasurementSession},
    utils::vec3_to_point,
};
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

const WALL_Z: f32 = -2.0;
const WALL_HALF_WIDTH: f32 = 2.0;
const WALL_HEIGHT: f32 = 2.5;

#[derive(Component)]
struct Hud;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.82, 0.85, 0.88)))
        .add_plugins((
            DefaultPlugins,
            MeasurePlugin::default(),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                cast_reticle.before(MeasureSet::Sample),
                keyboard_actions.before(MeasureSet::Act),
                update_hud.after(MeasureSet::Act),
            ),
        )
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 50.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(0.0, 1.6, 2.0).looking_at(Vec3::new(0.0, 0.8, WALL_Z), Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::OVERCAST_DAY,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(WALL_HALF_WIDTH * 2.0, WALL_HEIGHT, 0.05))),
        MeshMaterial3d(materials.add(Color::srgb(0.6, 0.62, 0.65))),
        Transform::from_xyz(0.0, WALL_HEIGHT / 2.0, WALL_Z - 0.025),
    ));

    // Reticle
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Percent(50.0),
            top: Val::Percent(50.0),
            width: Val::Px(6.0),
            height: Val::Px(6.0),
            margin: UiRect::all(Val::Px(-3.0)),
            ..default()
        },
        BackgroundColor(Color::srgb(1.0, 0.2, 0.2)),
    ));

    commands.spawn((
        Text::new(""),
        TextColor(Color::BLACK),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(12.0),
            ..default()
        },
        Hud,
    ));
}

/// Casts the reticle ray against the floor and the back wall.
fn cast_reticle(
    window: Query<&Window, With<PrimaryWindow>>,
    camera: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut hit: ResMut<SurfaceHit>,
) {
    let (Ok(window), Ok((camera, camera_transform))) = (window.single(), camera.single()) else {
        hit.0 = None;
        return;
    };
    let center = Vec2::new(window.width(), window.height()) / 2.0;
    let Ok(ray) = camera.viewport_to_world(camera_transform, center) else {
        hit.0 = None;
        return;
    };

    let floor = ray
        .intersect_plane(Vec3::ZERO, InfinitePlane3d::new(Vec3::Y))
        .map(|t| (t, ray.get_point(t)));
    let wall = ray
        .intersect_plane(Vec3::new(0.0, 0.0, WALL_Z), InfinitePlane3d::new(Vec3::Z))
        .map(|t| (t, ray.get_point(t)))
        .filter(|(_, p)| p.x.abs() <= WALL_HALF_WIDTH && (0.0..=WALL_HEIGHT).contains(&p.y));

    let nearest = [floor, wall]
        .into_iter()
        .flatten()
        .min_by(|a, b| a.0.total_cmp(&b.0));
    hit.0 = nearest.map(|(_, point)| vec3_to_point(point));
}

fn keyboard_actions(keys: Res<ButtonInput<KeyCode>>, mut actions: MessageWriter<MeasureAction>) {
    if keys.just_pressed(KeyCode::Space) {
        actions.write(MeasureAction::Advance);
    }
    if keys.just_pressed(KeyCode::Backspace) {
        actions.write(MeasureAction::Reset);
    }
    if keys.just_pressed(KeyCode::KeyU) {
        actions.write(MeasureAction::ToggleUnit);
    }
}

fn update_hud(session: Res<MeasurementSession>, mut hud: Query<&mut Text, With<Hud>>) {
    let Ok(mut text) = hud.single_mut() else {
        return;
    };

    let controls = session.controls();
    let (width, height) = session.readouts("Width", "Height");
    let hint = match controls.hint() {
        Hint::FindSurface => "Move the device to find a surface",
        Hint::AimAtCorner => "Aim at a corner",
    };
    let flag = |enabled: bool| if enabled { "on" } else { "off" };

    text.0 = format!(
        "{hint}\n{height}\n{width}\nunit: {}\n[space] {}  [backspace] {}  apply: {}",
        session.unit(),
        flag(controls.can_commit),
        flag(controls.can_undo),
        flag(controls.can_apply),
    );
}
