// src/plots/plugin.rs
//! Plots plugin wiring (glue).
//! - Settings + WorldSeed
//! - Catalog asset/loader
//! - Coordinator built once the catalog is ready (create, then initialize)
//! - Pointer pick, input, event publication and visual sync

use bevy::asset::LoadState;
use bevy::ecs::schedule::common_conditions::resource_exists;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use std::path::PathBuf;

use super::catalog::{StructureCatalog, StructureCatalogAssetPlugin};
use super::coordinator::{InteractionMode, PlotCoordinator, PlotEvent};
use super::core::{StructureTypeId, WorldSeed};
use super::decoration::DecorationGenerator;
use super::render::{spawn_plot_visuals, sync_ghost, sync_placed_structures, sync_tile_tints, PlotPalette};
use super::world::generate_plots;
use crate::actions::{ActionState, PlayerAction, SELECT_SLOTS};
use crate::settings::PlotsSettings;

/// Handle to the loaded structure catalog.
#[derive(Resource, Default)]
pub struct CatalogHandle(pub Handle<StructureCatalog>);

/// Where the pointer ray meets the ground plane (y = 0), if anywhere.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq)]
pub struct PointerGround(pub Option<Vec3>);

/// Coordinator state change, republished for any interested system.
#[derive(Event, Clone, Debug)]
pub struct PlotEventMsg(pub PlotEvent);

/// Frame order for everything the plugin runs in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotsSet {
    Build,
    Pointer,
    Input,
    Publish,
    Render,
}

#[derive(Default)]
pub struct PlotsPlugin {
    /// Optional RON settings file; defaults are used when absent or unreadable.
    pub settings_path: Option<PathBuf>,
}

impl Plugin for PlotsPlugin {
    fn build(&self, app: &mut App) {
        let settings = PlotsSettings::load_or_default(self.settings_path.as_deref());

        app.add_plugins(StructureCatalogAssetPlugin)
            .insert_resource(settings)
            .init_resource::<CatalogHandle>()
            .init_resource::<PointerGround>()
            .init_resource::<ActionState>()
            .add_event::<PlotEventMsg>()
            .configure_sets(
                Update,
                (PlotsSet::Build, PlotsSet::Pointer, PlotsSet::Input, PlotsSet::Publish, PlotsSet::Render).chain(),
            )
            .add_systems(Startup, (init_world_seed_from_settings, load_catalog, init_palette))
            .add_systems(
                Update,
                build_coordinator
                    .in_set(PlotsSet::Build)
                    .run_if(not(resource_exists::<PlotCoordinator>)),
            )
            .add_systems(
                Update,
                spawn_plot_visuals
                    .in_set(PlotsSet::Build)
                    .after(build_coordinator)
                    .run_if(resource_added::<PlotCoordinator>),
            )
            .add_systems(
                Update,
                (
                    track_pointer.in_set(PlotsSet::Pointer),
                    apply_plot_input.in_set(PlotsSet::Input),
                    publish_plot_events.in_set(PlotsSet::Publish),
                    (sync_placed_structures, sync_tile_tints, sync_ghost).chain().in_set(PlotsSet::Render),
                )
                    .run_if(resource_exists::<PlotCoordinator>),
            );
    }
}

/// Startup: insert WorldSeed based on PlotsSettings.
fn init_world_seed_from_settings(mut commands: Commands, settings: Res<PlotsSettings>) {
    commands.insert_resource(WorldSeed(settings.world_seed));
}

/// Startup: request the catalog, store handle.
fn load_catalog(
    mut handle_res: ResMut<CatalogHandle>,
    settings: Res<PlotsSettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() { return; }
    handle_res.0 = assets.load(settings.catalog_path.as_str());
    info!(
        "Plots: loading catalog from '{}', world_seed={}",
        settings.catalog_path, settings.world_seed
    );
}

fn init_palette(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(PlotPalette::new(&mut meshes, &mut materials));
}

/// Update: once the catalog is loaded, generate plots and build the coordinator.
fn build_coordinator(
    mut commands: Commands,
    handle_res: Res<CatalogHandle>,
    catalogs: Res<Assets<StructureCatalog>>,
    assets: Res<AssetServer>,
    settings: Res<PlotsSettings>,
    seed: Option<Res<WorldSeed>>,
    ground: Res<PointerGround>,
    mut failed: Local<bool>,
) {
    if *failed { return; }
    let Some(seed) = seed else { return; };
    let Some(catalog) = catalogs.get(&handle_res.0) else {
        if let LoadState::Failed(err) = assets.load_state(&handle_res.0) {
            error!("Plots: catalog '{}' failed to load: {}", settings.catalog_path, err);
            *failed = true;
        }
        return;
    };

    let plots = match generate_plots(&settings.layout, *seed) {
        Ok(p) => p,
        Err(e) => {
            error!("Plots: world generation failed: {}", e);
            *failed = true;
            return;
        }
    };
    info!("Plots: catalog ready ({} structure types)", catalog.len());
    for (id, def) in catalog.iter().take(SELECT_SLOTS as usize) {
        info!("Plots: key {} -> {} ({}x{}x{})", id.0 + 1, def.name, def.length, def.width, def.height);
    }

    let generator = DecorationGenerator::new(settings.decoration);
    let mut coordinator = PlotCoordinator::create(catalog.clone(), plots).initialize(*seed, &generator);
    match coordinator.your_plot() {
        Some(yours) => {
            if let Err(e) = coordinator.set_active(yours) {
                warn!("Plots: could not activate {}: {}", yours, e);
            }
        }
        None => warn!("Plots: no plot belongs to the local player"),
    }
    coordinator.pointer_moved(ground.0);
    commands.insert_resource(coordinator);
}

/// Update: cast the cursor onto the ground plane; feed the coordinator only on change.
fn track_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut ground: ResMut<PointerGround>,
    mut coordinator: ResMut<PlotCoordinator>,
) {
    let hit = windows.single().ok().and_then(|window| {
        let cursor = window.cursor_position()?;
        let (camera, cam_tf) = cameras.single().ok()?;
        let ray = camera.viewport_to_world(cam_tf, cursor).ok()?;
        let t = ray.intersect_plane(Vec3::ZERO, InfinitePlane3d::new(Vec3::Y))?;
        Some(ray.get_point(t))
    });

    // Ignore sub-millimetre jitter so the preview stays event driven.
    let same = match (ground.0, hit) {
        (Some(a), Some(b)) => a.distance_squared(b) < 1e-6,
        (None, None) => true,
        _ => false,
    };
    if same { return; }
    ground.0 = hit;
    coordinator.pointer_moved(hit);
}

/// Update: turn this frame's discrete actions into coordinator calls.
fn apply_plot_input(
    actions: Res<ActionState>,
    ground: Res<PointerGround>,
    mut coordinator: ResMut<PlotCoordinator>,
) {
    if !actions.any_just_pressed() { return; }
    let c = &mut *coordinator;

    if actions.just_pressed(PlayerAction::ToggleEdit) {
        if let Err(e) = c.toggle_edit_mode() {
            debug!("Plots: edit toggle ignored: {}", e);
        }
    }
    if actions.just_pressed(PlayerAction::StartPlacement) {
        if let Err(e) = c.start_placement_phase() {
            debug!("Plots: placement phase ignored: {}", e);
        }
    }
    if let Some(slot) = actions.selected_slot() {
        match c.select_structure(StructureTypeId(slot as u32)) {
            Ok(selection) => debug!("Plots: selection now {:?}", selection),
            Err(e) => debug!("Plots: slot {} ignored: {}", slot + 1, e),
        }
    }
    if actions.just_pressed(PlayerAction::Rotate) {
        c.rotate();
    }
    if actions.just_pressed(PlayerAction::Confirm) {
        if c.mode() == InteractionMode::Place {
            match c.confirm() {
                Ok(_) => {}
                Err(e) if e.is_placement_rejection() => debug!("Plots: ghost stays invalid: {}", e),
                Err(e) => debug!("Plots: confirm ignored: {}", e),
            }
        } else if let Some(id) = ground.0.and_then(|p| c.plot_at_world(p)) {
            if c.set_active(id).is_ok() {
                c.pointer_moved(ground.0);
            }
        }
    }
    if actions.just_pressed(PlayerAction::Cancel) {
        // Peel back one layer per press: selection, then placement, then edit.
        if c.selection().is_some() || c.preview().is_previewing() {
            c.cancel();
        } else if c.mode() == InteractionMode::Place {
            c.end_placement_phase();
        } else if c.mode() == InteractionMode::Edit {
            c.exit_edit_mode();
        }
    }
}

/// Update: drain the coordinator outbox into Bevy events.
fn publish_plot_events(mut coordinator: ResMut<PlotCoordinator>, mut out: EventWriter<PlotEventMsg>) {
    if !coordinator.has_pending_events() { return; }
    for ev in coordinator.drain_events() {
        match &ev {
            PlotEvent::ModeChanged { plot, mode } => debug!("Plots: {} mode {:?}", plot, mode),
            PlotEvent::SelectionChanged { selection } => debug!("Plots: selection {:?}", selection),
            _ => {}
        }
        out.write(PlotEventMsg(ev));
    }
}
