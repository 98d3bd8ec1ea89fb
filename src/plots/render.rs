// src/plots/render.rs
//! Demo visuals: floor tiles, decorations, placed structures and the ghost.
//! Placement logic never reads anything from here.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use super::bounds::BodyClass;
use super::coordinator::{PlacedStructure, PlotCoordinator, PlotEvent, PlotHighlight};
use super::core::{CellCoord, DecorationClass, PlotId, PlotKind, StructureId, StructureTypeId};
use super::plugin::PlotEventMsg;
use super::preview::GhostSignal;

const TILE_SIZE: f32 = 0.94;
const TILE_THICKNESS: f32 = 0.05;

/// Collision class mirrored onto entities for debugging and queries.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classified(pub BodyClass);

#[derive(Component, Clone, Copy, Debug)]
pub struct PlotTile {
    pub plot: PlotId,
    pub cell: CellCoord,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct PlotDecoration {
    pub plot: PlotId,
    pub class: DecorationClass,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct PlacedVisual {
    pub plot: PlotId,
    pub id: StructureId,
}

#[derive(Component)]
pub struct GhostVisual;

/// Shared meshes and materials.
#[derive(Resource)]
pub struct PlotPalette {
    pub tile: Handle<Mesh>,
    pub cube: Handle<Mesh>,
    pub pebble: Handle<Mesh>,
    pub highlights: HashMap<PlotHighlight, Handle<StandardMaterial>>,
    pub occupied: Handle<StandardMaterial>,
    pub ghost_valid: Handle<StandardMaterial>,
    pub ghost_invalid: Handle<StandardMaterial>,
    /// Tile tints under the ghost footprint.
    pub ghost_cell_valid: Handle<StandardMaterial>,
    pub ghost_cell_invalid: Handle<StandardMaterial>,
    pub pebble_mat: Handle<StandardMaterial>,
    pub rock_mat: Handle<StandardMaterial>,
    pub structure_default: Handle<StandardMaterial>,
    /// Per structure type, built lazily from catalog tints.
    pub structure_mats: HashMap<StructureTypeId, Handle<StandardMaterial>>,
}

fn flat(materials: &mut Assets<StandardMaterial>, color: Color) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial { base_color: color, perceptual_roughness: 0.9, ..default() })
}

fn translucent(materials: &mut Assets<StandardMaterial>, color: Color) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial { base_color: color, alpha_mode: AlphaMode::Blend, unlit: true, ..default() })
}

impl PlotPalette {
    pub fn new(meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) -> Self {
        let highlights = [
            (PlotHighlight::Selected, Color::srgb(0.45, 0.70, 0.40)),
            (PlotHighlight::Hovered, Color::srgb(0.60, 0.62, 0.48)),
            (PlotHighlight::Normal, Color::srgb(0.42, 0.50, 0.36)),
            (PlotHighlight::Abandoned, Color::srgb(0.48, 0.42, 0.33)),
            (PlotHighlight::Void, Color::srgb(0.22, 0.20, 0.24)),
            (PlotHighlight::Mountain, Color::srgb(0.55, 0.55, 0.58)),
        ]
        .into_iter()
        .map(|(h, c)| (h, flat(materials, c)))
        .collect();

        Self {
            tile: meshes.add(Cuboid::new(TILE_SIZE, TILE_THICKNESS, TILE_SIZE)),
            cube: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
            pebble: meshes.add(Sphere::new(0.12)),
            highlights,
            occupied: flat(materials, Color::srgb(0.30, 0.33, 0.28)),
            ghost_valid: translucent(materials, Color::srgba(0.2, 0.9, 0.3, 0.45)),
            ghost_invalid: translucent(materials, Color::srgba(0.95, 0.2, 0.15, 0.45)),
            ghost_cell_valid: flat(materials, Color::srgb(0.35, 0.85, 0.40)),
            ghost_cell_invalid: flat(materials, Color::srgb(0.90, 0.30, 0.25)),
            pebble_mat: flat(materials, Color::srgb(0.70, 0.68, 0.62)),
            rock_mat: flat(materials, Color::srgb(0.40, 0.39, 0.37)),
            structure_default: flat(materials, Color::srgb(0.75, 0.60, 0.40)),
            structure_mats: HashMap::new(),
        }
    }

    fn highlight(&self, h: PlotHighlight) -> Handle<StandardMaterial> {
        self.highlights.get(&h).cloned().unwrap_or_else(|| self.structure_default.clone())
    }
}

// ---------- Spawn (once, after the coordinator exists) ----------

pub fn spawn_plot_visuals(
    mut commands: Commands,
    coordinator: Res<PlotCoordinator>,
    palette: Res<PlotPalette>,
) {
    let mut tiles = 0usize;
    let mut decorations = 0usize;
    for plot in coordinator.plots() {
        let grid = plot.grid();
        let tint = palette.highlight(coordinator.highlight(plot.id()).unwrap_or(PlotHighlight::base(plot.kind())));

        for cell in grid.tileable_cells() {
            let center = grid.cell_center(cell.coord);
            commands.spawn((
                Mesh3d(palette.tile.clone()),
                MeshMaterial3d(tint.clone()),
                Transform::from_translation(center - Vec3::Y * (TILE_THICKNESS * 0.5)),
                PlotTile { plot: plot.id(), cell: cell.coord },
                Name::new(format!("Tile {} {}", plot.id(), cell.coord)),
            ));
            tiles += 1;

            if let Some(bundle) = decoration_visual(&palette, cell.decoration, center, cell.coord) {
                commands.spawn((
                    bundle,
                    PlotDecoration { plot: plot.id(), class: cell.decoration },
                    Classified(BodyClass::Decoration),
                ));
                decorations += 1;
            }
        }

        if plot.kind() == PlotKind::Mountain {
            let h = grid.size() as f32 * 0.6;
            commands.spawn((
                Mesh3d(palette.cube.clone()),
                MeshMaterial3d(palette.highlight(PlotHighlight::Mountain)),
                Transform::from_translation(grid.origin() + Vec3::Y * (h * 0.5))
                    .with_scale(Vec3::new(grid.size() as f32 * 0.8, h, grid.size() as f32 * 0.8)),
                Name::new(format!("Mountain {}", plot.id())),
            ));
        }
    }

    commands.spawn((
        Mesh3d(palette.cube.clone()),
        MeshMaterial3d(palette.ghost_valid.clone()),
        Transform::default(),
        Visibility::Hidden,
        GhostVisual,
        Classified(BodyClass::Ghost),
        Name::new("Placement ghost"),
    ));

    info!("Plots: spawned {} tiles, {} decorations", tiles, decorations);
}

fn decoration_visual(
    palette: &PlotPalette,
    class: DecorationClass,
    center: Vec3,
    cell: CellCoord,
) -> Option<(Mesh3d, MeshMaterial3d<StandardMaterial>, Transform)> {
    // Small per-cell jitter so rows of rocks do not look stamped.
    let j = ((cell.x * 31 + cell.z * 17) % 7) as f32 / 7.0 - 0.5;
    let (mesh, mat, tf) = match class {
        DecorationClass::None => return None,
        DecorationClass::Pebble => (
            palette.pebble.clone(),
            palette.pebble_mat.clone(),
            Transform::from_translation(center + Vec3::new(j * 0.3, 0.06, -j * 0.2)),
        ),
        DecorationClass::SmallRock => (
            palette.cube.clone(),
            palette.rock_mat.clone(),
            Transform::from_translation(center + Vec3::new(j * 0.2, 0.1, j * 0.2))
                .with_rotation(Quat::from_rotation_y(j))
                .with_scale(Vec3::new(0.3, 0.2, 0.25)),
        ),
        DecorationClass::HighRock => (
            palette.cube.clone(),
            palette.rock_mat.clone(),
            Transform::from_translation(center + Vec3::new(0.0, 0.3, 0.0))
                .with_rotation(Quat::from_rotation_y(j * 2.0))
                .with_scale(Vec3::new(0.35, 0.6, 0.3)),
        ),
    };
    Some((Mesh3d(mesh), MeshMaterial3d(mat), tf))
}

// ---------- Sync ----------

/// Spawn visuals for new structures; despawn a plot's visuals on reset.
/// Types with a `scene` load it, the rest get a tinted box.
pub fn sync_placed_structures(
    mut commands: Commands,
    mut events: EventReader<PlotEventMsg>,
    coordinator: Res<PlotCoordinator>,
    assets: Res<AssetServer>,
    mut palette: ResMut<PlotPalette>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    placed: Query<(Entity, &PlacedVisual)>,
) {
    for PlotEventMsg(ev) in events.read() {
        match ev {
            PlotEvent::StructurePlaced { plot, structure } => {
                let tags = (
                    PlacedVisual { plot: *plot, id: structure.id },
                    Classified(structure.body.class),
                    Name::new(format!("Structure {} {:?} on {}", structure.structure, structure.id, plot)),
                );
                let scene = coordinator.catalog().get(structure.structure).and_then(|d| d.scene.as_deref());
                match scene {
                    Some(path) => {
                        let scene: Handle<Scene> = assets.load(path.to_string());
                        commands.spawn((SceneRoot(scene), scene_transform(structure), tags));
                    }
                    None => {
                        let mat = structure_material(&mut palette, &mut materials, &coordinator, structure.structure);
                        commands.spawn((
                            Mesh3d(palette.cube.clone()),
                            MeshMaterial3d(mat),
                            structure_transform(structure),
                            tags,
                        ));
                    }
                }
            }
            PlotEvent::PlotReset { plot } => {
                for (e, v) in &placed {
                    if v.plot == *plot {
                        commands.entity(e).despawn();
                    }
                }
            }
            _ => {}
        }
    }
}

fn structure_transform(s: &PlacedStructure) -> Transform {
    Transform::from_translation(s.center()).with_scale(s.body.bounds.half_extents * 2.0 * 0.96)
}

/// Scenes are authored unrotated with their origin on the floor.
pub fn scene_transform(s: &PlacedStructure) -> Transform {
    let floor = s.center() - Vec3::Y * s.body.bounds.half_extents.y;
    let yaw = if s.rotation.is_rotated() { std::f32::consts::FRAC_PI_2 } else { 0.0 };
    Transform::from_translation(floor).with_rotation(Quat::from_rotation_y(yaw))
}

fn structure_material(
    palette: &mut PlotPalette,
    materials: &mut Assets<StandardMaterial>,
    coordinator: &PlotCoordinator,
    id: StructureTypeId,
) -> Handle<StandardMaterial> {
    if let Some(h) = palette.structure_mats.get(&id) {
        return h.clone();
    }
    let handle = match coordinator.catalog().get(id).and_then(|d| d.color) {
        Some([r, g, b]) => flat(materials, Color::linear_rgb(r, g, b)),
        None => palette.structure_default.clone(),
    };
    palette.structure_mats.insert(id, handle.clone());
    handle
}

/// Which tint a tile should carry, strongest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileTint {
    GhostValid,
    GhostInvalid,
    Occupied,
    Plot(PlotHighlight),
}

/// In-range cells under the ghost on the active plot.
#[derive(Clone, Debug)]
pub struct GhostCells {
    pub plot: PlotId,
    pub cells: HashSet<CellCoord>,
    pub tint: TileTint,
}

impl GhostCells {
    pub fn of(coordinator: &PlotCoordinator) -> Option<Self> {
        let frame = coordinator.ghost()?;
        let plot = coordinator.active_plot()?;
        let tint = match frame.signal() {
            GhostSignal::Valid => TileTint::GhostValid,
            GhostSignal::Invalid => TileTint::GhostInvalid,
            GhostSignal::Hidden => return None,
        };
        let cells = frame.check.cells.iter().copied().filter(|&c| plot.grid().in_range(c)).collect();
        Some(Self { plot: plot.id(), cells, tint })
    }
}

pub fn tile_tint(coordinator: &PlotCoordinator, ghost: Option<&GhostCells>, tile: &PlotTile) -> Option<TileTint> {
    let plot = coordinator.plot(tile.plot)?;
    if let Some(g) = ghost.filter(|g| g.plot == tile.plot && g.cells.contains(&tile.cell)) {
        return Some(g.tint);
    }
    if plot.is_active() && !plot.occupancy().is_free(tile.cell) {
        return Some(TileTint::Occupied);
    }
    Some(TileTint::Plot(coordinator.highlight(tile.plot).unwrap_or(PlotHighlight::base(plot.kind()))))
}

/// Tile tint follows the ghost footprint, then occupancy, then plot highlight.
pub fn sync_tile_tints(
    coordinator: Res<PlotCoordinator>,
    palette: Res<PlotPalette>,
    mut tiles: Query<(&PlotTile, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    if !coordinator.is_changed() { return; }
    let ghost = GhostCells::of(&coordinator);
    for (tile, mut mat) in &mut tiles {
        let Some(tint) = tile_tint(&coordinator, ghost.as_ref(), tile) else { continue; };
        let want = match tint {
            TileTint::GhostValid => palette.ghost_cell_valid.clone(),
            TileTint::GhostInvalid => palette.ghost_cell_invalid.clone(),
            TileTint::Occupied => palette.occupied.clone(),
            TileTint::Plot(h) => palette.highlight(h),
        };
        if mat.0 != want {
            mat.0 = want;
        }
    }
}

/// Ghost transform and valid/invalid material.
pub fn sync_ghost(
    coordinator: Res<PlotCoordinator>,
    palette: Res<PlotPalette>,
    mut ghost: Query<
        (&mut Transform, &mut Visibility, &mut MeshMaterial3d<StandardMaterial>),
        With<GhostVisual>,
    >,
) {
    if !coordinator.is_changed() { return; }
    let Ok((mut tf, mut vis, mut mat)) = ghost.single_mut() else { return; };

    let Some(frame) = coordinator.ghost() else {
        *vis = Visibility::Hidden;
        return;
    };
    if frame.moved || *vis == Visibility::Hidden {
        let bounds = frame.check.bounds;
        *tf = Transform::from_translation(bounds.center).with_scale(bounds.half_extents * 2.0);
    }
    *vis = Visibility::Visible;
    let want = match frame.signal() {
        GhostSignal::Valid => palette.ghost_valid.clone(),
        GhostSignal::Invalid | GhostSignal::Hidden => palette.ghost_invalid.clone(),
    };
    if mat.0 != want {
        mat.0 = want;
    }
}
