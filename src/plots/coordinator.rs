// src/plots/coordinator.rs
//! Plots and the coordinator that owns them.
//!
//! The coordinator is the one place that knows which plot is active, which
//! interaction mode is on and which structure type is selected. It is built
//! in two steps ([`PlotCoordinator::create`] then
//! [`PendingCoordinator::initialize`]) so no plot can take a structure before
//! its decorations exist. State changes are queued as [`PlotEvent`]s and
//! drained by whoever publishes them.

use bevy::prelude::*;
use std::collections::HashMap;

use super::bounds::{Body, BodyClass};
use super::catalog::StructureCatalog;
use super::core::{
    CellCoord, Footprint, Ownership, PlotId, PlotKind, Rotation, StructureId, StructureTypeId, WorldSeed,
};
use super::decoration::{DecorationGenerator, DecorationReport};
use super::error::PlotError;
use super::grid::{Grid, GridError};
use super::occupancy::OccupancyMap;
use super::preview::{GhostFrame, GhostPreview, GhostSignal, PreviewInputs};
use super::validator::{PlacementCheck, PlacementValidator};

// ---------- Plot ----------

/// A committed structure. Never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedStructure {
    pub id: StructureId,
    pub structure: StructureTypeId,
    pub footprint: Footprint,
    pub anchor: CellCoord,
    pub rotation: Rotation,
    pub cells: Vec<CellCoord>,
    pub body: Body,
}

impl PlacedStructure {
    pub fn center(&self) -> Vec3 {
        self.body.bounds.center
    }
}

/// Tint a renderer should give a plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlotHighlight {
    Selected,
    Hovered,
    Normal,
    Abandoned,
    Void,
    Mountain,
}

impl PlotHighlight {
    pub fn base(kind: PlotKind) -> Self {
        match kind {
            PlotKind::Normal => PlotHighlight::Normal,
            PlotKind::Abandoned => PlotHighlight::Abandoned,
            PlotKind::Void => PlotHighlight::Void,
            PlotKind::Mountain => PlotHighlight::Mountain,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Plot {
    id: PlotId,
    ownership: Ownership,
    kind: PlotKind,
    grid: Grid,
    occupancy: OccupancyMap,
    structures: Vec<PlacedStructure>,
    next_structure: u32,
    active: bool,
}

impl Plot {
    /// First construction phase: undecorated grid, empty occupancy.
    pub fn create(
        id: PlotId,
        ownership: Ownership,
        kind: PlotKind,
        origin: Vec3,
        grid_size: u32,
    ) -> Result<Self, GridError> {
        Ok(Self {
            id,
            ownership,
            kind,
            grid: Grid::new(grid_size, origin, kind)?,
            occupancy: OccupancyMap::new(grid_size),
            structures: Vec::new(),
            next_structure: 0,
            active: false,
        })
    }

    pub fn id(&self) -> PlotId { self.id }
    pub fn ownership(&self) -> Ownership { self.ownership }
    pub fn kind(&self) -> PlotKind { self.kind }
    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn occupancy(&self) -> &OccupancyMap { &self.occupancy }
    pub fn structures(&self) -> &[PlacedStructure] { &self.structures }
    pub fn structure_count(&self) -> usize { self.structures.len() }
    pub fn has_structures(&self) -> bool { !self.structures.is_empty() }
    pub fn is_active(&self) -> bool { self.active }

    /// Only the local player's plot is editable.
    pub fn can_edit(&self) -> bool {
        self.ownership == Ownership::Yours
    }

    /// Editable and of a kind that takes structures.
    pub fn accepts_placement(&self) -> bool {
        self.can_edit() && self.kind.accepts_structures()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> + Clone {
        self.structures.iter().map(|s| &s.body)
    }

    /// Pure placement query against this plot's current state.
    pub fn check(&self, footprint: Footprint, rotation: Rotation, anchor: CellCoord) -> PlacementCheck {
        PlacementValidator::new(&self.grid, &self.occupancy, self.bodies()).check(footprint, rotation, anchor)
    }

    /// Re-validate, then mark occupancy and record the structure. State is untouched on `Err`.
    pub fn commit(
        &mut self,
        structure: StructureTypeId,
        footprint: Footprint,
        rotation: Rotation,
        anchor: CellCoord,
    ) -> Result<&PlacedStructure, PlotError> {
        if !self.kind.accepts_structures() {
            return Err(PlotError::ModeNotPermitted);
        }
        let check = self.check(footprint, rotation, anchor);
        check.verdict?;

        self.occupancy.mark_occupied(&check.cells);
        let id = StructureId(self.next_structure);
        self.next_structure += 1;
        self.structures.push(PlacedStructure {
            id,
            structure,
            footprint,
            anchor,
            rotation,
            cells: check.cells,
            body: Body { class: BodyClass::Placed, bounds: check.bounds },
        });
        Ok(&self.structures[self.structures.len() - 1])
    }

    /// Drop every structure. Decorations stay.
    pub fn reset(&mut self) {
        self.occupancy.clear();
        self.structures.clear();
    }
}

// ---------- Modes & events ----------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum InteractionMode {
    #[default]
    Browse,
    Edit,
    Place,
}

/// Queued state change for external collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum PlotEvent {
    ActivePlotChanged { previous: Option<PlotId>, current: PlotId },
    ModeChanged { plot: PlotId, mode: InteractionMode },
    SelectionChanged { selection: Option<StructureTypeId> },
    GhostChanged { plot: PlotId, signal: GhostSignal, cell: Option<CellCoord>, rotation: Rotation },
    StructurePlaced { plot: PlotId, structure: PlacedStructure },
    PlotReset { plot: PlotId },
}

// ---------- Coordinator ----------

/// Output of [`PlotCoordinator::create`]; only [`initialize`](Self::initialize) turns it into a coordinator.
pub struct PendingCoordinator {
    catalog: StructureCatalog,
    plots: Vec<Plot>,
}

impl PendingCoordinator {
    /// Second phase: decorate every grid once, each from its own seeded stream.
    pub fn initialize(mut self, seed: WorldSeed, generator: &DecorationGenerator) -> PlotCoordinator {
        let mut reports = Vec::with_capacity(self.plots.len());
        for plot in &mut self.plots {
            let mut rng = DecorationGenerator::rng_for(seed, plot.id);
            if let Some(report) = plot.grid.decorate(generator, plot.ownership, &mut rng) {
                debug!(
                    "Plots: decorated {} ({:?}) pebble_chunks={}/{} attempts={} fallback={} rocks={}+{}",
                    plot.id,
                    plot.kind,
                    report.pebble_chunks,
                    report.target_chunks,
                    report.attempts,
                    report.used_fallback,
                    report.small_rocks,
                    report.high_rocks,
                );
                reports.push((plot.id, report));
            }
        }
        let index = self.plots.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        PlotCoordinator {
            catalog: self.catalog,
            plots: self.plots,
            index,
            reports,
            active: None,
            hovered: None,
            mode: InteractionMode::Browse,
            selection: None,
            preview: GhostPreview::default(),
            pick: None,
            outbox: Vec::new(),
        }
    }
}

#[derive(Resource)]
pub struct PlotCoordinator {
    catalog: StructureCatalog,
    plots: Vec<Plot>,
    index: HashMap<PlotId, usize>,
    reports: Vec<(PlotId, DecorationReport)>,
    active: Option<PlotId>,
    hovered: Option<PlotId>,
    mode: InteractionMode,
    selection: Option<StructureTypeId>,
    preview: GhostPreview,
    /// Cell of the active grid under the pointer.
    pick: Option<CellCoord>,
    outbox: Vec<PlotEvent>,
}

impl PlotCoordinator {
    pub fn create(catalog: StructureCatalog, plots: Vec<Plot>) -> PendingCoordinator {
        PendingCoordinator { catalog, plots }
    }

    // ---- queries ----

    pub fn catalog(&self) -> &StructureCatalog { &self.catalog }
    pub fn plots(&self) -> &[Plot] { &self.plots }
    pub fn active(&self) -> Option<PlotId> { self.active }
    pub fn hovered(&self) -> Option<PlotId> { self.hovered }
    pub fn mode(&self) -> InteractionMode { self.mode }
    pub fn selection(&self) -> Option<StructureTypeId> { self.selection }
    pub fn preview(&self) -> &GhostPreview { &self.preview }
    pub fn ghost(&self) -> Option<&GhostFrame> { self.preview.frame() }
    pub fn decoration_reports(&self) -> &[(PlotId, DecorationReport)] { &self.reports }

    pub fn plot(&self, id: PlotId) -> Option<&Plot> {
        self.index.get(&id).map(|&i| &self.plots[i])
    }

    fn plot_mut(&mut self, id: PlotId) -> Option<&mut Plot> {
        self.index.get(&id).map(|&i| &mut self.plots[i])
    }

    pub fn active_plot(&self) -> Option<&Plot> {
        self.active.and_then(|id| self.plot(id))
    }

    pub fn your_plot(&self) -> Option<PlotId> {
        self.plots.iter().find(|p| p.ownership == Ownership::Yours).map(|p| p.id)
    }

    /// False for unknown plots.
    pub fn can_edit(&self, id: PlotId) -> bool {
        self.plot(id).is_some_and(Plot::can_edit)
    }

    /// Plot whose grid contains `pos` (grids never overlap).
    pub fn plot_at_world(&self, pos: Vec3) -> Option<PlotId> {
        self.plots.iter().find(|p| p.grid.cell_at_world(pos).is_ok()).map(|p| p.id)
    }

    pub fn highlight(&self, id: PlotId) -> Option<PlotHighlight> {
        let plot = self.plot(id)?;
        Some(if plot.active {
            PlotHighlight::Selected
        } else if self.hovered == Some(id) {
            PlotHighlight::Hovered
        } else {
            PlotHighlight::base(plot.kind)
        })
    }

    /// Pure query against the active plot.
    pub fn check(
        &self,
        structure: StructureTypeId,
        rotation: Rotation,
        anchor: CellCoord,
    ) -> Result<PlacementCheck, PlotError> {
        let plot = self.active_plot().ok_or(PlotError::ModeNotPermitted)?;
        let def = self.catalog.get(structure).ok_or(PlotError::UnknownStructureType(structure))?;
        Ok(plot.check(def.footprint(), rotation, anchor))
    }

    // ---- activation ----

    /// Deactivate the current plot fully, then activate `id`. Always ends in `Browse`.
    pub fn set_active(&mut self, id: PlotId) -> Result<(), PlotError> {
        if !self.index.contains_key(&id) {
            return Err(PlotError::UnknownPlot(id));
        }
        if self.active == Some(id) {
            return Ok(());
        }

        let previous = self.active.take();
        if let Some(prev) = previous {
            if let Some(plot) = self.plot_mut(prev) {
                plot.active = false;
            }
            self.hide_ghost(prev);
            if self.mode != InteractionMode::Browse {
                self.mode = InteractionMode::Browse;
                self.outbox.push(PlotEvent::ModeChanged { plot: prev, mode: InteractionMode::Browse });
            }
        }
        self.pick = None;

        if let Some(plot) = self.plot_mut(id) {
            plot.active = true;
        }
        self.active = Some(id);
        info!("Plots: active plot {} (was {:?})", id, previous.map(|p| p.to_string()));
        self.outbox.push(PlotEvent::ActivePlotChanged { previous, current: id });
        Ok(())
    }

    // ---- modes ----

    fn require_editable(&self, what: &str) -> Result<PlotId, PlotError> {
        match self.active_plot() {
            Some(plot) if plot.accepts_placement() => Ok(plot.id),
            Some(plot) => {
                debug!("Plots: {} refused on {} ({:?}, {:?})", what, plot.id, plot.ownership, plot.kind);
                Err(PlotError::ModeNotPermitted)
            }
            None => {
                debug!("Plots: {} refused, no active plot", what);
                Err(PlotError::ModeNotPermitted)
            }
        }
    }

    fn set_mode(&mut self, plot: PlotId, mode: InteractionMode) {
        if self.mode != mode {
            self.mode = mode;
            self.outbox.push(PlotEvent::ModeChanged { plot, mode });
        }
    }

    pub fn enter_edit_mode(&mut self) -> Result<(), PlotError> {
        let plot = self.require_editable("edit mode")?;
        if self.mode == InteractionMode::Browse {
            self.set_mode(plot, InteractionMode::Edit);
        }
        Ok(())
    }

    /// Leaves edit (and placement) and drops the selection.
    pub fn exit_edit_mode(&mut self) {
        let Some(plot) = self.active else { return };
        self.set_mode(plot, InteractionMode::Browse);
        self.set_selection(None);
        self.refresh_preview();
    }

    pub fn toggle_edit_mode(&mut self) -> Result<(), PlotError> {
        if self.mode == InteractionMode::Browse {
            self.enter_edit_mode()
        } else {
            self.exit_edit_mode();
            Ok(())
        }
    }

    /// Implies edit mode.
    pub fn start_placement_phase(&mut self) -> Result<(), PlotError> {
        let plot = self.require_editable("placement phase")?;
        self.set_mode(plot, InteractionMode::Place);
        self.refresh_preview();
        Ok(())
    }

    /// Back to edit mode; the selection is kept.
    pub fn end_placement_phase(&mut self) {
        let Some(plot) = self.active else { return };
        if self.mode == InteractionMode::Place {
            self.set_mode(plot, InteractionMode::Edit);
        }
        self.refresh_preview();
    }

    // ---- selection ----

    /// Selecting the current type again clears it. Returns the new selection.
    pub fn select_structure(&mut self, structure: StructureTypeId) -> Result<Option<StructureTypeId>, PlotError> {
        if self.catalog.get(structure).is_none() {
            return Err(PlotError::UnknownStructureType(structure));
        }
        let next = if self.selection == Some(structure) { None } else { Some(structure) };
        self.set_selection(next);
        self.refresh_preview();
        Ok(next)
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
        self.refresh_preview();
    }

    fn set_selection(&mut self, selection: Option<StructureTypeId>) {
        if self.selection != selection {
            self.selection = selection;
            self.outbox.push(PlotEvent::SelectionChanged { selection });
        }
    }

    /// Escape: drop selection and ghost. Mode is kept.
    pub fn cancel(&mut self) {
        self.clear_selection();
    }

    // ---- preview ----

    /// Feed the pointer's ground position (or `None` when it hits nothing).
    pub fn pointer_moved(&mut self, ground: Option<Vec3>) {
        self.hovered = ground.and_then(|p| self.plot_at_world(p));
        self.pick = match (ground, self.active_plot()) {
            (Some(p), Some(plot)) => plot.grid.cell_at_world(p).ok(),
            _ => None,
        };
        self.refresh_preview();
    }

    /// Re-run the ghost against current state.
    pub fn tick(&mut self) -> GhostSignal {
        self.refresh_preview()
    }

    /// Flip the ghost 90° and re-validate immediately.
    pub fn rotate(&mut self) -> GhostSignal {
        let before = self.ghost_key();
        let plot = self.active.and_then(|id| self.index.get(&id)).map(|&i| &self.plots[i]);
        let catalog = &self.catalog;
        let signal = self.preview.toggle_rotation(|structure, cell, rotation| {
            let def = catalog.get(structure)?;
            plot.map(|p| p.check(def.footprint(), rotation, cell))
        });
        self.publish_ghost(before);
        signal
    }

    fn refresh_preview(&mut self) -> GhostSignal {
        let before = self.ghost_key();
        let plot = self.active.and_then(|id| self.index.get(&id)).map(|&i| &self.plots[i]);
        let inputs = PreviewInputs {
            placement_active: self.mode == InteractionMode::Place && plot.is_some_and(Plot::accepts_placement),
            selection: self.selection,
            pick: self.pick,
        };
        let catalog = &self.catalog;
        let signal = self.preview.tick(inputs, |structure, cell, rotation| {
            let def = catalog.get(structure)?;
            plot.map(|p| p.check(def.footprint(), rotation, cell))
        });
        if let Some(frame) = self.preview.frame() {
            trace!("Plots: ghost at {} {:?} -> {:?}", frame.cell, frame.rotation, frame.check.verdict);
        }
        self.publish_ghost(before);
        signal
    }

    fn ghost_key(&self) -> (GhostSignal, Option<CellCoord>, Rotation) {
        (self.preview.signal(), self.preview.frame().map(|f| f.cell), self.preview.rotation())
    }

    fn publish_ghost(&mut self, before: (GhostSignal, Option<CellCoord>, Rotation)) {
        let after = self.ghost_key();
        if before == after {
            return;
        }
        if let Some(plot) = self.active {
            let (signal, cell, rotation) = after;
            self.outbox.push(PlotEvent::GhostChanged { plot, signal, cell, rotation });
        }
    }

    fn hide_ghost(&mut self, plot: PlotId) {
        if self.preview.frame().is_some() {
            self.preview.cancel();
            self.outbox.push(PlotEvent::GhostChanged {
                plot,
                signal: GhostSignal::Hidden,
                cell: None,
                rotation: self.preview.rotation(),
            });
        }
    }

    // ---- commit ----

    /// Commit the ghost as shown. Ghost returns to idle on success.
    pub fn confirm(&mut self) -> Result<PlacedStructure, PlotError> {
        if self.mode != InteractionMode::Place {
            return Err(PlotError::ModeNotPermitted);
        }
        let structure = self.selection.ok_or(PlotError::NoSelection)?;
        // Off-grid pointer: nothing to commit.
        let (cell, rotation) = match self.preview.frame() {
            Some(f) => (f.cell, f.rotation),
            None => return Err(PlotError::OutOfBounds),
        };
        match self.commit(structure, rotation, cell) {
            Ok(placed) => {
                if let Some(plot) = self.active {
                    self.hide_ghost(plot);
                }
                Ok(placed)
            }
            Err(e) => {
                self.refresh_preview();
                Err(e)
            }
        }
    }

    /// Re-validate and commit on the active plot.
    pub fn commit(
        &mut self,
        structure: StructureTypeId,
        rotation: Rotation,
        anchor: CellCoord,
    ) -> Result<PlacedStructure, PlotError> {
        let plot_id = self.require_editable("commit")?;
        let footprint = self
            .catalog
            .get(structure)
            .map(|d| d.footprint())
            .ok_or(PlotError::UnknownStructureType(structure))?;
        let plot = self.plot_mut(plot_id).ok_or(PlotError::UnknownPlot(plot_id))?;
        let placed = match plot.commit(structure, footprint, rotation, anchor) {
            Ok(placed) => placed.clone(),
            Err(e) => {
                debug!("Plots: commit of {} at {} on {} rejected: {}", structure, anchor, plot_id, e);
                return Err(e);
            }
        };
        info!(
            "Plots: placed {} at {} {:?} on {} ({} cells)",
            structure,
            anchor,
            rotation,
            plot_id,
            placed.cells.len()
        );
        self.outbox.push(PlotEvent::StructurePlaced { plot: plot_id, structure: placed.clone() });
        Ok(placed)
    }

    /// Clear a plot's structures and occupancy.
    pub fn reset_plot(&mut self, id: PlotId) -> Result<(), PlotError> {
        let plot = self.plot_mut(id).ok_or(PlotError::UnknownPlot(id))?;
        plot.reset();
        info!("Plots: reset {}", id);
        self.outbox.push(PlotEvent::PlotReset { plot: id });
        if self.active == Some(id) {
            self.refresh_preview();
        }
        Ok(())
    }

    // ---- events ----

    pub fn has_pending_events(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<PlotEvent> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::catalog::StructureTypeDef;
    use crate::plots::decoration::DecorationParams;
    use crate::plots::core::DecorationClass;

    const BIG: StructureTypeId = StructureTypeId(0);
    const DOT: StructureTypeId = StructureTypeId(1);
    const BAR: StructureTypeId = StructureTypeId(2);

    const MINE: PlotId = PlotId::new(0, 0);
    const THEIRS: PlotId = PlotId::new(0, 1);
    const HOLE: PlotId = PlotId::new(1, 0);

    fn catalog() -> StructureCatalog {
        StructureCatalog::from_defs(vec![
            StructureTypeDef::new("Big", 2, 2, 1),
            StructureTypeDef::new("Dot", 1, 1, 1),
            StructureTypeDef::new("Bar", 3, 1, 1),
        ])
        .unwrap()
    }

    fn coordinator() -> PlotCoordinator {
        let plots = vec![
            Plot::create(MINE, Ownership::Yours, PlotKind::Normal, Vec3::ZERO, 7).unwrap(),
            Plot::create(THEIRS, Ownership::Opponent, PlotKind::Normal, Vec3::new(7.5, 0.0, 0.0), 7).unwrap(),
            Plot::create(HOLE, Ownership::Yours, PlotKind::Void, Vec3::new(0.0, 0.0, 7.5), 7).unwrap(),
        ];
        PlotCoordinator::create(catalog(), plots)
            .initialize(WorldSeed(99), &DecorationGenerator::new(DecorationParams::default()))
    }

    fn placing(structure: StructureTypeId) -> PlotCoordinator {
        let mut c = coordinator();
        c.set_active(MINE).unwrap();
        c.start_placement_phase().unwrap();
        c.select_structure(structure).unwrap();
        c
    }

    fn world(c: &PlotCoordinator, cell: CellCoord) -> Vec3 {
        c.active_plot().unwrap().grid().cell_center(cell)
    }

    #[test]
    fn initialize_decorates_every_grid_once() {
        let c = coordinator();
        assert!(c.plots().iter().all(|p| p.grid().is_decorated()));
        assert_eq!(c.decoration_reports().len(), 3);
        let mine = c.plot(MINE).unwrap();
        assert!(mine.grid().cells().any(|cell| cell.decoration == DecorationClass::Pebble));
    }

    #[test]
    fn can_edit_only_yours() {
        let c = coordinator();
        assert!(c.can_edit(MINE));
        assert!(!c.can_edit(THEIRS));
        assert!(!c.can_edit(PlotId::new(9, 9)));
    }

    #[test]
    fn set_active_is_exclusive() {
        let mut c = coordinator();
        c.set_active(MINE).unwrap();
        c.set_active(THEIRS).unwrap();
        let active: Vec<_> = c.plots().iter().filter(|p| p.is_active()).map(|p| p.id()).collect();
        assert_eq!(active, vec![THEIRS]);
        assert_eq!(c.highlight(THEIRS), Some(PlotHighlight::Selected));
        assert_eq!(c.highlight(MINE), Some(PlotHighlight::Normal));
        assert_eq!(c.set_active(PlotId::new(5, 5)), Err(PlotError::UnknownPlot(PlotId::new(5, 5))));
    }

    #[test]
    fn switching_plots_clears_the_ghost_and_mode() {
        let mut c = placing(DOT);
        c.pointer_moved(Some(world(&c, CellCoord::new(3, 3))));
        assert!(c.preview().is_previewing());
        c.drain_events();

        c.set_active(THEIRS).unwrap();
        assert_eq!(c.mode(), InteractionMode::Browse);
        assert!(!c.preview().is_previewing());
        let events = c.drain_events();
        assert!(events.contains(&PlotEvent::ActivePlotChanged { previous: Some(MINE), current: THEIRS }));
        assert!(events.iter().any(|e| matches!(e, PlotEvent::GhostChanged { signal: GhostSignal::Hidden, .. })));
        // selection carries over to the next plot
        assert_eq!(c.selection(), Some(DOT));
    }

    #[test]
    fn mode_entry_is_gated() {
        let mut c = coordinator();
        assert_eq!(c.enter_edit_mode(), Err(PlotError::ModeNotPermitted));

        c.set_active(THEIRS).unwrap();
        assert_eq!(c.enter_edit_mode(), Err(PlotError::ModeNotPermitted));
        assert_eq!(c.start_placement_phase(), Err(PlotError::ModeNotPermitted));
        assert_eq!(c.mode(), InteractionMode::Browse);

        c.set_active(HOLE).unwrap();
        assert_eq!(c.start_placement_phase(), Err(PlotError::ModeNotPermitted));

        c.set_active(MINE).unwrap();
        c.enter_edit_mode().unwrap();
        assert_eq!(c.mode(), InteractionMode::Edit);
        c.start_placement_phase().unwrap();
        assert_eq!(c.mode(), InteractionMode::Place);
        c.end_placement_phase();
        assert_eq!(c.mode(), InteractionMode::Edit);
    }

    #[test]
    fn exit_edit_clears_selection() {
        let mut c = placing(BIG);
        c.exit_edit_mode();
        assert_eq!(c.mode(), InteractionMode::Browse);
        assert_eq!(c.selection(), None);
    }

    fn hidden_ghost_reported(events: &[PlotEvent]) -> bool {
        events.iter().any(|e| matches!(e, PlotEvent::GhostChanged { signal: GhostSignal::Hidden, .. }))
    }

    fn previewing_at(structure: StructureTypeId, cell: CellCoord) -> PlotCoordinator {
        let mut c = placing(structure);
        c.pointer_moved(Some(world(&c, cell)));
        assert!(c.preview().is_previewing());
        c.drain_events();
        c
    }

    #[test]
    fn every_exit_returns_the_ghost_to_idle() {
        let exits: [(&str, fn(&mut PlotCoordinator)); 5] = [
            ("selection toggled off", |c| {
                c.select_structure(DOT).unwrap();
            }),
            ("selection cleared", PlotCoordinator::clear_selection),
            ("cancel", PlotCoordinator::cancel),
            ("placement ended", PlotCoordinator::end_placement_phase),
            ("edit exited", PlotCoordinator::exit_edit_mode),
        ];
        for (name, exit) in exits {
            let mut c = previewing_at(DOT, CellCoord::new(3, 3));
            exit(&mut c);
            assert!(!c.preview().is_previewing(), "{name}");
            assert!(c.ghost().is_none(), "{name}");
            assert!(hidden_ghost_reported(&c.drain_events()), "{name}");
        }
    }

    #[test]
    fn ending_placement_keeps_selection_and_resumes() {
        let mut c = previewing_at(BIG, CellCoord::new(2, 2));
        c.end_placement_phase();
        assert_eq!(c.mode(), InteractionMode::Edit);
        assert_eq!(c.selection(), Some(BIG));
        c.pointer_moved(Some(world(&c, CellCoord::new(2, 3))));
        assert!(!c.preview().is_previewing());

        c.start_placement_phase().unwrap();
        assert!(c.preview().is_previewing());
        assert_eq!(c.preview().signal(), GhostSignal::Valid);
    }

    #[test]
    fn pointer_leaving_the_grid_hides_the_ghost() {
        let mut c = previewing_at(DOT, CellCoord::new(0, 0));
        c.pointer_moved(Some(Vec3::new(-40.0, 0.0, 0.0)));
        assert!(!c.preview().is_previewing());
        assert!(hidden_ghost_reported(&c.drain_events()));
        c.pointer_moved(Some(world(&c, CellCoord::new(1, 1))));
        assert!(c.preview().is_previewing());
    }

    #[test]
    fn selecting_twice_toggles_off() {
        let mut c = placing(BIG);
        assert_eq!(c.select_structure(BIG), Ok(None));
        assert_eq!(c.select_structure(DOT), Ok(Some(DOT)));
        assert_eq!(c.select_structure(StructureTypeId(42)), Err(PlotError::UnknownStructureType(StructureTypeId(42))));
        assert_eq!(c.selection(), Some(DOT));
    }

    #[test]
    fn confirm_commits_and_marks_cells() {
        let mut c = placing(BIG);
        c.pointer_moved(Some(world(&c, CellCoord::new(0, 0))));
        let before: Vec<_> = c.active_plot().unwrap().occupancy().occupied_cells();
        assert!(before.is_empty());

        let placed = c.confirm().unwrap();
        assert_eq!(placed.cells.len(), 4);
        let plot = c.active_plot().unwrap();
        for cell in &placed.cells {
            assert!(!plot.occupancy().is_free(*cell));
        }
        assert_eq!(plot.occupancy().occupied_count(), 4);
        assert!(plot.has_structures());
        assert!(!c.preview().is_previewing());
        assert!(c
            .drain_events()
            .iter()
            .any(|e| matches!(e, PlotEvent::StructurePlaced { plot, .. } if *plot == MINE)));
    }

    #[test]
    fn confirm_rechecks_against_fresh_state() {
        let mut c = placing(DOT);
        c.pointer_moved(Some(world(&c, CellCoord::new(1, 1))));
        assert_eq!(c.preview().signal(), GhostSignal::Valid);
        // someone commits underneath the stale ghost
        c.commit(BIG, Rotation::Deg0, CellCoord::new(0, 0)).unwrap();
        assert_eq!(c.confirm(), Err(PlotError::OccupancyConflict { cell: CellCoord::new(1, 1) }));
        assert_eq!(c.preview().signal(), GhostSignal::Invalid);
        assert_eq!(c.active_plot().unwrap().structure_count(), 1);
    }

    #[test]
    fn tick_picks_up_external_commits() {
        let mut c = placing(DOT);
        c.pointer_moved(Some(world(&c, CellCoord::new(4, 4))));
        assert_eq!(c.tick(), GhostSignal::Valid);
        c.commit(DOT, Rotation::Deg0, CellCoord::new(4, 4)).unwrap();
        assert_eq!(c.tick(), GhostSignal::Invalid);
        assert!(c
            .drain_events()
            .iter()
            .any(|e| matches!(e, PlotEvent::GhostChanged { signal: GhostSignal::Invalid, .. })));
    }

    #[test]
    fn confirm_needs_selection_and_placement() {
        let mut c = coordinator();
        c.set_active(MINE).unwrap();
        assert_eq!(c.confirm(), Err(PlotError::ModeNotPermitted));
        c.start_placement_phase().unwrap();
        assert_eq!(c.confirm(), Err(PlotError::NoSelection));
        c.select_structure(DOT).unwrap();
        c.pointer_moved(None);
        assert_eq!(c.confirm(), Err(PlotError::OutOfBounds));
    }

    #[test]
    fn rotate_revalidates_at_same_anchor() {
        let mut c = placing(BAR);
        c.pointer_moved(Some(world(&c, CellCoord::new(5, 2))));
        assert_eq!(c.preview().signal(), GhostSignal::Invalid);
        assert_eq!(c.rotate(), GhostSignal::Valid);
        let placed = c.confirm().unwrap();
        assert_eq!(placed.rotation, Rotation::Deg90);
        assert_eq!(placed.cells, vec![CellCoord::new(5, 2), CellCoord::new(5, 3), CellCoord::new(5, 4)]);
    }

    #[test]
    fn rejected_commit_changes_nothing() {
        let mut c = placing(BIG);
        c.commit(BIG, Rotation::Deg0, CellCoord::new(0, 0)).unwrap();
        let occupied = c.active_plot().unwrap().occupancy().occupied_cells();
        assert_eq!(c.commit(BIG, Rotation::Deg0, CellCoord::new(6, 6)), Err(PlotError::OutOfBounds));
        assert!(matches!(
            c.commit(DOT, Rotation::Deg0, CellCoord::new(1, 0)),
            Err(PlotError::OccupancyConflict { .. })
        ));
        assert_eq!(c.active_plot().unwrap().occupancy().occupied_cells(), occupied);
        assert_eq!(c.active_plot().unwrap().structure_count(), 1);
    }

    #[test]
    fn commit_refused_on_foreign_plot() {
        let mut c = coordinator();
        c.set_active(THEIRS).unwrap();
        assert_eq!(c.commit(DOT, Rotation::Deg0, CellCoord::new(0, 0)), Err(PlotError::ModeNotPermitted));
    }

    #[test]
    fn void_plot_never_takes_structures() {
        let mut plot = Plot::create(HOLE, Ownership::Yours, PlotKind::Void, Vec3::ZERO, 7).unwrap();
        assert_eq!(
            plot.commit(DOT, Footprint::new(1, 1, 1), Rotation::Deg0, CellCoord::new(0, 0)),
            Err(PlotError::ModeNotPermitted)
        );
    }

    #[test]
    fn pointer_hover_and_pick() {
        let mut c = coordinator();
        c.set_active(MINE).unwrap();
        c.pointer_moved(Some(Vec3::new(7.5, 0.0, 0.0)));
        assert_eq!(c.hovered(), Some(THEIRS));
        assert_eq!(c.highlight(THEIRS), Some(PlotHighlight::Hovered));
        assert!(!c.preview().is_previewing());
        c.pointer_moved(Some(Vec3::new(100.0, 0.0, 0.0)));
        assert_eq!(c.hovered(), None);
    }

    #[test]
    fn reset_keeps_decorations() {
        let mut c = placing(BIG);
        c.commit(BIG, Rotation::Deg0, CellCoord::new(2, 2)).unwrap();
        let decorations: Vec<_> = c.plot(MINE).unwrap().grid().cells().map(|c| c.decoration).collect();
        c.reset_plot(MINE).unwrap();
        let plot = c.plot(MINE).unwrap();
        assert_eq!(plot.occupancy().occupied_count(), 0);
        assert!(!plot.has_structures());
        let after: Vec<_> = plot.grid().cells().map(|c| c.decoration).collect();
        assert_eq!(decorations, after);
    }

    #[test]
    fn occupancy_matches_structures() {
        let mut c = placing(DOT);
        let anchors = [(0, 0), (2, 0), (4, 4), (6, 6), (1, 5)];
        for (x, z) in anchors {
            c.commit(BIG, Rotation::Deg0, CellCoord::new(x, z)).ok();
            c.commit(BAR, Rotation::Deg90, CellCoord::new(x, z)).ok();
            c.commit(DOT, Rotation::Deg0, CellCoord::new(x, z)).ok();
        }
        let plot = c.active_plot().unwrap();
        for cell in plot.occupancy().occupied_cells() {
            let owners = plot.structures().iter().filter(|s| s.cells.contains(&cell)).count();
            assert_eq!(owners, 1, "cell {cell}");
        }
        let covered: usize = plot.structures().iter().map(|s| s.cells.len()).sum();
        assert_eq!(covered, plot.occupancy().occupied_count());
    }
}
