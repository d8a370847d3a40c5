//! Drag-to-select region picking as an explicit state machine.

use std::sync::mpsc::Receiver;

use crate::{
    detect::region::{Region, RegionSet},
    foundation::core::Point,
};

/// Smallest accepted drag, in pixels per side; shorter drags are treated as clicks.
const MIN_REGION_SIDE: f64 = 1.0;

/// Pointer input in avatar pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press(Point),
    Move(Point),
    Release(Point),
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    /// No input yet.
    Idle,
    /// Waiting for region `n` (0-based) to be dragged out.
    AwaitingRegion(usize),
    Complete,
    Cancelled,
}

impl SelectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }
}

/// The user abandoned selection (or the event source went away).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("region selection cancelled")]
pub struct SelectionCancelled;

#[derive(Clone, Debug)]
pub struct RegionSelector {
    state: SelectionState,
    wanted: usize,
    drag: Option<(Point, Point)>,
    regions: Vec<Region>,
}

impl RegionSelector {
    pub fn new(wanted: usize) -> Self {
        Self {
            state: if wanted == 0 {
                SelectionState::Complete
            } else {
                SelectionState::Idle
            },
            wanted,
            drag: None,
            regions: Vec::with_capacity(wanted),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Box currently being dragged, if any.
    pub fn drag_preview(&self) -> Option<Region> {
        self.drag.map(|(a, b)| Region::from_corners(a, b))
    }

    /// Advance on one event; terminal states ignore further input.
    pub fn handle(&mut self, event: PointerEvent) -> SelectionState {
        if self.state.is_terminal() {
            return self.state;
        }
        match event {
            PointerEvent::Cancel => {
                self.drag = None;
                self.state = SelectionState::Cancelled;
            }
            PointerEvent::Press(p) => {
                self.drag = Some((p, p));
                self.state = SelectionState::AwaitingRegion(self.regions.len());
            }
            PointerEvent::Move(p) => {
                if let Some((_, current)) = &mut self.drag {
                    *current = p;
                }
            }
            PointerEvent::Release(p) => {
                if let Some((anchor, _)) = self.drag.take() {
                    let region = Region::from_corners(anchor, p);
                    if region.w >= MIN_REGION_SIDE && region.h >= MIN_REGION_SIDE {
                        self.regions.push(region);
                    }
                    self.state = if self.regions.len() >= self.wanted {
                        SelectionState::Complete
                    } else {
                        SelectionState::AwaitingRegion(self.regions.len())
                    };
                }
            }
        }
        self.state
    }

    pub fn into_regions(self) -> Result<Vec<Region>, SelectionCancelled> {
        match self.state {
            SelectionState::Complete => Ok(self.regions),
            _ => Err(SelectionCancelled),
        }
    }
}

/// Block until `wanted` regions are dragged out or selection is cancelled.
///
/// A disconnected channel counts as cancellation.
pub fn select_regions_blocking(
    events: &Receiver<PointerEvent>,
    wanted: usize,
) -> Result<Vec<Region>, SelectionCancelled> {
    let mut selector = RegionSelector::new(wanted);
    while !selector.state().is_terminal() {
        let Ok(event) = events.recv() else {
            tracing::debug!("selection event source closed");
            return Err(SelectionCancelled);
        };
        selector.handle(event);
    }
    selector.into_regions()
}

/// Select left eye, right eye, then mouth.
pub fn select_region_set_blocking(
    events: &Receiver<PointerEvent>,
) -> Result<RegionSet, SelectionCancelled> {
    let regions = select_regions_blocking(events, 3)?;
    match regions.as_slice() {
        [left_eye, right_eye, mouth] => Ok(RegionSet::manual(*left_eye, *right_eye, *mouth)),
        _ => Err(SelectionCancelled),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/selection.rs"]
mod tests;
