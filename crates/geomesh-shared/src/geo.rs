//! Collaborator interfaces for location and geospatial indexing.
//!
//! The mesh never touches raw coordinates or the cell algorithm itself;
//! both arrive through these seams. Production wiring supplies a platform
//! geolocation source and an H3 binding, tests supply fixtures.

use crate::constants::{H3_RESOLUTION, NEIGHBOR_RING};
use crate::error::LocationError;

/// A raw device position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

/// Source of the device's current position.
pub trait LocationProvider {
    fn current_position(&self) -> Result<GeoPosition, LocationError>;
}

/// Hierarchical geospatial indexer (H3 in the reference deployment).
pub trait GeoIndexer {
    /// Cell id containing the given coordinates at `resolution`.
    fn cell_of(&self, lat: f64, lng: f64, resolution: u8) -> String;

    /// Cell ids within `ring_size` rings of `cell`. May include `cell`
    /// itself, as H3's grid-disk enumeration does.
    fn neighbors_of(&self, cell: &str, ring_size: u32) -> Vec<String>;
}

/// Resolve the home cell and its neighbor ring for the current position.
pub fn locate_cells(
    provider: &dyn LocationProvider,
    indexer: &dyn GeoIndexer,
) -> Result<(String, Vec<String>), LocationError> {
    let position = provider.current_position()?;
    let cell = indexer.cell_of(position.lat, position.lng, H3_RESOLUTION);
    let neighbors = indexer.neighbors_of(&cell, NEIGHBOR_RING);
    Ok((cell, neighbors))
}

/// Short display form of a cell id.
pub fn format_cell(cell: &str) -> String {
    if cell.is_empty() {
        return "...".to_string();
    }
    cell.chars().take(8).collect::<String>().to_uppercase()
}
