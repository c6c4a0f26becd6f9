//! Map rendering and tile management.
//!
//! This module provides map tile fetching, caching, Web Mercator projection
//! utilities, and the interactive map widget with its overlay compositing.

pub mod sources;
pub mod tiles;
pub mod view;

pub use sources::{MapStyle, OverlaySource, TileSource};
pub use tiles::{TileManager, WebMercator};
pub use view::{MapResponse, MapView};
