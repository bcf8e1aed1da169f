pub mod grid_mapper;
pub mod grid_overlay;
pub mod screenshot;
pub mod snapshot;
pub mod traits;
pub mod types;
pub mod zoom_view;
