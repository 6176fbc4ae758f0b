pub mod catalog;
pub mod catalog_patch;
pub mod dex;
pub mod location;
pub mod sprites;
pub mod state;
pub mod store;
pub mod tracker;
