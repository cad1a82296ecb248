pub mod asset_loader;

pub use asset_loader::{load_introduction, load_json, load_static_assets, StaticAssets};
