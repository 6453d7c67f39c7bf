pub mod loader;
pub mod schema;

pub use loader::{load_catalog, load_game_data, DataLoadError, GameData};
