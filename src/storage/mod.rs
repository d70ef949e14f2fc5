//! Local configuration: paths, settings, and provider overrides.

pub mod paths;
pub mod providers;
pub mod settings;

pub use paths::AppPaths;
pub use providers::{effective_providers, load_overrides, merge};
pub use settings::Settings;
