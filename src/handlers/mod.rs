// Handler modules
pub mod manifest;
pub mod scan;
pub mod serve;
pub mod utils;

// Re-export all handler functions
pub use manifest::handle_manifest;
pub use scan::handle_scan;
pub use serve::handle_serve;
pub use utils::render_discovery;
