#[cfg(feature = "cli")]
pub mod cli;
pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod order;
pub mod persist;
pub mod search;
pub mod session;
pub mod surface;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use builder::build_graph;
pub use config::{Config, load_config};
pub use document::CatalogDocument;
pub use ir::Graph;
pub use layout::{LayoutMode, Position, Positions};
pub use order::OrderMode;
pub use session::Session;
