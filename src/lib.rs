pub mod batch;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod import;
pub mod model;
pub mod placeholder;
pub mod registry;
pub mod render;
pub mod text;

pub use batch::{BatchReport, BatchSettings, TemplateSource, badge_filename, generate_archive};
pub use catalog::AttendanceCatalog;
#[cfg(feature = "cli")]
pub use cli::run;
pub use compose::{BadgeTemplate, compose_builtin, compose_custom};
pub use config::{Config, load_config};
pub use model::{AttendeeRecord, BadgeFields, Field, PlaceholderMap};
pub use registry::{TemplateId, TemplateRegistry, resolve_type};
pub use render::{BadgeOutput, Rasterizer, render_single};
