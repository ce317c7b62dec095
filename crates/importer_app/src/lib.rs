//! Legacy site importer: reads the export, segments every HTML body into
//! content blocks and writes the result as JSON plus an nginx redirect map.
mod config;
mod importer;
mod model;
mod output;

pub use config::{CutConfig, FetchConfig, ImporterConfig, LogTarget, DEFAULT_CONFIG_FILENAME};
pub use importer::{ImportOptions, ImportOutput, Importer};
pub use model::{Post, PublishRecord, Section, SeoProperties};
pub use output::{
    write_outputs, POSTS_FILENAME, REDIRECTS_FILENAME, SECTIONS_FILENAME, TAGS_FILENAME,
};
