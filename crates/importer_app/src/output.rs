use std::path::{Path, PathBuf};

use anyhow::Context;
use block_engine::{ensure_output_dir, AtomicFileWriter};
use import_logging::import_info;

use crate::ImportOutput;

pub const SECTIONS_FILENAME: &str = "sections.json";
pub const POSTS_FILENAME: &str = "posts.json";
pub const TAGS_FILENAME: &str = "tags.json";
pub const REDIRECTS_FILENAME: &str = "redirects.map";

/// Writes every output file into `dir`. All files are serialized before the
/// first one is written, so a serialization failure leaves `dir` untouched.
pub fn write_outputs(dir: &Path, output: &ImportOutput) -> anyhow::Result<Vec<PathBuf>> {
    let files = [
        (
            SECTIONS_FILENAME,
            serde_json::to_vec_pretty(&output.sections).context("failed to serialize sections")?,
        ),
        (
            POSTS_FILENAME,
            serde_json::to_vec_pretty(&output.posts).context("failed to serialize posts")?,
        ),
        (
            TAGS_FILENAME,
            serde_json::to_vec_pretty(&output.tags).context("failed to serialize tags")?,
        ),
        (REDIRECTS_FILENAME, output.redirects.render().into_bytes()),
    ];

    ensure_output_dir(dir).with_context(|| format!("output directory {:?}", dir))?;
    let writer = AtomicFileWriter::new(dir.to_path_buf());

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in &files {
        let path = writer
            .write(name, content)
            .with_context(|| format!("failed to write {name}"))?;
        import_info!("Wrote {:?} ({} bytes)", path, content.len());
        written.push(path);
    }
    Ok(written)
}
