use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use block_engine::{FsStorage, MediaUploader, ReqwestFetcher, SegmenterSettings};
use clap::Parser;
use import_logging::{import_error, import_info};
use importer_app::{write_outputs, Importer, ImporterConfig, DEFAULT_CONFIG_FILENAME};
use legacy_export::read_export;
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "importer", about = "Import a legacy site export as content blocks")]
struct Cli {
    /// RON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILENAME)]
    config: PathBuf,
    /// Export JSON to read (overrides the config)
    #[arg(long)]
    export: Option<PathBuf>,
    /// Output directory (overrides the config)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Segment and fetch, but write neither media nor outputs
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config =
        ImporterConfig::load(&cli.config)?.with_overrides(cli.export, cli.output, cli.dry_run);

    import_logging::initialize(
        config.log_destination.into(),
        LevelFilter::Info,
        &config.log_file,
    );

    if let Err(err) = run(&config).await {
        import_error!("Import failed: {:#}", err);
        return Err(err);
    }
    Ok(())
}

async fn run(config: &ImporterConfig) -> anyhow::Result<()> {
    import_info!("Read data from {:?}", config.export_path);
    let export = read_export(&config.export_path)
        .with_context(|| format!("failed to load export {:?}", config.export_path))?;

    let fetcher = Arc::new(ReqwestFetcher::new(config.fetch_settings()));
    let storage = Arc::new(FsStorage::new(config.media_dir.clone(), config.media_base()?));
    let uploader = Arc::new(if config.memoize_media {
        MediaUploader::new(fetcher, storage)
    } else {
        MediaUploader::without_memoization(fetcher, storage)
    });

    let settings = SegmenterSettings {
        base_url: config.site_base()?,
    };
    let importer = Importer::new(uploader.clone(), settings, config.import_options()?);
    let output = importer.import(&export).await;

    if config.dry_run {
        import_info!(
            "Dry run: {} sections and {} posts not written",
            output.sections.len(),
            output.posts.len()
        );
        return Ok(());
    }

    let stored = uploader
        .finish_batch()
        .await
        .context("failed to store media")?;
    import_info!("Stored {} media files under {:?}", stored, config.media_dir);

    write_outputs(&config.output_dir, &output)?;
    import_info!("Import done, outputs in {:?}", config.output_dir);
    Ok(())
}
