use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use block_engine::{CutPolicy, FetchSettings, DEFAULT_CUT_BUTTON_TEXT};
use import_logging::LogDestination;
use serde::Deserialize;
use url::Url;

use crate::ImportOptions;

pub const DEFAULT_CONFIG_FILENAME: &str = "importer.ron";

/// Run configuration, read from a RON file. Every field is optional in the
/// file; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    pub export_path: PathBuf,
    pub output_dir: PathBuf,
    /// Root directory of stored media.
    pub media_dir: PathBuf,
    /// Public URL prefix of `media_dir`.
    pub media_base_url: String,
    /// Public URL prefix of files that already live in the destination
    /// storage and are referenced by path.
    pub files_base_url: String,
    /// Base for site-relative image sources.
    pub site_base_url: Option<String>,
    /// Logo used for sections whose own logo cannot be fetched.
    pub placeholder_logo_url: Option<String>,
    pub import_news: bool,
    pub import_articles: bool,
    pub import_files: bool,
    pub import_gallery: bool,
    pub cut: CutConfig,
    pub fetch: FetchConfig,
    pub memoize_media: bool,
    pub dry_run: bool,
    pub log_destination: LogTarget,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CutConfig {
    pub threshold: usize,
    pub min_total: usize,
    pub button_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LogTarget {
    File,
    #[default]
    Terminal,
    Both,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from("export.json"),
            output_dir: PathBuf::from("output"),
            media_dir: PathBuf::from("output/media"),
            media_base_url: "http://localhost/media/".to_string(),
            files_base_url: "http://localhost/".to_string(),
            site_base_url: None,
            placeholder_logo_url: None,
            import_news: true,
            import_articles: true,
            import_files: true,
            import_gallery: true,
            cut: CutConfig::default(),
            fetch: FetchConfig::default(),
            memoize_media: true,
            dry_run: false,
            log_destination: LogTarget::default(),
            log_file: PathBuf::from("importer.log"),
        }
    }
}

impl Default for CutConfig {
    fn default() -> Self {
        let policy = CutPolicy::default();
        Self {
            threshold: policy.threshold,
            min_total: policy.min_total,
            button_text: DEFAULT_CUT_BUTTON_TEXT.to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
            user_agent: settings.user_agent,
        }
    }
}

impl ImporterConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {:?}", path));
            }
        };
        Self::from_ron(&content).with_context(|| format!("failed to parse config {:?}", path))
    }

    pub fn from_ron(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Command-line values win over the file.
    pub fn with_overrides(
        mut self,
        export: Option<PathBuf>,
        output: Option<PathBuf>,
        dry_run: bool,
    ) -> Self {
        if let Some(export) = export {
            self.export_path = export;
        }
        if let Some(output) = output {
            self.output_dir = output;
        }
        self.dry_run |= dry_run;
        self
    }

    pub fn cut_policy(&self) -> CutPolicy {
        CutPolicy {
            threshold: self.cut.threshold,
            min_total: self.cut.min_total,
            button_text: self.cut.button_text.clone(),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            redirect_limit: self.fetch.redirect_limit,
            max_bytes: self.fetch.max_bytes,
            user_agent: self.fetch.user_agent.clone(),
        }
    }

    pub fn import_options(&self) -> anyhow::Result<ImportOptions> {
        Ok(ImportOptions {
            import_news: self.import_news,
            import_articles: self.import_articles,
            import_files: self.import_files,
            import_gallery: self.import_gallery,
            cut: self.cut_policy(),
            files_base_url: self.files_base()?,
            placeholder_logo_url: self.placeholder_logo_url.clone(),
        })
    }

    pub fn media_base(&self) -> anyhow::Result<Url> {
        directory_url(&self.media_base_url).context("invalid media_base_url")
    }

    pub fn files_base(&self) -> anyhow::Result<Url> {
        directory_url(&self.files_base_url).context("invalid files_base_url")
    }

    pub fn site_base(&self) -> anyhow::Result<Option<Url>> {
        self.site_base_url
            .as_deref()
            .map(|raw| Url::parse(raw.trim()).context("invalid site_base_url"))
            .transpose()
    }
}

/// Base URLs are joined with relative paths, so they must end with `/`.
fn directory_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ImporterConfig::load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, ImporterConfig::default());
        assert_eq!(config.cut_policy(), CutPolicy::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ImporterConfig::from_ron(
            r#"(
                export_path: "dump/export.json",
                files_base_url: "https://files.example.com/storage",
                import_gallery: false,
                cut: (threshold: 4),
                log_destination: Both,
            )"#,
        )
        .unwrap();

        assert_eq!(config.export_path, PathBuf::from("dump/export.json"));
        assert_eq!(
            config.files_base().unwrap().as_str(),
            "https://files.example.com/storage/"
        );
        assert_eq!(config.media_base().unwrap().as_str(), "http://localhost/media/");
        assert_eq!(config.site_base().unwrap(), None);
        assert!(!config.import_gallery);
        assert!(config.import_news);
        assert_eq!(config.cut.threshold, 4);
        assert_eq!(config.cut.min_total, 3);
        assert_eq!(config.cut.button_text, DEFAULT_CUT_BUTTON_TEXT);
        assert_eq!(config.log_destination, LogTarget::Both);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(ImporterConfig::from_ron("(import_news: maybe)").is_err());
    }

    #[test]
    fn bad_base_url_is_reported_on_use() {
        let config = ImporterConfig {
            media_base_url: "not a url".into(),
            ..ImporterConfig::default()
        };
        assert!(config.media_base().is_err());
    }

    #[test]
    fn cli_overrides_win() {
        let config = ImporterConfig::default().with_overrides(
            Some(PathBuf::from("other.json")),
            None,
            true,
        );
        assert_eq!(config.export_path, PathBuf::from("other.json"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.dry_run);
    }

    #[test]
    fn fetch_settings_follow_config() {
        let mut config = ImporterConfig::default();
        config.fetch.request_timeout_secs = 5;
        assert_eq!(config.fetch_settings().request_timeout, Duration::from_secs(5));
    }
}
