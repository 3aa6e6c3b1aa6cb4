//! One-shot aggregation pipeline: load, collect, merge, annotate, emit.
//!
//! A run is a synchronous sequence. Previously emitted data and manual
//! overrides come from the data directory, enabled collectors run one at a
//! time with per-source failure isolation, and the merged result lands back
//! in `conferences.yml` for the static-site generator to pick up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

use confscrape_core::{
    determine_status, merge_conferences, validate_conference, ConferenceRecord, Status,
};
use confscrape_fetch::{
    BackoffPolicy, HttpClientConfig, HttpFetcher, PageSnapshotStore, DEFAULT_USER_AGENT,
};
use confscrape_sources::{collector_for_source, CollectContext};

pub const CRATE_NAME: &str = "confscrape-pipeline";

pub const SCRAPER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const OUTPUT_FILE: &str = "conferences.yml";
pub const MANUAL_FILE: &str = "manual_conferences.yml";

/// Records with no deadline sort after every real date within their
/// partition.
const NO_DEADLINE_SORT_KEY: &str = "9999-12-31";

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    pub display_name: String,
    pub enabled: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub registry_path: PathBuf,
    pub artifacts_dir: Option<PathBuf>,
    pub user_agent: String,
    pub http_timeout_secs: u64,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("CONF_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("_data")),
            registry_path: std::env::var("CONF_SOURCES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("sources.yaml")),
            artifacts_dir: match std::env::var("CONF_ARTIFACTS_DIR") {
                Ok(v) if v.is_empty() => None,
                Ok(v) => Some(PathBuf::from(v)),
                Err(_) => Some(PathBuf::from("artifacts")),
            },
            user_agent: std::env::var("CONF_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            http_timeout_secs: std::env::var("CONF_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// The emitted document: run metadata plus the ordered conference list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDocument {
    pub metadata: OutputMetadata,
    pub conferences: Vec<ConferenceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub last_updated: String,
    pub scraper_version: String,
    pub total_conferences: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub existing: usize,
    pub scraped: usize,
    pub manual: usize,
    pub total: usize,
    pub failed_sources: Vec<String>,
    pub output_path: PathBuf,
}

/// Either a previously emitted output document or a manual overrides file;
/// both carry a `conferences:` list and nothing else the loader cares about.
#[derive(Debug, Default, Deserialize)]
struct ConferenceFile {
    #[serde(default)]
    conferences: Vec<ConferenceRecord>,
}

/// Load a conference list from a YAML file. A missing file is an empty
/// collection, not an error; an unreadable or malformed file is fatal since
/// silently discarding curated data would be worse.
pub async fn load_conference_file(path: &Path) -> Result<Vec<ConferenceRecord>> {
    if !fs::try_exists(path)
        .await
        .with_context(|| format!("checking {}", path.display()))?
    {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let file: ConferenceFile =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(file.conferences)
}

pub struct Pipeline {
    config: PipelineConfig,
    http: HttpFetcher,
    snapshots: Option<PageSnapshotStore>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let http = HttpFetcher::new(HttpClientConfig {
            timeout: Duration::from_secs(config.http_timeout_secs),
            user_agent: config.user_agent.clone(),
            backoff: BackoffPolicy::default(),
        })?;
        let snapshots = config.artifacts_dir.clone().map(PageSnapshotStore::new);
        Ok(Self {
            config,
            http,
            snapshots,
        })
    }

    pub async fn run_once(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let today = started_at.date_naive();
        info!(%run_id, data_dir = %self.config.data_dir.display(), "starting pipeline run");

        let registry = self.load_registry().await?;

        let existing = load_conference_file(&self.config.data_dir.join(OUTPUT_FILE)).await?;
        info!(count = existing.len(), "loaded existing conferences");

        let (scraped, failed_sources) = self.collect_all(&registry, today).await;
        info!(count = scraped.len(), "scraped conferences");

        let manual = load_conference_file(&self.config.data_dir.join(MANUAL_FILE)).await?;
        info!(count = manual.len(), "loaded manual conferences");

        let conferences = assemble(&existing, &scraped, &manual, today);

        let document = OutputDocument {
            metadata: OutputMetadata {
                last_updated: started_at.to_rfc3339(),
                scraper_version: SCRAPER_VERSION.to_string(),
                total_conferences: conferences.len(),
            },
            conferences,
        };

        let output_path = self.config.data_dir.join(OUTPUT_FILE);
        write_output(&output_path, &document).await?;
        info!(
            count = document.conferences.len(),
            path = %output_path.display(),
            "wrote conference data"
        );

        Ok(RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            existing: existing.len(),
            scraped: scraped.len(),
            manual: manual.len(),
            total: document.conferences.len(),
            failed_sources,
            output_path,
        })
    }

    async fn load_registry(&self) -> Result<SourceRegistry> {
        let path = &self.config.registry_path;
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Run every enabled collector in sequence. A source that fails, or has
    /// no collector registered yet, never aborts the others; it just
    /// contributes nothing this run.
    async fn collect_all(
        &self,
        registry: &SourceRegistry,
        today: NaiveDate,
    ) -> (Vec<ConferenceRecord>, Vec<String>) {
        let mut scraped = Vec::new();
        let mut failed_sources = Vec::new();
        let ctx = CollectContext {
            http: &self.http,
            snapshots: self.snapshots.as_ref(),
            today,
        };

        for source in registry.sources.iter().filter(|s| s.enabled) {
            let Some(collector) = collector_for_source(&source.source_id) else {
                warn!(source_id = %source.source_id, "no collector registered; skipping");
                continue;
            };

            info!(source_id = %source.source_id, "collecting from {}", source.display_name);
            match collector.collect(&ctx).await {
                Ok(records) => {
                    for record in records {
                        if validate_conference(&record) {
                            info!(
                                source_id = %source.source_id,
                                name = record.name.as_deref().unwrap_or_default(),
                                "found conference"
                            );
                            scraped.push(record);
                        } else {
                            warn!(source_id = %source.source_id, ?record, "dropping invalid record");
                        }
                    }
                }
                Err(err) => {
                    error!(source_id = %source.source_id, error = %err, "collection failed");
                    failed_sources.push(source.source_id.clone());
                }
            }
        }

        (scraped, failed_sources)
    }
}

/// Merge the three inputs (manual last, highest precedence), recompute every
/// status against `today`, stamp `last_verified` and impose the output order.
/// Pure over its inputs so runs are reproducible for a fixed date.
pub fn assemble(
    existing: &[ConferenceRecord],
    scraped: &[ConferenceRecord],
    manual: &[ConferenceRecord],
    today: NaiveDate,
) -> Vec<ConferenceRecord> {
    let combined = merge_conferences(existing, scraped);
    let mut all = merge_conferences(&combined, manual);

    let stamp = today.format("%Y-%m-%d").to_string();
    for record in &mut all {
        record.status = Some(determine_status(record, today));
        record.last_verified = Some(stamp.clone());
    }

    sort_for_output(&mut all);
    all
}

/// Past conferences last; within each partition, ascending submission
/// deadline with missing deadlines at the end.
pub fn sort_for_output(records: &mut [ConferenceRecord]) {
    records.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

fn sort_key(record: &ConferenceRecord) -> (bool, &str) {
    let deadline = record
        .submission_deadline
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_DEADLINE_SORT_KEY);
    (record.status == Some(Status::Past), deadline)
}

async fn write_output(path: &Path, document: &OutputDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let yaml = serde_yaml::to_string(document).context("serializing conference data")?;
    fs::write(path, yaml)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
