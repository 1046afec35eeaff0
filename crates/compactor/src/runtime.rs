//! Builds a [`CompactManager`] from command-line options

use crate::cli::{EstimatorKind, RuntimeArgs, SummarizerKind};
use anyhow::Result;
use compactor_core::{
    CompactConfig, CompactManager, ConfigLoader, Exporter, NullExporter, StorageAdapter,
    Summarizer, TokenEstimator, CONFIG_FILE_CANDIDATES,
};
use compactor_store::{FileArchive, SqliteArchive};
use compactor_summarize::{ChatSummarizer, ExtractiveSummarizer};
use compactor_telemetry::{
    ConsoleExporter, HeuristicEstimator, HttpExporter, JsonlExporter, TiktokenEstimator,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolve the config path: explicit flag, else the first of
/// `compact.json`, `compact.yaml`, `compact.yml` present in the working directory
pub fn config_path(args: &RuntimeArgs) -> Option<PathBuf> {
    args.config.clone().or_else(|| {
        CONFIG_FILE_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    })
}

pub fn load_config(args: &RuntimeArgs) -> Result<CompactConfig> {
    let path = config_path(args);
    debug!(path = ?path, merge_env = args.merge_env, "loading config");
    Ok(ConfigLoader::load(path.as_deref(), args.merge_env)?)
}

pub fn build_summarizer(kind: SummarizerKind, model: &str) -> Result<Box<dyn Summarizer>> {
    match kind {
        SummarizerKind::Chat => Ok(Box::new(ChatSummarizer::from_env(model)?)),
        SummarizerKind::Extractive => Ok(Box::new(ExtractiveSummarizer::default())),
        SummarizerKind::Auto => match ChatSummarizer::from_env(model) {
            Ok(chat) => Ok(Box::new(chat)),
            Err(e) => {
                debug!(error = %e, "chat summarizer unavailable, using extractive");
                Ok(Box::new(ExtractiveSummarizer::default()))
            }
        },
    }
}

pub fn build_estimator(kind: EstimatorKind, model: &str) -> Box<dyn TokenEstimator> {
    match kind {
        EstimatorKind::Heuristic => Box::new(HeuristicEstimator),
        EstimatorKind::Tiktoken => match TiktokenEstimator::for_model(model) {
            Ok(estimator) => Box::new(estimator),
            Err(e) => {
                warn!(model, error = %e, "tiktoken unavailable, using heuristic estimator");
                Box::new(HeuristicEstimator)
            }
        },
    }
}

/// HTTP when an export URL is configured, then a JSONL file, then the log
pub fn build_exporter(config: &CompactConfig, events_log: Option<&Path>) -> Box<dyn Exporter> {
    if !config.telemetry_enabled() {
        return Box::new(NullExporter);
    }
    if let Some(url) = config.export_url() {
        match HttpExporter::new(url) {
            Ok(exporter) => return Box::new(exporter),
            Err(e) => warn!(url, error = %e, "cannot build HTTP exporter, falling back"),
        }
    }
    match events_log {
        Some(path) => Box::new(JsonlExporter::new(path)),
        None => Box::new(ConsoleExporter::default()),
    }
}

pub fn build_storage(
    config: &CompactConfig,
    args: &RuntimeArgs,
) -> Result<Option<Box<dyn StorageAdapter>>> {
    let redact = config.redaction_enabled();
    if let Some(dir) = &args.archive {
        let archive = if redact {
            FileArchive::new(dir)?
        } else {
            FileArchive::without_redaction(dir)
        };
        return Ok(Some(Box::new(archive)));
    }
    if let Some(db) = &args.archive_db {
        let archive = SqliteArchive::open(db)?;
        let archive = if redact {
            archive
        } else {
            archive.without_redaction()
        };
        return Ok(Some(Box::new(archive)));
    }
    Ok(None)
}

pub fn build_manager(config: CompactConfig, args: &RuntimeArgs) -> Result<CompactManager> {
    let summarizer = build_summarizer(args.summarizer, config.model())?;
    let exporter = build_exporter(&config, args.events_log.as_deref());
    let storage = build_storage(&config, args)?;

    let estimator = build_estimator(args.estimator, config.model());
    let manager = CompactManager::new(config, estimator, summarizer, exporter);
    Ok(match storage {
        Some(storage) => manager.with_storage(storage),
        None => manager,
    })
}
