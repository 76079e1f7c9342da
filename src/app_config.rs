use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::MatchError;
use crate::file_utils::{self, FileManager};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
pub const DEFAULT_CONFIG_FILE: &str = "subrecut.conf.json";

/// Folder names used when a path is left empty, relative to the parent of `films-path`
pub const EPISODES_FOLDER: &str = "french";
pub const SUBS_TO_TRANSLATE_FOLDER: &str = "to-translate";
pub const SAVE_FOLDER: &str = "translated-subs";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Folder holding one subtitle file per film
    #[serde(default = "default_films_path")]
    pub films_path: PathBuf,

    /// Folder holding the per-episode subtitles in the film's language
    #[serde(default, alias = "fr-subs-path")]
    pub episodes_path: PathBuf,

    /// Folder holding the per-episode subtitles to re-cut, directly or one sub-folder per language
    #[serde(default)]
    pub subs_to_translate_path: PathBuf,

    /// Output folder
    #[serde(default)]
    pub save_path: PathBuf,

    /// Films to process
    #[serde(default)]
    pub films_to_build: Vec<FilmInfos>,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub builder: BuilderConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// One film entry of the configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FilmInfos {
    /// Subtitle file name of the film inside `films-path`
    pub file_name: String,

    /// Episodes the film was assembled from
    #[serde(
        default,
        deserialize_with = "deserialize_covered_episodes",
        serialize_with = "serialize_covered_episodes"
    )]
    pub covered_episodes: Vec<u32>,

    /// Film number, defaults to the first number of the file name
    #[serde(default)]
    pub number: Option<u32>,
}

impl FilmInfos {
    /// New entry for a film file with no covered episodes yet
    pub fn create(file_name: &str) -> Self {
        FilmInfos {
            file_name: file_name.to_string(),
            covered_episodes: Vec::new(),
            number: file_utils::extract_first_number(file_name),
        }
    }

    /// Declared number, else the first number of the file name
    pub fn film_number(&self) -> Option<u32> {
        self.number.or_else(|| file_utils::extract_first_number(&self.file_name))
    }

    /// Label used in logs and reports
    pub fn label(&self) -> String {
        match self.film_number() {
            Some(number) => number.to_string(),
            None => self.file_name.clone(),
        }
    }

    pub fn covers(&self, episode: u32) -> bool {
        self.covered_episodes.contains(&episode)
    }
}

/// An entry of `covered-episodes`: a number or a `"a-b"` range
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpisodeSpec {
    Number(u32),
    Text(String),
}

/// Expand numbers and `"a-b"` ranges into a flat episode list
pub fn parse_covered_episodes(specs: &[EpisodeSpec]) -> Result<Vec<u32>> {
    let mut result = Vec::new();

    for spec in specs {
        match spec {
            EpisodeSpec::Number(number) => result.push(*number),
            EpisodeSpec::Text(text) => {
                if let Some((start, end)) = text.split_once('-') {
                    let start: u32 = start.trim().parse()
                        .with_context(|| format!("Invalid episode range: {}", text))?;
                    let end: u32 = end.trim().parse()
                        .with_context(|| format!("Invalid episode range: {}", text))?;
                    if end < start {
                        return Err(anyhow!("Episode range is reversed: {}", text));
                    }
                    result.extend(start..=end);
                } else {
                    let number: u32 = text.trim().parse()
                        .with_context(|| format!("Invalid episode number: {}", text))?;
                    result.push(number);
                }
            }
        }
    }

    Ok(result)
}

/// Compress an episode list back into numbers and `"a-b"` ranges
pub fn unparse_covered_episodes(episodes: &[u32]) -> Vec<String> {
    let mut sorted = episodes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut result = Vec::new();
    let mut run_start: Option<u32> = None;

    for (i, &episode) in sorted.iter().enumerate() {
        let start = *run_start.get_or_insert(episode);
        if sorted.get(i + 1) == Some(&(episode + 1)) {
            continue;
        }
        if start == episode {
            result.push(episode.to_string());
        } else {
            result.push(format!("{}-{}", start, episode));
        }
        run_start = None;
    }

    result
}

fn deserialize_covered_episodes<'de, D>(deserializer: D) -> std::result::Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let specs = Vec::<EpisodeSpec>::deserialize(deserializer)?;
    parse_covered_episodes(&specs).map_err(de::Error::custom)
}

fn serialize_covered_episodes<S>(episodes: &[u32], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    unparse_covered_episodes(episodes).serialize(serializer)
}

/// Thresholds of the timecode matcher
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct MatcherConfig {
    /// Ratio a line pair must exceed to count as a match
    pub required_similarity: f64,

    /// Average ratio the look-ahead window must exceed to confirm a run
    pub window_similarity: f64,

    /// Ratio for absorbing the last unmatched line into a new run
    pub lookback_similarity: f64,

    /// Ratio for accepting an isolated single-line match
    pub single_line_similarity: f64,

    /// Ratio for accepting a two-lines-in-one match
    pub combine_similarity: f64,

    /// Plain ratio above which combine hypotheses are evaluated, `null` disables them
    pub combine_gate: Option<f64>,

    /// Pairs inspected by the look-ahead window
    pub lookahead: usize,

    /// Emphasis-only source lines scoring below this are skipped by the window
    pub emphasis_floor: f64,

    /// Midpoint offset tolerance around a run's shift
    pub shift_tolerance_ms: i64,

    /// Pairs a run may accept on timing alone
    pub max_shift_only_matches: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            required_similarity: 0.8,
            window_similarity: 0.75,
            lookback_similarity: 0.65,
            single_line_similarity: 0.98,
            combine_similarity: 0.94,
            combine_gate: Some(0.35),
            lookahead: 5,
            emphasis_floor: 0.70,
            shift_tolerance_ms: 120,
            max_shift_only_matches: 3,
        }
    }
}

/// Cut list merging
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct MergeConfig {
    /// Same-episode cuts closer than this are merged
    pub threshold_ms: i64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { threshold_ms: 10_000 }
    }
}

/// Re-cut subtitle building
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuilderConfig {
    /// Events shorter than this are dropped from the output
    pub min_duration_ms: i64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { min_duration_ms: 80 }
    }
}

/// Pairwise constant-shift synchronization
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct SyncConfig {
    /// Largest expected shift; candidates are searched within twice this value
    pub max_shift_ms: i64,

    /// Use the structural matcher for tracks in different languages
    pub cross_language: bool,

    pub same_language_threshold: f64,
    pub cross_language_threshold: f64,

    /// Inliers needed to trust an estimate
    pub min_inliers: usize,

    /// Largest allowed difference between first-half and second-half means
    pub max_half_difference_ms: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_shift_ms: 2_500,
            cross_language: false,
            same_language_threshold: 0.9,
            cross_language_threshold: 0.6,
            min_inliers: 10,
            max_half_difference_ms: 500.0,
        }
    }
}

impl SyncConfig {
    /// Search window and estimator bound
    pub fn window_ms(&self) -> i64 {
        self.max_shift_ms * 2
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_films_path() -> PathBuf {
    PathBuf::from("films")
}

fn check_ratio(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{} must be between 0 and 1, got {}", name, value));
    }
    Ok(())
}

impl Config {
    /// Load a JSON configuration file and fill in derived paths
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.resolve_paths();
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        FileManager::write_to_file(path, &json)
    }

    /// Default configuration listing every subtitle file found in `films_path`
    pub fn generate(films_path: &Path) -> Result<Self> {
        let mut config = Config {
            films_path: films_path.to_path_buf(),
            ..Config::default()
        };

        for film in FileManager::find_files_with_extensions(films_path, &file_utils::SUBTITLE_EXTENSIONS)? {
            if let Some(name) = film.file_name() {
                config.films_to_build.push(FilmInfos::create(&name.to_string_lossy()));
            }
        }

        config.resolve_paths();
        Ok(config)
    }

    /// Fill empty paths with folders next to `films_path`
    pub fn resolve_paths(&mut self) {
        let base = self
            .films_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if self.episodes_path.as_os_str().is_empty() {
            self.episodes_path = base.join(EPISODES_FOLDER);
        }
        if self.subs_to_translate_path.as_os_str().is_empty() {
            self.subs_to_translate_path = base.join(SUBS_TO_TRANSLATE_FOLDER);
        }
        if self.save_path.as_os_str().is_empty() {
            self.save_path = base.join(SAVE_FOLDER);
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let m = &self.matcher;
        check_ratio("required-similarity", m.required_similarity)?;
        check_ratio("window-similarity", m.window_similarity)?;
        check_ratio("lookback-similarity", m.lookback_similarity)?;
        check_ratio("single-line-similarity", m.single_line_similarity)?;
        check_ratio("combine-similarity", m.combine_similarity)?;
        check_ratio("emphasis-floor", m.emphasis_floor)?;
        if let Some(gate) = m.combine_gate {
            if gate < 0.0 {
                return Err(anyhow!("combine-gate must not be negative, got {}", gate));
            }
        }
        if m.lookahead == 0 {
            return Err(anyhow!("lookahead must be at least 1"));
        }
        if m.shift_tolerance_ms <= 0 {
            return Err(anyhow!("shift-tolerance-ms must be positive"));
        }
        if self.merge.threshold_ms < 0 || self.builder.min_duration_ms < 0 {
            return Err(anyhow!("merge and builder durations must not be negative"));
        }
        check_ratio("same-language-threshold", self.sync.same_language_threshold)?;
        check_ratio("cross-language-threshold", self.sync.cross_language_threshold)?;

        for film in &self.films_to_build {
            if film.file_name.trim().is_empty() {
                return Err(anyhow!("A film entry has an empty file-name"));
            }
        }

        Ok(())
    }

    pub fn is_to_build(&self, film_file_name: &str) -> bool {
        self.films_to_build.iter().any(|film| film.file_name == film_file_name)
    }

    pub fn get_film_info(&self, film_file_name: &str) -> Result<&FilmInfos, MatchError> {
        self.films_to_build
            .iter()
            .find(|film| film.file_name == film_file_name)
            .ok_or_else(|| MatchError::UnknownFilm(film_file_name.to_string()))
    }

    /// Keep only the films whose number is listed, an empty list keeps everything
    pub fn retain_films(&mut self, numbers: &[u32]) {
        if numbers.is_empty() {
            return;
        }
        self.films_to_build
            .retain(|film| film.film_number().is_some_and(|n| numbers.contains(&n)));
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            films_path: default_films_path(),
            episodes_path: PathBuf::new(),
            subs_to_translate_path: PathBuf::new(),
            save_path: PathBuf::new(),
            films_to_build: Vec::new(),
            matcher: MatcherConfig::default(),
            merge: MergeConfig::default(),
            builder: BuilderConfig::default(),
            sync: SyncConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
