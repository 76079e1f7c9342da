use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::builder::SubtitleBuilder;
use crate::errors::{AppError, MatchError};
use crate::file_utils::{self, FileManager};
use crate::loader;
use crate::log_sink::LogSink;
use crate::matching::{cuts, Cut, Stats, SubtitleSync, SyncResult, Timecode, TimecodeFinder};
use crate::subtitle_processor::SubtitleFile;

// @module: Application controller for film subtitle re-cutting

/// Main application controller
pub struct Controller {
    // @field: App configuration, shared with the film workers
    config: Arc<Config>,

    // @field: Progress bars of the running films
    progress: MultiProgress,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("Configuration validation failed: {:#}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            progress: MultiProgress::new(),
        })
    }

    /// Same controller without any progress output
    pub fn without_progress(mut self) -> Self {
        self.progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Film subtitle files present in `films-path` and declared in the config, sorted by name
    pub fn films_to_process(&self) -> Result<Vec<String>> {
        if !FileManager::dir_exists(&self.config.films_path) {
            return Err(anyhow!("films-path {:?} is not a valid folder", self.config.films_path));
        }

        let films = FileManager::find_files_with_extensions(&self.config.films_path, &file_utils::SUBTITLE_EXTENSIONS)?
            .into_iter()
            .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
            .filter(|name| self.config.is_to_build(name))
            .collect();

        Ok(films)
    }

    /// Match and build every film, one blocking task per film.
    ///
    /// Results come back in completion order; failed films are logged and left out.
    pub async fn run_batch(&self) -> Result<Vec<Stats>> {
        let films = self.films_to_process()?;
        info!("Processing {} films", films.len());

        // One blocking task per film, all started at once
        let concurrency = films.len().max(1);
        let joined = stream::iter(films)
            .map(|film| {
                let config = Arc::clone(&self.config);
                let progress = self.progress.clone();

                tokio::task::spawn_blocking(move || {
                    let sink = LogSink::quiet(film.clone());
                    process_film(&config, &film, &sink, &progress)
                })
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut results = Vec::new();
        for outcome in joined {
            match outcome {
                Ok(Some(stats)) => results.push(stats),
                Ok(None) => {}
                Err(e) => error!("Film task failed: {}", e),
            }
        }

        Ok(results)
    }

    /// Same pipeline as `run_batch`, one film after the other on the current thread
    pub fn run_batch_single_thread(&self) -> Result<Vec<Stats>> {
        let mut results = Vec::new();

        for film in self.films_to_process()? {
            let sink = LogSink::verbose(film.clone());
            if let Some(stats) = process_film(&self.config, &film, &sink, &self.progress) {
                results.push(stats);
            }
        }

        Ok(results)
    }

    /// Match one film (the first one when `film` is `None`) and write its cut list
    /// to `<output_dir>/<film file name>.txt`
    pub fn run_cut(&self, film: Option<&str>, output_dir: &Path) -> Result<(Vec<Cut>, Stats, PathBuf)> {
        let film_name = match film {
            Some(name) => name.trim_start_matches("./").trim_start_matches(".\\").to_string(),
            None => self
                .films_to_process()?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No film to process in {:?}", self.config.films_path))?,
        };

        let sink = LogSink::verbose(film_name.clone());
        let progress = self.film_progress_bar(&film_name, "Find timecodes");
        let (timecodes, stats) = match_film(&self.config, &film_name, &sink, progress)?;

        let cut_list = cuts::merge_cuts(&timecodes, self.config.merge.threshold_ms);
        let output = output_dir.join(format!("{}.txt", film_name));
        cuts::write_cut_list(&output, &cut_list)?;
        for cut in &cut_list {
            info!("{}", cut);
        }
        info!("Cut list saved: {:?}", output);

        Ok((cut_list, stats, output))
    }

    /// Compute the shift of every target file against its reference, and apply
    /// the accepted ones when `apply` is set
    pub fn run_sync(&self, reference_dir: &Path, target_dir: &Path, apply: bool) -> Result<Vec<SyncResult>> {
        let sync = SubtitleSync::from_config(&self.config.sync);
        let results = sync.compute_folder_shifts(reference_dir, target_dir)?;

        if apply {
            for result in &results {
                match &result.outcome {
                    Ok(estimate) => {
                        crate::matching::apply_shift(&result.target, estimate.shift_ms)?;
                    }
                    Err(e) => warn!("{:?} left unchanged: {}", result.target, e),
                }
            }
        }

        Ok(results)
    }

    fn film_progress_bar(&self, film: &str, phase: &str) -> ProgressBar {
        film_progress_bar(&self.progress, film, phase)
    }
}

fn film_progress_bar(progress: &MultiProgress, film: &str, phase: &str) -> ProgressBar {
    let bar = progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("█▓▒░"));
    bar.set_message(format!("{} {}", phase, film));
    bar
}

/// Load a film and the episode subtitles it covers, then find its timecodes
pub fn match_film(
    config: &Config,
    film_file_name: &str,
    sink: &LogSink,
    progress: ProgressBar,
) -> Result<(Vec<Timecode>, Stats), MatchError> {
    let film_info = config.get_film_info(film_file_name)?;

    let film_path = config.films_path.join(film_file_name);
    if !FileManager::file_exists(&film_path) {
        return Err(MatchError::SourceNotFound(format!("film subtitles {:?} do not exist", film_path)));
    }
    let film = SubtitleFile::load(&film_path)?;
    let episodes = loader::load_episodes(&config.episodes_path, film_info)?;

    sink.info(format_args!(
        "Finding timecodes for {} in {} episode files",
        film_file_name,
        episodes.len()
    ));

    let finder = TimecodeFinder::new(&film.events, &episodes, &config.matcher)
        .with_sink(sink.clone())
        .with_progress(progress);

    Ok(finder.find_timecodes(&film_info.label()))
}

/// Folders holding the subtitles to re-cut: `subs-to-translate-path` itself when
/// it directly holds subtitle files, else each of its sub-folders
pub fn translation_folders(subs_to_translate_path: &Path) -> Result<Vec<PathBuf>> {
    if !FileManager::dir_exists(subs_to_translate_path) {
        return Err(anyhow!("subs-to-translate-path {:?} is not a valid folder", subs_to_translate_path));
    }

    let direct = FileManager::find_files_with_extensions(subs_to_translate_path, &file_utils::SUBTITLE_EXTENSIONS)?;
    if !direct.is_empty() {
        return Ok(vec![subs_to_translate_path.to_path_buf()]);
    }

    FileManager::list_dirs(subs_to_translate_path)
}

/// Re-cut the subtitles of every translation folder with `timecodes`.
///
/// Outputs land in `<save-path>/<folder name>/<film stem>.ass`.
pub fn build_outputs(
    config: &Config,
    film_file_name: &str,
    timecodes: &[Timecode],
    sink: &LogSink,
    progress: &MultiProgress,
) -> Result<Vec<PathBuf>> {
    let film_info = config.get_film_info(film_file_name)?;
    let output_name = Path::new(film_file_name).with_extension("ass");
    let mut outputs = Vec::new();

    for folder in translation_folders(&config.subs_to_translate_path)? {
        let mut episodes = match loader::load_episodes(&folder, film_info) {
            Ok(episodes) => episodes,
            Err(e) => {
                sink.error(format_args!("Skipping {:?}: {}", folder, e));
                continue;
            }
        };
        loader::harmonize_styles(&mut episodes);
        sink.info(format_args!("Loaded {} subtitle files from {:?}", episodes.len(), folder));

        let folder_name = folder
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let output_path = config.save_path.join(folder_name).join(&output_name);

        let bar = film_progress_bar(progress, film_file_name, "Build");
        let output = SubtitleBuilder::new(&episodes, &config.builder)
            .with_sink(sink.clone())
            .with_progress(bar)
            .build(timecodes, output_path.clone());

        output.write_to_ass(&output_path)?;
        sink.info(format_args!("Result file saved: {:?}", output_path));
        outputs.push(output_path);
    }

    Ok(outputs)
}

/// Full pipeline for one film: match, then build.
///
/// A film whose sources are missing yields the sentinel `Stats`; any other
/// failure is logged and yields `None`.
pub fn process_film(config: &Config, film_file_name: &str, sink: &LogSink, progress: &MultiProgress) -> Option<Stats> {
    let bar = film_progress_bar(progress, film_file_name, "Find timecodes");

    let (timecodes, stats) = match match_film(config, film_file_name, sink, bar) {
        Ok(result) => result,
        Err(MatchError::SourceNotFound(message)) => {
            sink.warn(format_args!("{}", message));
            let label = config
                .get_film_info(film_file_name)
                .map(|info| info.label())
                .unwrap_or_else(|_| film_file_name.to_string());
            return Some(Stats::missing_sources(label));
        }
        Err(e) => {
            sink.error(format_args!("{}", e));
            return None;
        }
    };

    if let Err(e) = build_outputs(config, film_file_name, &timecodes, sink, progress) {
        sink.error(format_args!("Build failed: {:#}", e));
    }

    Some(stats)
}
