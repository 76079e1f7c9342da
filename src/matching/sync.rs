/*!
 * Constant-shift synchronization of one subtitle track against another.
 *
 * Lines of the reference track are paired with lines of the target track that
 * start within the search window and satisfy the configured `TextMatcher`.
 * The pairs feed the `ShiftEstimator`; an accepted shift can then be applied
 * to the target file in place, after a copy of the original is kept aside.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::SyncConfig;
use crate::errors::ShiftError;
use crate::file_utils::FileManager;
use crate::matching::shift::{ShiftEstimate, ShiftEstimator};
use crate::matching::similarity::TextMatcher;
use crate::subtitle_processor::{SubtitleEvent, SubtitleFile};

/// Folder, next to the target file, receiving the original before a shift is applied
pub const BACKUP_FOLDER: &str = "unsynced_subs";

/// Shift computed for one reference/target pair of files
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub reference: PathBuf,
    pub target: PathBuf,
    pub pairs: usize,
    pub outcome: Result<ShiftEstimate, ShiftError>,
}

impl SyncResult {
    /// Shift to apply, 0 when the estimate was rejected
    pub fn shift_ms(&self) -> i64 {
        self.outcome.as_ref().map_or(0, |estimate| estimate.shift_ms)
    }
}

#[derive(Debug, Clone)]
pub struct SubtitleSync {
    matcher: TextMatcher,
    estimator: ShiftEstimator,
    window_ms: i64,
}

impl SubtitleSync {
    pub fn new(matcher: TextMatcher, estimator: ShiftEstimator, window_ms: i64) -> Self {
        Self {
            matcher,
            estimator,
            window_ms,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            TextMatcher::from_config(config),
            ShiftEstimator::from_config(config),
            config.window_ms(),
        )
    }

    /// Pair reference lines with target lines.
    ///
    /// For each reference line the first matching target line within the
    /// window wins, and later searches resume right after it.
    pub fn match_events<'a>(
        &self,
        reference: &'a [SubtitleEvent],
        target: &'a [SubtitleEvent],
    ) -> Vec<(&'a SubtitleEvent, &'a SubtitleEvent)> {
        let mut pairs = Vec::new();
        let mut next_target = 0;

        for reference_event in reference {
            let found = target
                .iter()
                .enumerate()
                .skip(next_target)
                .filter(|(_, event)| (event.start_ms - reference_event.start_ms).abs() <= self.window_ms)
                .find(|(_, event)| self.matcher.matches(&reference_event.text, &event.text));

            if let Some((index, target_event)) = found {
                debug!("Matched: {} - {}", reference_event.text, target_event.text);
                pairs.push((reference_event, target_event));
                next_target = index + 1;
            }
        }

        pairs
    }

    /// Estimate the shift moving `target` onto `reference`
    pub fn compute_shift(&self, reference: &SubtitleFile, target: &SubtitleFile) -> SyncResult {
        let pairs = self.match_events(&reference.events, &target.events);
        let outcome = self.estimator.estimate(&pairs);

        match &outcome {
            Ok(estimate) => info!(
                "{}: shift {} ms from {} correspondences ({} kept, halves {:.2} / {:.2} ms)",
                target.file_name(),
                estimate.shift_ms,
                pairs.len(),
                estimate.inliers,
                estimate.first_half_mean,
                estimate.second_half_mean
            ),
            Err(e) => warn!("{}: no shift applied, {}", target.file_name(), e),
        }

        SyncResult {
            reference: reference.path.clone(),
            target: target.path.clone(),
            pairs: pairs.len(),
            outcome,
        }
    }

    /// Pair the `.ass` files of two folders by sorted name and compute each shift
    pub fn compute_folder_shifts(&self, reference_dir: &Path, target_dir: &Path) -> Result<Vec<SyncResult>> {
        let references = FileManager::find_files(reference_dir, "ass")?;
        let targets = FileManager::find_files(target_dir, "ass")?;

        if references.len() != targets.len() {
            return Err(anyhow!(
                "The number of files in the folders doesn't match ({} vs {})",
                references.len(),
                targets.len()
            ));
        }

        let mut results = Vec::with_capacity(targets.len());
        for (reference_path, target_path) in references.iter().zip(&targets) {
            info!(
                "File: {} - {}",
                reference_path.file_name().unwrap_or_default().to_string_lossy(),
                target_path.file_name().unwrap_or_default().to_string_lossy()
            );
            match (SubtitleFile::load(reference_path), SubtitleFile::load(target_path)) {
                (Ok(reference), Ok(target)) => results.push(self.compute_shift(&reference, &target)),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("{}: not synced, {}", target_path.display(), e);
                    results.push(SyncResult {
                        reference: reference_path.clone(),
                        target: target_path.clone(),
                        pairs: 0,
                        outcome: Err(ShiftError::LoadFailed(e.to_string())),
                    });
                }
            }
        }

        Ok(results)
    }
}

/// Shift every event of `target_path` in place; the original is copied to
/// `unsynced_subs/` beside it first. Returns the backup path.
pub fn apply_shift(target_path: &Path, shift_ms: i64) -> Result<PathBuf> {
    let mut file = SubtitleFile::load(target_path)
        .with_context(|| format!("Failed to load {:?}", target_path))?;

    let file_name = target_path
        .file_name()
        .ok_or_else(|| anyhow!("Not a file path: {:?}", target_path))?;
    let backup = target_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(BACKUP_FOLDER)
        .join(file_name);

    FileManager::copy_file(target_path, &backup)?;
    info!("Unsynced subtitles saved to: {:?}", backup);

    for event in &mut file.events {
        event.shift_by(shift_ms);
    }
    file.write_to_ass(target_path)?;
    info!("Synced subtitles saved to: {:?}", target_path);

    Ok(backup)
}
