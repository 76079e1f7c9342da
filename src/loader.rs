use log::{debug, info, warn};
use std::path::Path;

use crate::app_config::FilmInfos;
use crate::errors::MatchError;
use crate::file_utils::{self, FileManager};
use crate::subtitle_processor::{SubtitleFile, SubtitleStyle};

// @module: Loading the per-episode subtitle files of a film

/// Load every subtitle file of `dir` whose episode number is covered by `film`.
///
/// Files that fail to parse are logged and skipped. A missing folder, or a
/// folder without any file for the covered episodes, is a `SourceNotFound`.
pub fn load_episodes(dir: &Path, film: &FilmInfos) -> Result<Vec<SubtitleFile>, MatchError> {
    if !FileManager::dir_exists(dir) {
        return Err(MatchError::SourceNotFound(format!("episode folder {:?} does not exist", dir)));
    }

    let candidates = FileManager::find_files_with_extensions(dir, &file_utils::SUBTITLE_EXTENSIONS)
        .map_err(|e| MatchError::SourceNotFound(format!("{:?}: {}", dir, e)))?;

    let mut files = Vec::new();
    for path in candidates {
        let covered = file_utils::episode_number_from_path(&path)
            .is_some_and(|number| film.covers(number));
        if !covered {
            debug!("{:?} is not a covered episode", path.file_name().unwrap_or_default());
            continue;
        }

        match SubtitleFile::load(&path) {
            Ok(file) => {
                info!("Subtitle file loaded: {}", file.file_name());
                files.push(file);
            }
            Err(e) => warn!("Error loading subtitle file {:?}: {}", path, e),
        }
    }

    if files.is_empty() {
        return Err(MatchError::SourceNotFound(format!(
            "no subtitle file in {:?} for episodes {:?}",
            dir, film.covered_episodes
        )));
    }

    Ok(files)
}

/// Give every file the same style table.
///
/// Styles are collected in file order. A style whose name is already taken
/// with different parameters is renamed `<file stem>_<style>` in its file
/// before being added.
pub fn harmonize_styles(files: &mut [SubtitleFile]) {
    let mut merged: Vec<SubtitleStyle> = Vec::new();

    for file in files.iter_mut() {
        let mut renames = Vec::new();

        for style in &file.styles {
            match merged.iter().find(|existing| existing.name == style.name) {
                Some(existing) if existing.same_parameters(style) => {}
                Some(_) => {
                    let new_name = format!("{}_{}", file.file_stem(), style.name);
                    let mut renamed = style.clone();
                    renamed.name = new_name.clone();
                    merged.push(renamed);
                    renames.push((style.name.clone(), new_name));
                }
                None => merged.push(style.clone()),
            }
        }

        for (old_name, new_name) in renames {
            debug!("Style {} of {} renamed {}", old_name, file.file_name(), new_name);
            file.rename_style(&old_name, &new_name);
        }
    }

    for file in files.iter_mut() {
        file.styles = merged.clone();
    }
}
