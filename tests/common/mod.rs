/*!
 * Common test utilities for the subrecut test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use subrecut::app_config::{Config, FilmInfos};
use subrecut::subtitle_processor::{SubtitleEvent, SubtitleFile};

/// Lines of the first episode, in the film's language
pub const EPISODE_1_LINES: [&str; 8] = [
    "Bonjour à tous",
    "Le forgeron a encore perdu son marteau",
    "Qui a mangé mes pommes ?",
    "Nous partirons demain avant le lever du soleil",
    "Brr, l'eau est glacée",
    "Mon grand-père racontait souvent cette histoire",
    "Attention, le pont va céder !",
    "Vite, rentrons",
];

/// Lines of the second episode, in the film's language
pub const EPISODE_2_LINES: [&str; 8] = [
    "Six kiwis",
    "Combien coûte ce fromage de chèvre ?",
    "Zut !",
    "Cache la lettre sous le plancher, Hugo",
    "J'y vais",
    "La princesse s'est enfuie cette nuit",
    "Ouf, quel jour...",
    "Adieu, mes amis, et bonne chance",
];

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Events of `lines`, 2 s long and 3 s apart, starting at `offset_ms`
pub fn events_from_lines(lines: &[&str], offset_ms: i64) -> Vec<SubtitleEvent> {
    lines
        .iter()
        .enumerate()
        .map(|(k, text)| {
            let start = offset_ms + k as i64 * 3_000;
            SubtitleEvent::new(start, start + 2_000, *text)
        })
        .collect()
}

/// Writes an ASS file holding `events`
pub fn create_ass_file(dir: &Path, filename: &str, events: Vec<SubtitleEvent>) -> Result<PathBuf> {
    let path = dir.join(filename);
    SubtitleFile::from_events(path.clone(), events).write_to_ass(&path)?;
    Ok(path)
}

/// Folder layout of a project: films, episodes, subtitles to translate and output
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    /// One film made of episode 1 shifted by 10 s then episode 2 shifted by 40 s,
    /// with English episode subtitles to re-cut
    pub fn two_episode_film() -> Result<Self> {
        let root = create_temp_dir()?;
        let base = root.path();

        let mut film = events_from_lines(&EPISODE_1_LINES, 10_000);
        film.extend(events_from_lines(&EPISODE_2_LINES, 40_000));
        fs::create_dir_all(base.join("films"))?;
        create_ass_file(&base.join("films"), "Film 1.ass", film)?;

        fs::create_dir_all(base.join("french"))?;
        create_ass_file(&base.join("french"), "Show 01.ass", events_from_lines(&EPISODE_1_LINES, 0))?;
        create_ass_file(&base.join("french"), "Show 02.ass", events_from_lines(&EPISODE_2_LINES, 0))?;

        let english = base.join("to-translate").join("english");
        fs::create_dir_all(&english)?;
        let english_lines: Vec<String> = (1..=8).map(|k| format!("English line {}", k)).collect();
        let english_refs: Vec<&str> = english_lines.iter().map(String::as_str).collect();
        create_ass_file(&english, "Show 01 EN.ass", events_from_lines(&english_refs, 0))?;
        create_ass_file(&english, "Show 02 EN.ass", events_from_lines(&english_refs, 0))?;

        Ok(Workspace { root })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Config pointing at every folder of the workspace, with `Film 1.ass` covering episodes 1-2
    pub fn config(&self) -> Config {
        let base = self.path();
        let mut film = FilmInfos::create("Film 1.ass");
        film.covered_episodes = vec![1, 2];

        Config {
            films_path: base.join("films"),
            episodes_path: base.join("french"),
            subs_to_translate_path: base.join("to-translate"),
            save_path: base.join("out"),
            films_to_build: vec![film],
            ..Config::default()
        }
    }
}
