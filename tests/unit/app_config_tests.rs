/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::path::PathBuf;
use subrecut::app_config::{
    parse_covered_episodes, unparse_covered_episodes, Config, EpisodeSpec, FilmInfos, LogLevel,
};
use subrecut::errors::MatchError;
use crate::common;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.films_path, PathBuf::from("films"));
    assert_eq!(config.matcher.required_similarity, 0.8);
    assert_eq!(config.matcher.window_similarity, 0.75);
    assert_eq!(config.matcher.lookback_similarity, 0.65);
    assert_eq!(config.matcher.single_line_similarity, 0.98);
    assert_eq!(config.matcher.combine_similarity, 0.94);
    assert_eq!(config.matcher.combine_gate, Some(0.35));
    assert_eq!(config.matcher.lookahead, 5);
    assert_eq!(config.matcher.shift_tolerance_ms, 120);
    assert_eq!(config.merge.threshold_ms, 10_000);
    assert_eq!(config.builder.min_duration_ms, 80);
    assert_eq!(config.sync.max_shift_ms, 2_500);
    assert_eq!(config.sync.window_ms(), 5_000);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parseCoveredEpisodes_withRangesAndNumbers_shouldExpand() -> Result<()> {
    let specs = vec![
        EpisodeSpec::Text("1-3".to_string()),
        EpisodeSpec::Number(5),
        EpisodeSpec::Text(" 7 - 8 ".to_string()),
        EpisodeSpec::Text("10".to_string()),
    ];

    assert_eq!(parse_covered_episodes(&specs)?, vec![1, 2, 3, 5, 7, 8, 10]);
    Ok(())
}

#[test]
fn test_parseCoveredEpisodes_withReversedOrInvalidRange_shouldFail() {
    assert!(parse_covered_episodes(&[EpisodeSpec::Text("8-3".to_string())]).is_err());
    assert!(parse_covered_episodes(&[EpisodeSpec::Text("a-b".to_string())]).is_err());
    assert!(parse_covered_episodes(&[EpisodeSpec::Text("two".to_string())]).is_err());
}

#[test]
fn test_unparseCoveredEpisodes_shouldCompressRuns() {
    assert_eq!(
        unparse_covered_episodes(&[8, 1, 2, 3, 5, 7, 3]),
        vec!["1-3".to_string(), "5".to_string(), "7-8".to_string()]
    );
    assert!(unparse_covered_episodes(&[]).is_empty());
}

/// Test loading a JSON config written by hand
#[test]
fn test_configLoad_withKebabCaseJson_shouldParseAndResolvePaths() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let json = r#"{
        "films-path": "/data/films",
        "fr-subs-path": "/data/fr",
        "films-to-build": [
            { "file-name": "Film 1.ass", "covered-episodes": ["1-3", 5] },
            { "file-name": "Le film 2.ass", "covered-episodes": [6], "number": 12 }
        ],
        "matcher": { "required-similarity": 0.85, "combine-gate": null },
        "log-level": "debug"
    }"#;
    let path = common::create_test_file(temp_dir.path(), "subrecut.conf.json", json)?;

    let config = Config::load(&path)?;

    assert_eq!(config.episodes_path, PathBuf::from("/data/fr"));
    assert_eq!(config.subs_to_translate_path, PathBuf::from("/data/to-translate"));
    assert_eq!(config.save_path, PathBuf::from("/data/translated-subs"));
    assert_eq!(config.films_to_build[0].covered_episodes, vec![1, 2, 3, 5]);
    assert_eq!(config.films_to_build[1].label(), "12");
    assert_eq!(config.matcher.required_similarity, 0.85);
    assert_eq!(config.matcher.combine_gate, None);
    assert_eq!(config.matcher.window_similarity, 0.75);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

#[test]
fn test_configSave_shouldWriteRangesAndReloadIdentically() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("subrecut.conf.json");
    let mut config = Config::default();
    let mut film = FilmInfos::create("Film 3.ass");
    film.covered_episodes = vec![4, 5, 6, 9];
    config.films_to_build.push(film);
    config.resolve_paths();

    config.save(&path)?;
    let written = std::fs::read_to_string(&path)?;
    let reloaded = Config::load(&path)?;

    assert!(written.contains("\"4-6\""));
    assert!(written.contains("\"covered-episodes\""));
    assert_eq!(reloaded.films_to_build, config.films_to_build);
    assert_eq!(reloaded.episodes_path, config.episodes_path);
    Ok(())
}

#[test]
fn test_configGenerate_withFilmsFolder_shouldListSubtitleFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let films = temp_dir.path().join("films");
    common::create_test_file(&films, "Film 2.ass", "[Events]\n")?;
    common::create_test_file(&films, "Film 1.srt", "")?;
    common::create_test_file(&films, "notes.txt", "")?;

    let config = Config::generate(&films)?;

    let names: Vec<&str> = config.films_to_build.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["Film 1.srt", "Film 2.ass"]);
    assert_eq!(config.films_to_build[1].number, Some(2));
    assert_eq!(config.episodes_path, temp_dir.path().join("french"));
    Ok(())
}

/// Test configuration validation
#[test]
fn test_configValidate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.matcher.required_similarity = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.matcher.lookahead = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.films_to_build.push(FilmInfos::create("  "));
    assert!(config.validate().is_err());
}

#[test]
fn test_getFilmInfo_withUnknownFilm_shouldReturnUnknownFilm() {
    let config = Config::default();

    match config.get_film_info("Film 9.ass") {
        Err(MatchError::UnknownFilm(name)) => assert_eq!(name, "Film 9.ass"),
        other => panic!("Expected UnknownFilm, got {:?}", other),
    }
}

#[test]
fn test_retainFilms_shouldKeepListedNumbersOnly() {
    let mut config = Config::default();
    for name in ["Film 1.ass", "Film 2.ass", "Film 3.ass"] {
        config.films_to_build.push(FilmInfos::create(name));
    }

    config.retain_films(&[]);
    assert_eq!(config.films_to_build.len(), 3);

    config.retain_films(&[1, 3]);
    assert!(config.is_to_build("Film 1.ass"));
    assert!(!config.is_to_build("Film 2.ass"));
    assert!(config.is_to_build("Film 3.ass"));
}
