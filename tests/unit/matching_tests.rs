/*!
 * Tests for the timecode finder and cut lists through the public API
 */

use std::path::PathBuf;
use subrecut::app_config::MatcherConfig;
use subrecut::matching::cuts::{cut_list_text, merge_cuts};
use subrecut::matching::{similarity, Timecode, TimecodeFinder};
use subrecut::subtitle_processor::{SubtitleEvent, SubtitleFile};
use crate::common::{events_from_lines, EPISODE_1_LINES, EPISODE_2_LINES};

fn episodes() -> Vec<SubtitleFile> {
    vec![
        SubtitleFile::from_events(PathBuf::from("Show 01.ass"), events_from_lines(&EPISODE_1_LINES, 0)),
        SubtitleFile::from_events(PathBuf::from("Show 02.ass"), events_from_lines(&EPISODE_2_LINES, 0)),
    ]
}

fn spans(timecodes: &[Timecode]) -> Vec<(i64, i64, i64, Option<u32>)> {
    timecodes
        .iter()
        .map(|t| (t.start_ms, t.end_ms, t.shift_ms, t.episode_number))
        .collect()
}

#[test]
fn test_findTimecodes_withTwoShiftedEpisodes_shouldReturnOneRunPerEpisode() {
    let episodes = episodes();
    let config = MatcherConfig::default();
    let mut film = events_from_lines(&EPISODE_1_LINES, 10_000);
    film.extend(events_from_lines(&EPISODE_2_LINES, 40_000));

    let (timecodes, stats) = TimecodeFinder::new(&film, &episodes, &config).find_timecodes("1");

    assert_eq!(
        spans(&timecodes),
        vec![(0, 23_000, 10_000, Some(1)), (0, 23_000, 40_000, Some(2))]
    );
    assert_eq!(timecodes[0].source_file, "Show 01.ass");
    assert_eq!((stats.found, stats.not_found, stats.total), (16, 0, 16));
    assert_eq!(stats.quality(), 100.0);
}

#[test]
fn test_findTimecodes_withFilmOnlyLine_shouldRecordItAsNotFound() {
    let episodes = episodes();
    let config = MatcherConfig::default();
    let mut film = events_from_lines(&EPISODE_1_LINES, 10_000);
    film.push(SubtitleEvent::new(35_000, 36_000, "Wxyz 42 !"));
    film.extend(events_from_lines(&EPISODE_2_LINES, 40_000));

    let (timecodes, stats) = TimecodeFinder::new(&film, &episodes, &config).find_timecodes("1");

    assert_eq!(timecodes.len(), 2);
    assert_eq!((stats.found, stats.not_found, stats.total), (16, 1, 17));
    assert_eq!(stats.subs_not_found, vec!["Wxyz 42 !".to_string()]);
    assert_eq!(format!("{}", stats), "1 : 16/17 found");
}

#[test]
fn test_findTimecodes_withDifferentStylingOnly_shouldStillMatch() {
    let episodes = episodes();
    let config = MatcherConfig::default();
    let film: Vec<SubtitleEvent> = events_from_lines(&EPISODE_2_LINES, 5_000)
        .into_iter()
        .map(|mut event| {
            event.text = format!("{{\\i1}}{}{{\\i0}}", event.text.to_uppercase());
            event
        })
        .collect();

    let (timecodes, stats) = TimecodeFinder::new(&film, &episodes, &config).find_timecodes("2");

    assert_eq!(spans(&timecodes), vec![(0, 23_000, 5_000, Some(2))]);
    assert_eq!(stats.found, 8);
}

#[test]
fn test_mergeCuts_onFinderOutput_shouldWriteOneLinePerEpisode() {
    let episodes = episodes();
    let config = MatcherConfig::default();
    let mut film = events_from_lines(&EPISODE_1_LINES, 10_000);
    film.extend(events_from_lines(&EPISODE_2_LINES, 40_000));

    let (timecodes, _) = TimecodeFinder::new(&film, &episodes, &config).find_timecodes("1");
    let cuts = merge_cuts(&timecodes, 10_000);

    assert_eq!(
        cut_list_text(&cuts),
        "00:00:10 - ep 1 (00:00 - 00:23)\n00:00:40 - ep 2 (00:00 - 00:23)\n"
    );
    assert_eq!(cuts[0].label, "Show 01");
    assert_eq!(cuts[1].length_ms(), 23_000);
}

#[test]
fn test_similarity_shouldIgnoreTagsCaseAndPunctuation() {
    assert_eq!(similarity("{\\an8}Bonjour, à tous !", "BONJOUR à tous !"), 1.0);
    assert!(similarity("Six kiwis", "Adieu, mes amis, et bonne chance") < 0.5);
}
