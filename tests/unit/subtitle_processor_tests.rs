/*!
 * Tests for subtitle file reading and writing
 */

use anyhow::Result;
use subrecut::errors::SubtitleError;
use subrecut::subtitle_processor::{SubtitleEvent, SubtitleFile};
use crate::common;

const ASS_SAMPLE: &str = "[Script Info]
Title: Show 04
ScriptType: v4.00+
PlayResX: 1280
PlayResY: 720

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour
Style: Default,Arial,48,&H00FFFFFF
Style: Sign,Verdana,30,&H0000FFFF

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:05.00,0:00:07.50,Default,,0,0,0,,Second line, with a comma
Dialogue: 0,0:00:01.00,0:00:03.00,Sign,,0,0,0,,{\\an8}First line
Comment: 0,0:00:09.00,0:00:10.00,Default,,0,0,0,,note

[Fonts]
fontname: custom.ttf
";

/// Test loading an ASS file from disk
#[test]
fn test_load_withAssFile_shouldSortEventsAndKeepEverything() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "Show 04.ass", ASS_SAMPLE)?;

    let file = SubtitleFile::load(&path)?;

    assert_eq!(file.episode_number, Some(4));
    assert_eq!(file.info("PlayResY"), Some("720"));
    assert_eq!(file.styles.len(), 2);
    assert_eq!(file.style("Sign").and_then(|s| s.get("Fontname")), Some("Verdana"));
    assert_eq!(file.events.len(), 3);
    assert_eq!(file.events[0].text, "{\\an8}First line");
    assert_eq!(file.events[1].text, "Second line, with a comma");
    assert_eq!(file.events[1].end_ms, 7_500);
    assert!(file.events[2].is_comment);
    assert_eq!(file.extra_sections[0].0, "Fonts");
    Ok(())
}

#[test]
fn test_writeToAss_thenLoad_shouldPreserveEventsStylesAndSections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "Show 04.ass", ASS_SAMPLE)?;
    let copy = temp_dir.path().join("out").join("Show 04.ass");

    let original = SubtitleFile::load(&source)?;
    original.write_to_ass(&copy)?;
    let reloaded = SubtitleFile::load(&copy)?;

    assert_eq!(reloaded.events, original.events);
    assert_eq!(reloaded.styles, original.styles);
    assert_eq!(reloaded.extra_sections, original.extra_sections);
    Ok(())
}

#[test]
fn test_load_withSrtFile_shouldJoinLinesWithAssBreaks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,250
It contains
two lines.
";
    let path = common::create_test_file(temp_dir.path(), "Show 12.srt", content)?;

    let file = SubtitleFile::load(&path)?;

    assert_eq!(file.episode_number, Some(12));
    assert_eq!(file.events.len(), 2);
    assert_eq!(file.events[1].text, "It contains\\Ntwo lines.");
    assert_eq!(file.events[1].end_ms, 9_250);
    Ok(())
}

#[test]
fn test_load_withUnsupportedExtension_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "Show 01.vtt", "WEBVTT")?;

    assert!(matches!(SubtitleFile::load(&path), Err(SubtitleError::UnsupportedFormat(_))));
    assert!(matches!(
        SubtitleFile::load(temp_dir.path().join("missing.ass")),
        Err(SubtitleError::Io { .. })
    ));
    Ok(())
}

#[test]
fn test_shiftBy_shouldRoundBothEndsToTenMs() {
    let mut event = SubtitleEvent::new(1_000, 2_000, "x");
    event.shift_by(1_234);
    assert_eq!((event.start_ms, event.end_ms), (2_230, 3_230));

    event.shift_by(-2_235);
    assert_eq!((event.start_ms, event.end_ms), (0, 1_000));
}
