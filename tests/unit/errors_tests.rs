/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;
use subrecut::errors::{AppError, MatchError, ShiftError, SubtitleError};

#[test]
fn test_subtitleError_parse_shouldDisplayLineAndMessage() {
    let error = SubtitleError::Parse {
        line: 12,
        message: "event has 3 fields, format declares 10".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("line 12"));
    assert!(display.contains("3 fields"));
}

#[test]
fn test_subtitleError_io_shouldDisplayPath() {
    let error = SubtitleError::Io {
        path: PathBuf::from("french/Show 01.ass"),
        message: "permission denied".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("Show 01.ass"));
    assert!(display.contains("permission denied"));
}

#[test]
fn test_matchError_fromSubtitleError_shouldWrap() {
    let error: MatchError = SubtitleError::InvalidTimestamp("1:2".to_string()).into();
    assert!(matches!(error, MatchError::Subtitle(SubtitleError::InvalidTimestamp(_))));
    assert!(format!("{}", error).contains("Invalid timestamp: 1:2"));
}

#[test]
fn test_shiftError_variants_shouldDisplayFigures() {
    let insufficient = ShiftError::InsufficientData { inliers: 4, required: 10 };
    assert!(format!("{}", insufficient).contains("(4 < 10)"));

    let halves = ShiftError::InconsistentHalves {
        first_half: 100.0,
        second_half: 900.5,
    };
    assert!(format!("{}", halves).contains("100.00 ms vs 900.50 ms"));

    let excessive = ShiftError::ExcessiveShift { shift: 6000.0, max: 5000 };
    assert!(format!("{}", excessive).contains("(5000 ms)"));

    let load_failed = ShiftError::LoadFailed("no [Events] section".to_string());
    assert!(format!("{}", load_failed).ends_with("no [Events] section"));
}

#[test]
fn test_appError_conversions_shouldPickMatchingVariant() {
    let from_io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(from_io, AppError::File(_)));

    let from_anyhow: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(from_anyhow, AppError::Unknown(ref message) if message == "boom"));

    let from_shift: AppError = ShiftError::NoData.into();
    assert!(format!("{}", from_shift).starts_with("Shift error:"));

    let from_match: AppError = MatchError::SourceNotFound("french".to_string()).into();
    assert!(matches!(from_match, AppError::Match(MatchError::SourceNotFound(_))));
}
