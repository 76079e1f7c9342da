/*!
 * Integration tests for folder synchronization
 */

use anyhow::Result;
use subrecut::app_config::Config;
use subrecut::app_controller::Controller;
use subrecut::errors::ShiftError;
use subrecut::matching::sync::BACKUP_FOLDER;
use subrecut::subtitle_processor::SubtitleFile;
use crate::common::{self, EPISODE_1_LINES, EPISODE_2_LINES};

fn all_lines() -> Vec<&'static str> {
    EPISODE_1_LINES.iter().chain(EPISODE_2_LINES.iter()).copied().collect()
}

/// Reference and target folders; `Ep 01` is 1.5 s late in the target, `Ep 02` is too short to sync
fn sync_folders(temp_dir: &std::path::Path) -> Result<()> {
    let reference = temp_dir.join("reference");
    let target = temp_dir.join("target");
    std::fs::create_dir_all(&reference)?;
    std::fs::create_dir_all(&target)?;

    common::create_ass_file(&reference, "Ep 01.ass", common::events_from_lines(&all_lines(), 0))?;
    common::create_ass_file(&target, "Ep 01.ass", common::events_from_lines(&all_lines(), 1_500))?;
    common::create_ass_file(&reference, "Ep 02.ass", common::events_from_lines(&EPISODE_2_LINES[..5], 0))?;
    common::create_ass_file(&target, "Ep 02.ass", common::events_from_lines(&EPISODE_2_LINES[..5], 700))?;
    Ok(())
}

#[test]
fn test_runSync_withoutApply_shouldReportShiftsAndLeaveFilesAlone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    sync_folders(temp_dir.path())?;
    let controller = Controller::with_config(Config::default())?.without_progress();

    let results = controller.run_sync(&temp_dir.path().join("reference"), &temp_dir.path().join("target"), false)?;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].pairs, 16);
    assert_eq!(results[0].shift_ms(), -1_500);
    assert!(matches!(
        results[1].outcome,
        Err(ShiftError::InsufficientData { inliers: 5, required: 10 })
    ));
    assert_eq!(results[1].shift_ms(), 0);
    assert!(!temp_dir.path().join("target").join(BACKUP_FOLDER).exists());
    Ok(())
}

#[test]
fn test_runSync_withApply_shouldShiftTargetAndKeepBackup() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    sync_folders(temp_dir.path())?;
    let target = temp_dir.path().join("target");
    let controller = Controller::with_config(Config::default())?.without_progress();

    controller.run_sync(&temp_dir.path().join("reference"), &target, true)?;

    let synced = SubtitleFile::load(target.join("Ep 01.ass"))?;
    let reference = SubtitleFile::load(temp_dir.path().join("reference").join("Ep 01.ass"))?;
    assert_eq!(synced.events, reference.events);

    let backup = SubtitleFile::load(target.join(BACKUP_FOLDER).join("Ep 01.ass"))?;
    assert_eq!(backup.events[0].start_ms, 1_500);

    let untouched = SubtitleFile::load(target.join("Ep 02.ass"))?;
    assert_eq!(untouched.events[0].start_ms, 700);
    assert!(!target.join(BACKUP_FOLDER).join("Ep 02.ass").exists());
    Ok(())
}

#[test]
fn test_runSync_withFileCountMismatch_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    sync_folders(temp_dir.path())?;
    common::create_ass_file(&temp_dir.path().join("target"), "Ep 03.ass", Vec::new())?;
    let controller = Controller::with_config(Config::default())?.without_progress();

    let result = controller.run_sync(&temp_dir.path().join("reference"), &temp_dir.path().join("target"), false);

    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_runSync_withUnreadableTarget_shouldReportPairAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    sync_folders(temp_dir.path())?;
    common::create_ass_file(&temp_dir.path().join("reference"), "Ep 03.ass", common::events_from_lines(&all_lines(), 0))?;
    common::create_test_file(&temp_dir.path().join("target"), "Ep 03.ass", "[Script Info]\nTitle: broken\n")?;
    let controller = Controller::with_config(Config::default())?.without_progress();

    let results = controller.run_sync(&temp_dir.path().join("reference"), &temp_dir.path().join("target"), true)?;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].shift_ms(), -1_500);
    assert!(matches!(results[2].outcome, Err(ShiftError::LoadFailed(_))));
    assert_eq!(results[2].pairs, 0);
    assert!(temp_dir.path().join("target").join(BACKUP_FOLDER).join("Ep 01.ass").exists());
    Ok(())
}
