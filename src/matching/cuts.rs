use anyhow::Result;
use std::path::Path;

use crate::file_utils::FileManager;
use crate::matching::models::{Cut, Timecode};

// @module: Cut list building and export

/// Turn timecodes into film-ordered cuts, merging same-episode neighbours
/// separated by less than `threshold_ms`
pub fn merge_cuts(timecodes: &[Timecode], threshold_ms: i64) -> Vec<Cut> {
    merge_cut_list(timecodes.iter().map(Cut::from).collect(), threshold_ms)
}

/// Merge an existing cut list; applying it twice gives the same list
pub fn merge_cut_list(mut cuts: Vec<Cut>, threshold_ms: i64) -> Vec<Cut> {
    cuts.sort_by_key(|cut| cut.target_time_ms);

    for i in (1..cuts.len()).rev() {
        let (before, after) = cuts.split_at_mut(i);
        let previous = &mut before[i - 1];
        let current = &after[0];

        if current.episode_number == previous.episode_number
            && (current.episode_start_ms - previous.episode_end_ms).abs() < threshold_ms
        {
            previous.episode_end_ms = current.episode_end_ms;
            cuts.remove(i);
        }
    }

    cuts
}

/// One line per cut: `HH:MM:SS - ep N (MM:SS - MM:SS)`
pub fn cut_list_text(cuts: &[Cut]) -> String {
    cuts.iter().map(|cut| format!("{}\n", cut)).collect()
}

pub fn write_cut_list<P: AsRef<Path>>(path: P, cuts: &[Cut]) -> Result<()> {
    FileManager::write_to_file(path, &cut_list_text(cuts))
}
