use std::fmt;

use crate::subtitle_processor::{SubtitleEvent, SubtitleFile};

// @module: Matching results: timecodes, cuts and per-film statistics

/// A run of episode lines found in the film.
///
/// `start_ms..end_ms` is in episode time; adding `shift_ms` gives film time.
#[derive(Debug, Clone, PartialEq)]
pub struct Timecode {
    pub start_ms: i64,
    pub end_ms: i64,
    pub shift_ms: i64,

    // @field: File name of the episode subtitles the run was found in
    pub source_file: String,

    pub episode_number: Option<u32>,
}

impl Timecode {
    pub fn new(start_ms: i64, end_ms: i64, shift_ms: i64, source: &SubtitleFile) -> Self {
        Timecode {
            start_ms,
            end_ms: end_ms.max(start_ms),
            shift_ms,
            source_file: source.file_name(),
            episode_number: source.episode_number,
        }
    }

    /// Position of the run start in the film
    pub fn target_time_ms(&self) -> i64 {
        self.start_ms + self.shift_ms
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - {}: {} (shift {} ms)",
            SubtitleEvent::format_timestamp(self.start_ms),
            SubtitleEvent::format_timestamp(self.end_ms),
            self.source_file,
            self.shift_ms
        )
    }
}

/// Episode range to cut, positioned on the film timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub target_time_ms: i64,
    pub episode_start_ms: i64,
    pub episode_end_ms: i64,
    pub episode_number: Option<u32>,

    // @field: Episode file name without extension
    pub label: String,
}

impl From<&Timecode> for Cut {
    fn from(timecode: &Timecode) -> Self {
        let label = timecode
            .source_file
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_string())
            .unwrap_or_else(|| timecode.source_file.clone());

        Cut {
            target_time_ms: timecode.target_time_ms(),
            episode_start_ms: timecode.start_ms,
            episode_end_ms: timecode.end_ms,
            episode_number: timecode.episode_number,
            label,
        }
    }
}

impl Cut {
    pub fn length_ms(&self) -> i64 {
        self.episode_end_ms - self.episode_start_ms
    }
}

fn hh_mm_ss(ms: i64) -> String {
    let seconds = ms.max(0) / 1_000;
    format!("{:02}:{:02}:{:02}", seconds / 3_600, (seconds % 3_600) / 60, seconds % 60)
}

fn mm_ss(ms: i64) -> String {
    let seconds = ms.max(0) / 1_000;
    format!("{:02}:{:02}", (seconds % 3_600) / 60, seconds % 60)
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let episode = self
            .episode_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} - ep {} ({} - {})",
            hh_mm_ss(self.target_time_ms),
            episode,
            mm_ss(self.episode_start_ms),
            mm_ss(self.episode_end_ms)
        )
    }
}

/// Outcome of matching one film
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stats {
    // @field: Film label (number or file name)
    pub film: String,

    pub found: usize,
    pub not_found: usize,

    // @field: Film line count, -1 when the episode subtitles were missing
    pub total: i64,

    // @field: Text of every unmatched film line, in film order
    pub subs_not_found: Vec<String>,
}

impl Stats {
    pub fn new(film: impl Into<String>, total: usize) -> Self {
        Stats {
            film: film.into(),
            total: total as i64,
            ..Default::default()
        }
    }

    /// Result for a film whose episode subtitles could not be found
    pub fn missing_sources(film: impl Into<String>) -> Self {
        Stats {
            film: film.into(),
            total: -1,
            ..Default::default()
        }
    }

    pub fn is_missing_sources(&self) -> bool {
        self.total < 0
    }

    /// Percentage of film lines found, 0 when there is nothing to find
    pub fn quality(&self) -> f64 {
        if self.total <= 0 {
            0.0
        } else {
            self.found as f64 / self.total as f64 * 100.0
        }
    }

    pub fn record_not_found(&mut self, text: &str) {
        self.not_found += 1;
        self.subs_not_found.push(text.to_string());
    }

    /// The `count` longest unmatched lines
    pub fn longest_not_found(&self, count: usize) -> Vec<&str> {
        let mut lines: Vec<&str> = self.subs_not_found.iter().map(String::as_str).collect();
        lines.sort_by_key(|line| std::cmp::Reverse(line.chars().count()));
        lines.truncate(count);
        lines
    }

    /// Numeric film label for ordering reports
    pub fn film_number(&self) -> Option<u32> {
        self.film.parse().ok()
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} : {}/{} found", self.film, self.found, self.total)
    }
}

/// Best fallback seen while scanning the episodes for one film line
#[derive(Debug, Clone, Copy)]
pub enum MatchCandidate<'a> {
    None,

    /// One episode line close to the film line
    Single {
        event: &'a SubtitleEvent,
        score: f64,
        source: &'a SubtitleFile,
    },

    /// Two consecutive lines on one side matching a single line on the other.
    /// `consumes_two` is set when the two lines are film lines.
    Combine {
        event: &'a SubtitleEvent,
        score: f64,
        source: &'a SubtitleFile,
        end_ms: i64,
        consumes_two: bool,
    },
}

impl<'a> MatchCandidate<'a> {
    pub fn score(&self) -> f64 {
        match self {
            MatchCandidate::None => -1.0,
            MatchCandidate::Single { score, .. } | MatchCandidate::Combine { score, .. } => *score,
        }
    }

    /// Replace with `candidate` when it scores strictly higher
    pub fn offer(&mut self, candidate: MatchCandidate<'a>) {
        if candidate.score() > self.score() {
            *self = candidate;
        }
    }
}
