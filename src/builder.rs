/*!
 * Re-cut subtitle builder.
 *
 * Applies the timecodes found for a film to the episode subtitles of another
 * language: each timecode selects a slice of one episode, the slice is clipped
 * to the timecode bounds and moved by its shift. The assembled track is then
 * deduplicated, sorted and given the styles of one of the episode files.
 */

use indicatif::ProgressBar;
use std::path::PathBuf;

use crate::app_config::BuilderConfig;
use crate::log_sink::LogSink;
use crate::matching::Timecode;
use crate::subtitle_processor::{SubtitleEvent, SubtitleFile};

/// Style values applied when the template file declares no resolution
const DEFAULT_1080_STYLE: [(&str, &str); 7] = [
    ("Fontname", "Arial"),
    ("Fontsize", "60"),
    ("Outline", "3"),
    ("Shadow", "2"),
    ("MarginL", "70"),
    ("MarginR", "70"),
    ("MarginV", "70"),
];

pub struct SubtitleBuilder<'a> {
    episodes: &'a [SubtitleFile],
    config: &'a BuilderConfig,
    sink: LogSink,
    progress: ProgressBar,
}

impl<'a> SubtitleBuilder<'a> {
    /// `episodes` are the subtitles to re-cut, one file per episode
    pub fn new(episodes: &'a [SubtitleFile], config: &'a BuilderConfig) -> Self {
        Self {
            episodes,
            config,
            sink: LogSink::silent(),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    /// Progress bar advanced once per timecode
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Assemble the re-cut track that will be saved at `output_path`
    pub fn build(&self, timecodes: &[Timecode], output_path: PathBuf) -> SubtitleFile {
        self.progress.set_length(timecodes.len() as u64);
        let mut events = Vec::new();

        for timecode in timecodes {
            self.progress.inc(1);

            let episode = self
                .episodes
                .iter()
                .find(|file| file.episode_number == timecode.episode_number);
            let Some(episode) = episode else {
                self.sink.error(format_args!(
                    "No subtitle file found for episode {:?}, timecode {} skipped",
                    timecode.episode_number, timecode
                ));
                continue;
            };

            self.sink.debug(format_args!("Timecode {} applied to {}", timecode, episode.file_name()));
            events.extend(cut_events(episode, timecode));
        }

        let removed = remove_duplicates(&mut events, self.config.min_duration_ms);
        self.sink.info(format_args!("{} duplicate or too short lines removed", removed));
        events.sort_by_key(|event| event.start_ms);

        let mut output = SubtitleFile::from_events(output_path, events);
        self.apply_template(&mut output);
        output.remove_unused_styles();

        self.progress.finish_and_clear();
        output
    }

    /// Last episode file if it declares `PlayResY`, else the first one
    fn template(&self) -> Option<&'a SubtitleFile> {
        match self.episodes.last() {
            Some(last) if last.info("PlayResY").is_some() => Some(last),
            _ => self.episodes.first(),
        }
    }

    fn apply_template(&self, output: &mut SubtitleFile) {
        let Some(template) = self.template() else {
            apply_default_1080_layout(output);
            return;
        };

        output.style_format = template.style_format.clone();
        output.styles = template.styles.clone();

        match (template.info("PlayResX"), template.info("PlayResY")) {
            (Some(x), Some(y)) => {
                output.set_info("PlayResX", x);
                output.set_info("PlayResY", y);
            }
            _ => apply_default_1080_layout(output),
        }
    }
}

/// The part of `episode` covered by `timecode`, clipped and moved to film time
pub fn cut_events(episode: &SubtitleFile, timecode: &Timecode) -> Vec<SubtitleEvent> {
    let mut result = Vec::new();

    for event in &episode.events {
        let mut event = event.clone();

        if event.end_ms > timecode.end_ms {
            if event.start_ms < timecode.end_ms {
                event.end_ms = timecode.end_ms;
                event.shift_by(timecode.shift_ms);
                result.push(event);
            }
            break;
        }

        if event.end_ms >= timecode.start_ms {
            event.start_ms = event.start_ms.max(timecode.start_ms);
            event.shift_by(timecode.shift_ms);
            result.push(event);
        }
    }

    result
}

/// Remove repeated lines; returns how many were dropped.
///
/// Consecutive lines in (text, start, end) order that are identical collapse
/// to one; overlapping lines with the same text keep the longer one; any line
/// shorter than `min_duration_ms` is dropped.
pub fn remove_duplicates(events: &mut Vec<SubtitleEvent>, min_duration_ms: i64) -> usize {
    events.sort_by(|a, b| {
        a.text
            .cmp(&b.text)
            .then(a.start_ms.cmp(&b.start_ms))
            .then(a.end_ms.cmp(&b.end_ms))
    });

    let mut removed = vec![false; events.len()];

    for i in 0..events.len().saturating_sub(1) {
        let current = &events[i];
        let next = &events[i + 1];

        if current.text == next.text && current.start_ms == next.start_ms && current.end_ms == next.end_ms {
            removed[i + 1] = true;
            continue;
        }

        if current.text == next.text {
            let overlapping = (current.start_ms <= next.start_ms && next.start_ms < current.end_ms)
                || (next.start_ms <= current.start_ms && current.start_ms < next.end_ms);
            if overlapping {
                if current.duration_ms() >= next.duration_ms() {
                    removed[i + 1] = true;
                } else {
                    removed[i] = true;
                }
                continue;
            }
        }
    }

    for (flag, event) in removed.iter_mut().zip(events.iter()) {
        if event.duration_ms() < min_duration_ms {
            *flag = true;
        }
    }

    let before = events.len();
    let mut flags = removed.into_iter();
    events.retain(|_| !flags.next().unwrap_or(false));
    before - events.len()
}

/// 1920×1080 resolution and a readable style set
pub fn apply_default_1080_layout(file: &mut SubtitleFile) {
    file.set_info("PlayResX", "1920");
    file.set_info("PlayResY", "1080");

    for style in &mut file.styles {
        for (field, value) in DEFAULT_1080_STYLE {
            style.set(field, value);
        }
    }
}
