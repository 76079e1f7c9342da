/*!
 * Timecode finder.
 *
 * Walks the film subtitles line by line and, for each line, scans the episode
 * subtitles for the start of an aligned run: a line similar enough whose next
 * few neighbours are similar too. A confirmed run is extended greedily as long
 * as the pairs keep the run's time shift, and is emitted as one `Timecode`.
 * Lines without a run fall back to an isolated near-identical match, then to a
 * two-lines-in-one match, and are otherwise recorded as not found.
 */

use indicatif::ProgressBar;

use crate::app_config::MatcherConfig;
use crate::log_sink::LogSink;
use crate::matching::models::{MatchCandidate, Stats, Timecode};
use crate::matching::similarity::{is_emphasis_only, normalize, quick_ratio};
use crate::subtitle_processor::{SubtitleEvent, SubtitleFile};

/// Film line left unmatched just before the current position.
///
/// A run starting right after it may take the episode line preceding the run
/// as its real start.
#[derive(Debug, Default)]
struct Lookback {
    film_index: Option<usize>,
}

impl Lookback {
    fn remember(&mut self, film_index: usize) {
        self.film_index = Some(film_index);
    }

    fn clear(&mut self) {
        self.film_index = None;
    }

    fn take(&mut self) -> Option<usize> {
        self.film_index.take()
    }
}

/// Episode subtitles with their normalized lines
struct Episode<'a> {
    file: &'a SubtitleFile,
    keys: Vec<String>,

    // @field: Normalized lines without `\N`, joined pairwise by the combine hypotheses
    join_keys: Vec<String>,
}

pub struct TimecodeFinder<'a> {
    film: &'a [SubtitleEvent],
    film_keys: Vec<String>,
    film_join_keys: Vec<String>,
    episodes: Vec<Episode<'a>>,
    config: &'a MatcherConfig,
    sink: LogSink,
    progress: ProgressBar,
}

impl<'a> TimecodeFinder<'a> {
    /// `film` and each episode's events must be sorted by start time
    pub fn new(film: &'a [SubtitleEvent], episodes: &'a [SubtitleFile], config: &'a MatcherConfig) -> Self {
        let film_keys = film.iter().map(|event| normalize(&event.text)).collect();
        let film_join_keys = film.iter().map(|event| join_key(&event.text)).collect();
        let episodes = episodes
            .iter()
            .map(|file| Episode {
                file,
                keys: file.events.iter().map(|event| normalize(&event.text)).collect(),
                join_keys: file.events.iter().map(|event| join_key(&event.text)).collect(),
            })
            .collect();

        TimecodeFinder {
            film,
            film_keys,
            film_join_keys,
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

    /// Progress bar advanced once per film line
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Match every film line; `film_label` names the film in the returned stats
    pub fn find_timecodes(&self, film_label: &str) -> (Vec<Timecode>, Stats) {
        let mut timecodes = Vec::new();
        let mut stats = Stats::new(film_label, self.film.len());
        let mut lookback = Lookback::default();

        self.progress.set_length(self.film.len() as u64);
        self.sink.info(format_args!("Finding timecodes for {} film lines", self.film.len()));

        let mut i = 0;
        while i < self.film.len() {
            let line = &self.film[i];
            self.sink.debug(format_args!("Looking for: {}", line.text));

            let mut best_single = MatchCandidate::None;
            let mut best_combine = MatchCandidate::None;
            let mut run = None;

            'episodes: for episode in &self.episodes {
                let file: &'a SubtitleFile = episode.file;
                let events: &'a [SubtitleEvent] = &file.events;

                for j in 0..events.len() {
                    let score = quick_ratio(&self.film_keys[i], &episode.keys[j]);

                    if self.config.combine_gate.is_some_and(|gate| score > gate) {
                        best_combine.offer(self.combine_candidate(i, j, episode));
                    }

                    if score > self.config.required_similarity {
                        best_single.offer(MatchCandidate::Single {
                            event: &events[j],
                            score,
                            source: file,
                        });

                        if self.window_similarity(i, j, episode) > self.config.window_similarity {
                            run = Some(self.extend_run(i, j, episode, &mut stats, &mut lookback));
                            break 'episodes;
                        }
                    }
                }
            }

            match run {
                Some((timecode, next_i)) => {
                    timecodes.push(timecode);
                    i = next_i;
                }
                None => {
                    i += self.handle_no_match(i, best_single, best_combine, &mut timecodes, &mut stats, &mut lookback);
                }
            }
        }

        self.progress.finish_and_clear();
        self.sink.info(format_args!(
            "{} timecodes, {}/{} lines found",
            timecodes.len(),
            stats.found,
            stats.total
        ));

        (timecodes, stats)
    }

    /// Best of "film line vs two episode lines" and "two film lines vs episode line".
    /// Equal scores keep the episode-side hypothesis.
    fn combine_candidate(&self, i: usize, j: usize, episode: &Episode<'a>) -> MatchCandidate<'a> {
        let file = episode.file;
        let events = &file.events;
        let film_keys = &self.film_join_keys;
        let episode_keys = &episode.join_keys;

        let extra_source = (j + 1 < events.len()).then(|| {
            let score = combined_similarity(&film_keys[i], &[&episode_keys[j], &episode_keys[j + 1]]);
            (score, events[j + 1].end_ms)
        });
        let extra_film = (i + 1 < film_keys.len()).then(|| {
            let score = combined_similarity(&episode_keys[j], &[&film_keys[i], &film_keys[i + 1]]);
            (score, events[j].end_ms)
        });

        let source_score = extra_source.map_or(0.0, |(score, _)| score);
        let film_score = extra_film.map_or(0.0, |(score, _)| score);

        let (score, end_ms, consumes_two) = match (extra_source, extra_film) {
            (Some((_, end_ms)), _) if source_score >= film_score => (source_score, end_ms, false),
            (_, Some((_, end_ms))) => (film_score, end_ms, true),
            _ => return MatchCandidate::None,
        };

        if score > self.config.combine_similarity {
            MatchCandidate::Combine {
                event: &events[j],
                score,
                source: file,
                end_ms,
                consumes_two,
            }
        } else {
            MatchCandidate::None
        }
    }

    /// Average similarity of the next aligned pairs starting at `(i, j)`.
    ///
    /// An emphasis-only episode line scoring below the floor is skipped: it
    /// leaves the average and the film line it was paired with is compared
    /// with the following episode line instead.
    fn window_similarity(&self, i: usize, j: usize, episode: &Episode) -> f64 {
        let events = &episode.file.events;
        let pairs = self
            .config
            .lookahead
            .min(self.film.len() - i)
            .min(events.len() - j);

        let mut counted = pairs;
        let mut skipped = 0;
        let mut total = 0.0;

        for k in 0..pairs {
            let film_index = i + k - skipped;
            let score = quick_ratio(&self.film_keys[film_index], &episode.keys[j + k]);

            if score < self.config.emphasis_floor && is_emphasis_only(&events[j + k].text) {
                counted -= 1;
                skipped += 1;
                continue;
            }
            total += score;
        }

        total / counted.max(1) as f64
    }

    fn within_tolerance(&self, film_event: &SubtitleEvent, episode_event: &SubtitleEvent, shift_ms: i64) -> bool {
        (film_event.midpoint_ms() - episode_event.midpoint_ms() - shift_ms).abs() < self.config.shift_tolerance_ms
    }

    /// Extend a confirmed run from `(i, j)`; returns its timecode and the next film index
    fn extend_run(
        &self,
        i: usize,
        j: usize,
        episode: &Episode<'a>,
        stats: &mut Stats,
        lookback: &mut Lookback,
    ) -> (Timecode, usize) {
        let events = &episode.file.events;
        let shift_ms = self.film[i].midpoint_ms() - events[j].midpoint_ms();

        let mut start = j;
        if let Some(previous) = lookback.take() {
            if j > 0 {
                let before = &events[j - 1];
                let close_text = quick_ratio(&self.film_keys[previous], &episode.keys[j - 1])
                    > self.config.lookback_similarity;
                if close_text || self.within_tolerance(&self.film[previous], before, shift_ms) {
                    self.sink.debug(format_args!("Previous line absorbed into run: {}", before.text));
                    start = j - 1;
                }
            }
        }

        let (mut fi, mut ej) = (i, j);
        let mut shift_only_matches = 0;

        while fi < self.film.len() && ej < events.len() {
            let film_event = &self.film[fi];
            let episode_event = &events[ej];

            if !self.within_tolerance(film_event, episode_event, shift_ms) {
                break;
            }

            if quick_ratio(&self.film_keys[fi], &episode.keys[ej]) > self.config.required_similarity {
                self.sink.info(format_args!(
                    "Found in {} at {}: \"{}\"",
                    episode.file.file_name(),
                    SubtitleEvent::format_timestamp(episode_event.start_ms),
                    film_event.text
                ));
            } else if shift_only_matches < self.config.max_shift_only_matches {
                shift_only_matches += 1;
            } else {
                break;
            }

            stats.found += 1;
            self.progress.inc(1);
            fi += 1;
            ej += 1;
        }

        let end = ej.saturating_sub(1).max(start);
        let timecode = Timecode::new(events[start].start_ms, events[end].end_ms, shift_ms, episode.file);
        (timecode, fi.max(i + 1))
    }

    /// Fallbacks for a line with no run; returns how many film lines were consumed
    fn handle_no_match(
        &self,
        i: usize,
        best_single: MatchCandidate<'a>,
        best_combine: MatchCandidate<'a>,
        timecodes: &mut Vec<Timecode>,
        stats: &mut Stats,
        lookback: &mut Lookback,
    ) -> usize {
        let line = &self.film[i];
        self.progress.inc(1);

        if let MatchCandidate::Single { event, score, source } = best_single {
            if score >= self.config.single_line_similarity {
                self.sink.info(format_args!(
                    "Single line found \"{}\" in {} at {}",
                    line.text,
                    source.file_name(),
                    SubtitleEvent::format_timestamp(event.start_ms)
                ));
                timecodes.push(Timecode::new(event.start_ms, event.end_ms, line.start_ms - event.start_ms, source));
                stats.found += 1;
                lookback.clear();
                return 1;
            }
        }

        if let MatchCandidate::Combine { event, score, source, end_ms, consumes_two } = best_combine {
            if score > self.config.combine_similarity {
                self.sink.info(format_args!(
                    "Combined lines found \"{}\" in {} at {}",
                    line.text,
                    source.file_name(),
                    SubtitleEvent::format_timestamp(event.start_ms)
                ));
                timecodes.push(Timecode::new(event.start_ms, end_ms, line.start_ms - event.start_ms, source));
                stats.found += 1;
                lookback.clear();

                if consumes_two {
                    stats.found += 1;
                    self.progress.inc(1);
                    return 2;
                }
                return 1;
            }
        }

        self.sink.warn(format_args!("Line not found: \"{}\"", line.text));
        stats.record_not_found(&line.text);
        lookback.remember(i);
        1
    }
}

/// Normalized line with its `\N` breaks removed
fn join_key(text: &str) -> String {
    normalize(&text.replace("\\N", ""))
}

/// Similarity of a join key with the concatenation of other join keys
fn combined_similarity(key: &str, parts: &[&str]) -> f64 {
    quick_ratio(key, &parts.concat())
}
