/*!
 * # subrecut - film subtitle re-cutting
 *
 * A Rust library that rebuilds subtitles for a film edited together from
 * several episodes, reusing the episode subtitles of any language.
 *
 * ## Features
 *
 * - Find, for every film line, the episode and time range it was taken from
 * - Tolerate missing lines, merged or split lines and timing drift
 * - Re-cut and re-time subtitles of another language with the same ranges
 * - Export episode cut lists
 * - Estimate and apply a constant shift between two subtitle tracks
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: ASS/SRT reading and ASS writing
 * - `matching`: Text similarity, timecode finder, cut merging, shift estimation
 *   and pairwise synchronization
 * - `loader`: Episode file loading and style harmonization
 * - `builder`: Re-cut subtitle assembly
 * - `report`: Stats table
 * - `log_sink`: Per-worker logging handle
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod builder;
pub mod errors;
pub mod file_utils;
pub mod loader;
pub mod log_sink;
pub mod matching;
pub mod report;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use builder::SubtitleBuilder;
pub use errors::{AppError, MatchError, ShiftError, SubtitleError};
pub use matching::{Cut, Stats, Timecode, TimecodeFinder};
pub use subtitle_processor::{SubtitleEvent, SubtitleFile};
