/*!
 * Subtitle matching.
 *
 * - `similarity`: normalization, line similarity and the pairwise `TextMatcher`
 * - `finder`: the film/episode timecode finder
 * - `cuts`: merging timecodes into an episode cut list
 * - `shift`: robust constant-shift estimation
 * - `sync`: pairwise track synchronization built on the estimator
 */

pub mod cuts;
pub mod finder;
pub mod models;
pub mod shift;
pub mod similarity;
pub mod sync;

pub use cuts::{merge_cut_list, merge_cuts};
pub use finder::TimecodeFinder;
pub use models::{Cut, MatchCandidate, Stats, Timecode};
pub use shift::{ShiftEstimate, ShiftEstimator};
pub use similarity::{is_emphasis_only, similarity, TextMatcher};
pub use sync::{apply_shift, SubtitleSync, SyncResult};
