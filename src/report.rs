use std::fmt::Write as _;

use crate::matching::Stats;

// @module: Stats report printed after a batch

const MISSING_SOURCES_TEXT: &str = "Episode subtitle files not found, check paths in config file";
const RESET: &str = "\x1B[0m";

/// Rows whose line of missing texts is listed
fn needs_hints(stats: &Stats) -> bool {
    stats.not_found > 12 || stats.quality() < 99.0
}

/// RGB colour of a quality: red below 90 %, then a red to green gradient
pub fn quality_color(quality: f64) -> (u8, u8, u8) {
    if quality < 90.0 {
        return (255, 0, 0);
    }
    let ratio = ((quality - 90.0) / 10.0).clamp(0.0, 1.0);
    ((255.0 * (1.0 - ratio)) as u8, (255.0 * ratio) as u8, 0)
}

fn paint(text: &str, (r, g, b): (u8, u8, u8), colored: bool) -> String {
    if colored {
        format!("\x1B[1;38;2;{};{};{}m{}{}", r, g, b, text, RESET)
    } else {
        text.to_string()
    }
}

/// Render the stats table, ordered by film number.
///
/// Rows with many missing lines, or quality below 99 %, list the three
/// longest missing lines (all of them with `print_all`) so the missing
/// episode file can be searched for.
pub fn format_stats_report(results: &[Stats], print_all: bool, colored: bool) -> String {
    let mut rows: Vec<&Stats> = results.iter().collect();
    rows.sort_by(|a, b| {
        a.film_number()
            .unwrap_or(u32::MAX)
            .cmp(&b.film_number().unwrap_or(u32::MAX))
            .then_with(|| a.film.cmp(&b.film))
    });

    let mut out = String::new();
    let _ = writeln!(out, "Stats of translation");
    let _ = writeln!(out, "{:<12} {:>9} {:>10}  {}", "Film", "To find", "Not found", "Quality");

    for stats in rows {
        if stats.is_missing_sources() {
            let _ = writeln!(
                out,
                "{:<12} {:>9} {:>10}  {}",
                stats.film,
                "-",
                "-",
                paint(MISSING_SOURCES_TEXT, (255, 0, 0), colored)
            );
            continue;
        }

        let quality = format!("{:.3}%", stats.quality());
        let _ = writeln!(
            out,
            "{:<12} {:>9} {:>10}  {}",
            stats.film,
            stats.total,
            stats.not_found,
            paint(&quality, quality_color(stats.quality()), colored)
        );

        if needs_hints(stats) && !stats.subs_not_found.is_empty() {
            let hints: Vec<&str> = if print_all {
                stats.subs_not_found.iter().map(String::as_str).collect()
            } else {
                stats.longest_not_found(3)
            };
            let _ = writeln!(out, "{:<12} use this text to find the missing file:", "");
            for hint in hints {
                let _ = writeln!(out, "{:<12}   {}", "", hint);
            }
        }
    }

    out
}

pub fn print_stats(results: &[Stats], print_all: bool) {
    println!("\n{}", format_stats_report(results, print_all, true));
}
