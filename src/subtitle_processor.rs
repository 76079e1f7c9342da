use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};
use crate::errors::SubtitleError;
use crate::file_utils;

// @module: Subtitle script model, ASS/SRT reading and ASS writing

// @const: SRT timestamp regex
static SRT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: ASS timestamp regex (H:MM:SS.cc)
static ASS_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+):(\d{1,2}):(\d{1,2})(?:[.,](\d{1,3}))?\s*$").unwrap()
});

/// Style format written when a script does not declare one
pub const DEFAULT_STYLE_FORMAT: [&str; 23] = [
    "Name", "Fontname", "Fontsize", "PrimaryColour", "SecondaryColour", "OutlineColour",
    "BackColour", "Bold", "Italic", "Underline", "StrikeOut", "ScaleX", "ScaleY", "Spacing",
    "Angle", "BorderStyle", "Outline", "Shadow", "Alignment", "MarginL", "MarginR", "MarginV",
    "Encoding",
];

const DEFAULT_STYLE_VALUES: [&str; 22] = [
    "Arial", "20", "&H00FFFFFF", "&H000000FF", "&H00000000", "&H00000000", "0", "0", "0", "0",
    "100", "100", "0", "0", "1", "2", "2", "2", "10", "10", "10", "1",
];

const EVENT_FORMAT: &str = "Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Name of the style given to events that come without one
pub const DEFAULT_STYLE_NAME: &str = "Default";

/// Round a millisecond value to the nearest 10 ms.
///
/// A last digit above 4 rounds up, anything else rounds down. Negative values
/// use the floored remainder so the rule stays the same on both sides of zero.
pub fn round_to_ten_ms(ms: i64) -> i64 {
    let last_digit = ms.rem_euclid(10);
    if last_digit > 4 {
        ms - last_digit + 10
    } else {
        ms - last_digit
    }
}

/// Midpoint of a time range, floored
pub fn midpoint_ms(start_ms: i64, end_ms: i64) -> i64 {
    start_ms + (end_ms - start_ms).div_euclid(2)
}

// @struct: Single subtitle event (one Dialogue or Comment line)
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEvent {
    // @field: Start time in ms
    pub start_ms: i64,

    // @field: End time in ms
    pub end_ms: i64,

    // @field: Raw text, override tags included
    pub text: String,

    // @field: Style name
    pub style: String,

    pub layer: i32,
    pub name: String,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub effect: String,

    // @field: Written as `Comment:` instead of `Dialogue:`
    pub is_comment: bool,
}

impl SubtitleEvent {
    /// Creates a dialogue event with the default style
    pub fn new(start_ms: i64, end_ms: i64, text: impl Into<String>) -> Self {
        SubtitleEvent {
            start_ms,
            end_ms,
            text: text.into(),
            style: DEFAULT_STYLE_NAME.to_string(),
            layer: 0,
            name: String::new(),
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            effect: String::new(),
            is_comment: false,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Midpoint of the event, used for shift computations
    pub fn midpoint_ms(&self) -> i64 {
        midpoint_ms(self.start_ms, self.end_ms)
    }

    /// Move both ends by `shift_ms` and round them to 10 ms
    pub fn shift_by(&mut self, shift_ms: i64) {
        self.start_ms = round_to_ten_ms(self.start_ms + shift_ms);
        self.end_ms = round_to_ten_ms(self.end_ms + shift_ms);
    }

    /// Parse an ASS timestamp (`H:MM:SS.cc`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<i64, SubtitleError> {
        let caps = ASS_TIMESTAMP_REGEX
            .captures(timestamp)
            .ok_or_else(|| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;

        let number = |idx: usize| -> Result<i64, SubtitleError> {
            caps.get(idx)
                .map_or(Ok(0), |m| m.as_str().parse::<i64>())
                .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))
        };

        let hours = number(1)?;
        let minutes = number(2)?;
        let seconds = number(3)?;
        let fraction = match caps.get(4) {
            Some(m) => {
                let digits = m.as_str();
                let value: i64 = digits
                    .parse()
                    .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;
                match digits.len() {
                    1 => value * 100,
                    2 => value * 10,
                    _ => value,
                }
            }
            None => 0,
        };

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + fraction)
    }

    /// Format milliseconds as an ASS timestamp, negative values clamp to zero
    pub fn format_timestamp(ms: i64) -> String {
        let ms = ms.max(0);
        let centis = (ms + 5) / 10;
        let hours = centis / 360_000;
        let minutes = (centis % 360_000) / 6_000;
        let seconds = (centis % 6_000) / 100;
        let cs = centis % 100;

        format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, cs)
    }
}

impl fmt::Display for SubtitleEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = if self.is_comment { "Comment" } else { "Dialogue" };
        write!(
            f,
            "{}: {},{},{},{},{},{},{},{},{},{}",
            kind,
            self.layer,
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms),
            self.style,
            self.name,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.effect,
            self.text
        )
    }
}

/// A named style, values keyed by the script's style format fields
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStyle {
    pub name: String,
    /// (field, value) pairs, `Name` excluded
    pub values: Vec<(String, String)>,
}

impl SubtitleStyle {
    /// Style carrying the stock ASS defaults
    pub fn default_named(name: impl Into<String>) -> Self {
        let values = DEFAULT_STYLE_FORMAT[1..]
            .iter()
            .zip(DEFAULT_STYLE_VALUES.iter())
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();
        SubtitleStyle { name: name.into(), values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, value)| value.as_str())
    }

    /// Set a field, appending it when the style does not have it yet
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match self.values.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(field)) {
            Some(entry) => entry.1 = value,
            None => self.values.push((field.to_string(), value)),
        }
    }

    /// Parameters equal, name ignored
    pub fn same_parameters(&self, other: &SubtitleStyle) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }

    fn to_line(&self, format: &[String]) -> String {
        let fields: Vec<&str> = format
            .iter()
            .map(|field| {
                if field.eq_ignore_ascii_case("Name") {
                    self.name.as_str()
                } else {
                    self.get(field).unwrap_or("0")
                }
            })
            .collect();
        format!("Style: {}", fields.join(","))
    }
}

/// A loaded subtitle script: info, styles and ordered events
#[derive(Debug, Clone)]
pub struct SubtitleFile {
    /// Source filename
    pub path: PathBuf,

    /// First number found in the file name
    pub episode_number: Option<u32>,

    /// `[Script Info]` key/value pairs in file order
    pub script_info: Vec<(String, String)>,

    pub style_format: Vec<String>,
    pub styles: Vec<SubtitleStyle>,

    /// List of events
    pub events: Vec<SubtitleEvent>,

    /// Sections this module does not interpret, written back verbatim
    pub extra_sections: Vec<(String, Vec<String>)>,
}

enum Section {
    ScriptInfo,
    Styles,
    Events,
    Other(usize),
    None,
}

impl SubtitleFile {
    /// Create an empty script with a default style
    pub fn new(path: PathBuf) -> Self {
        let episode_number = file_utils::episode_number_from_path(&path);
        SubtitleFile {
            path,
            episode_number,
            script_info: vec![("ScriptType".to_string(), "v4.00+".to_string())],
            style_format: DEFAULT_STYLE_FORMAT.iter().map(|s| s.to_string()).collect(),
            styles: vec![SubtitleStyle::default_named(DEFAULT_STYLE_NAME)],
            events: Vec::new(),
            extra_sections: Vec::new(),
        }
    }

    /// Build a script directly from events
    pub fn from_events(path: PathBuf, events: Vec<SubtitleEvent>) -> Self {
        let mut file = Self::new(path);
        file.events = events;
        file.sort_events();
        file
    }

    /// Load an ASS/SSA or SRT file; events come back sorted by start time
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SubtitleError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut file = match extension.as_str() {
            "ass" | "ssa" => Self::parse_ass_string(&content, path.to_path_buf())?,
            "srt" => Self::from_events(path.to_path_buf(), Self::parse_srt_string(&content)?),
            other => return Err(SubtitleError::UnsupportedFormat(other.to_string())),
        };
        file.sort_events();
        debug!("Loaded {} events from {}", file.events.len(), file.file_name());
        Ok(file)
    }

    /// File name without directories
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// File name without extension
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn sort_events(&mut self) {
        self.events.sort_by_key(|event| event.start_ms);
    }

    pub fn info(&self, key: &str) -> Option<&str> {
        self.script_info
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_info(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.script_info.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(entry) => entry.1 = value,
            None => self.script_info.push((key.to_string(), value)),
        }
    }

    pub fn style(&self, name: &str) -> Option<&SubtitleStyle> {
        self.styles.iter().find(|style| style.name == name)
    }

    /// Rename a style and re-point every event using it
    pub fn rename_style(&mut self, old_name: &str, new_name: &str) {
        for style in self.styles.iter_mut().filter(|s| s.name == old_name) {
            style.name = new_name.to_string();
        }
        for event in self.events.iter_mut().filter(|e| e.style == old_name) {
            event.style = new_name.to_string();
        }
    }

    /// Drop styles no event refers to, returns how many were removed
    pub fn remove_unused_styles(&mut self) -> usize {
        let before = self.styles.len();
        let events = &self.events;
        self.styles
            .retain(|style| events.iter().any(|event| event.style == style.name));
        before - self.styles.len()
    }

    /// Parse ASS/SSA script content
    pub fn parse_ass_string(content: &str, path: PathBuf) -> Result<Self, SubtitleError> {
        let mut file = Self::new(path);
        file.script_info.clear();
        file.styles.clear();

        let mut section = Section::None;
        let mut event_format: Vec<String> = EVENT_FORMAT.split(',').map(|s| s.trim().to_string()).collect();
        let mut saw_events = false;

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim_start_matches('\u{feff}').trim_end();
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let name = &trimmed[1..trimmed.len() - 1];
                section = match name.to_lowercase().as_str() {
                    "script info" => Section::ScriptInfo,
                    "v4+ styles" | "v4 styles" | "v4 styles+" => Section::Styles,
                    "events" => {
                        saw_events = true;
                        Section::Events
                    }
                    _ => {
                        file.extra_sections.push((name.to_string(), Vec::new()));
                        Section::Other(file.extra_sections.len() - 1)
                    }
                };
                continue;
            }

            match section {
                Section::ScriptInfo => {
                    if trimmed.starts_with(';') {
                        continue;
                    }
                    if let Some((key, value)) = trimmed.split_once(':') {
                        file.script_info.push((key.trim().to_string(), value.trim().to_string()));
                    }
                }
                Section::Styles => {
                    if let Some(format) = trimmed.strip_prefix("Format:") {
                        file.style_format = format.split(',').map(|s| s.trim().to_string()).collect();
                    } else if let Some(data) = trimmed.strip_prefix("Style:") {
                        file.styles.push(Self::parse_style_line(data, &file.style_format, line_number)?);
                    }
                }
                Section::Events => {
                    if let Some(format) = trimmed.strip_prefix("Format:") {
                        event_format = format.split(',').map(|s| s.trim().to_string()).collect();
                    } else if let Some(data) = trimmed.strip_prefix("Dialogue:") {
                        file.events.push(Self::parse_event_line(data, &event_format, false, line_number)?);
                    } else if let Some(data) = trimmed.strip_prefix("Comment:") {
                        file.events.push(Self::parse_event_line(data, &event_format, true, line_number)?);
                    }
                }
                Section::Other(idx) => file.extra_sections[idx].1.push(line.to_string()),
                Section::None => {
                    warn!("Unexpected text at line {} before any section: {}", line_number, trimmed);
                }
            }
        }

        if !saw_events {
            return Err(SubtitleError::Parse {
                line: 0,
                message: "no [Events] section".to_string(),
            });
        }

        Ok(file)
    }

    fn parse_style_line(data: &str, format: &[String], line: usize) -> Result<SubtitleStyle, SubtitleError> {
        let parts: Vec<&str> = data.splitn(format.len(), ',').map(|s| s.trim()).collect();
        if parts.len() != format.len() {
            return Err(SubtitleError::Parse {
                line,
                message: format!("style has {} fields, format declares {}", parts.len(), format.len()),
            });
        }

        let mut name = String::new();
        let mut values = Vec::with_capacity(format.len().saturating_sub(1));
        for (field, value) in format.iter().zip(parts) {
            if field.eq_ignore_ascii_case("Name") {
                name = value.to_string();
            } else {
                values.push((field.clone(), value.to_string()));
            }
        }

        Ok(SubtitleStyle { name, values })
    }

    fn parse_event_line(data: &str, format: &[String], is_comment: bool, line: usize) -> Result<SubtitleEvent, SubtitleError> {
        let parts: Vec<&str> = data.trim_start().splitn(format.len(), ',').collect();
        if parts.len() != format.len() {
            return Err(SubtitleError::Parse {
                line,
                message: format!("event has {} fields, format declares {}", parts.len(), format.len()),
            });
        }

        let mut event = SubtitleEvent::new(0, 0, String::new());
        event.is_comment = is_comment;

        let int_field = |value: &str| value.trim().parse::<i32>().unwrap_or(0);

        for (field, value) in format.iter().zip(parts) {
            match field.to_lowercase().as_str() {
                "layer" | "marked" => event.layer = int_field(value),
                "start" => event.start_ms = SubtitleEvent::parse_timestamp(value)?,
                "end" => event.end_ms = SubtitleEvent::parse_timestamp(value)?,
                "style" => event.style = value.trim().to_string(),
                "name" | "actor" => event.name = value.trim().to_string(),
                "marginl" => event.margin_l = int_field(value),
                "marginr" => event.margin_r = int_field(value),
                "marginv" => event.margin_v = int_field(value),
                "effect" => event.effect = value.trim().to_string(),
                "text" => event.text = value.to_string(),
                _ => {}
            }
        }

        Ok(event)
    }

    /// Parse SRT format string into events
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEvent>, SubtitleError> {
        let mut events = Vec::new();

        // State variables for parsing
        let mut expecting_header = true;
        let mut current_times: Option<(i64, i64)> = None;
        let mut current_text = String::new();

        let flush = |times: Option<(i64, i64)>, text: &mut String, events: &mut Vec<SubtitleEvent>| {
            if let Some((start, end)) = times {
                if text.trim().is_empty() {
                    warn!("Skipping empty subtitle entry at {}", SubtitleEvent::format_timestamp(start));
                } else {
                    events.push(SubtitleEvent::new(start, end, text.trim().to_string()));
                }
            }
            text.clear();
        };

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim().trim_start_matches('\u{feff}');

            // Empty line ends the current entry
            if trimmed.is_empty() {
                flush(current_times.take(), &mut current_text, &mut events);
                expecting_header = true;
                continue;
            }

            if expecting_header && trimmed.parse::<usize>().is_ok() {
                continue;
            }

            if let Some(caps) = SRT_TIMESTAMP_REGEX.captures(trimmed) {
                flush(current_times.take(), &mut current_text, &mut events);
                current_times = Some((Self::srt_captures_to_ms(&caps, 1), Self::srt_captures_to_ms(&caps, 5)));
                expecting_header = false;
                continue;
            }

            if current_times.is_some() {
                if !current_text.is_empty() {
                    current_text.push_str("\\N");
                }
                current_text.push_str(trimmed);
                expecting_header = false;
            } else {
                warn!("Unexpected text at line {} before timestamp: {}", index + 1, trimmed);
            }
        }

        flush(current_times.take(), &mut current_text, &mut events);

        if events.is_empty() {
            return Err(SubtitleError::Parse {
                line: 0,
                message: "no valid subtitle entries were found in the SRT content".to_string(),
            });
        }

        events.sort_by_key(|event| event.start_ms);
        Ok(events)
    }

    fn srt_captures_to_ms(caps: &regex::Captures, start_idx: usize) -> i64 {
        let part = |idx: usize| -> i64 {
            caps.get(idx).map_or(0, |m| m.as_str().parse().unwrap_or(0))
        };
        (part(start_idx) * 3600 + part(start_idx + 1) * 60 + part(start_idx + 2)) * 1000 + part(start_idx + 3)
    }

    /// Serialize the script as ASS
    pub fn to_ass_string(&self) -> String {
        let mut out = String::new();

        out.push_str("[Script Info]\n");
        if self.info("ScriptType").is_none() {
            out.push_str("ScriptType: v4.00+\n");
        }
        for (key, value) in &self.script_info {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        out.push('\n');

        let style_format: Vec<String> = if self.style_format.is_empty() {
            DEFAULT_STYLE_FORMAT.iter().map(|s| s.to_string()).collect()
        } else {
            self.style_format.clone()
        };
        out.push_str("[V4+ Styles]\n");
        out.push_str(&format!("Format: {}\n", style_format.join(", ")));
        for style in &self.styles {
            out.push_str(&style.to_line(&style_format));
            out.push('\n');
        }
        out.push('\n');

        out.push_str("[Events]\n");
        out.push_str(&format!("Format: {}\n", EVENT_FORMAT));
        for event in &self.events {
            out.push_str(&event.to_string());
            out.push('\n');
        }

        for (name, lines) in &self.extra_sections {
            out.push_str(&format!("\n[{}]\n", name));
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }

        out
    }

    /// Write the script to an ASS file, creating parent directories
    pub fn write_to_ass<P: AsRef<Path>>(&self, path: P) -> Result<(), SubtitleError> {
        let path = path.as_ref();
        file_utils::FileManager::write_to_file(path, &self.to_ass_string()).map_err(|e| SubtitleError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl fmt::Display for SubtitleFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle File")?;
        writeln!(f, "Source: {:?}", self.path)?;
        writeln!(f, "Episode: {:?}", self.episode_number)?;
        writeln!(f, "Styles: {}", self.styles.len())?;
        writeln!(f, "Events: {}", self.events.len())?;
        Ok(())
    }
}
