use std::path::Path;

use crate::canvas::Pixel;
use crate::components::colors::{DEFAULT_HISTORY_SIZE, format_hex, parse_hex};
use crate::components::history::DEFAULT_MAX_UNDO;
use crate::components::tools::EditorTool;
use crate::log_warn;

/// Editor behaviour settings.
///
/// Stored as `key=value` lines; unknown keys and unparsable values are
/// ignored so an old or hand-edited file never prevents startup.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Maximum number of undo steps per canvas (at least 1)
    pub max_undo_steps: usize,
    /// Number of colours kept in the shared colour history (at least 1)
    pub color_history_size: usize,
    /// Minimum gap between two identical notices, in milliseconds
    pub notice_cooldown_ms: u64,
    /// Tool selected when a session opens
    pub default_tool: EditorTool,
    /// Drawing colour when a session opens
    pub default_color: Pixel,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_UNDO,
            color_history_size: DEFAULT_HISTORY_SIZE,
            notice_cooldown_ms: 5000,
            default_tool: EditorTool::Pencil,
            default_color: 0xFF00_0000,
        }
    }
}

impl EditorSettings {
    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                log_warn!("Settings: could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse::<usize>().unwrap_or(DEFAULT_MAX_UNDO).max(1);
                }
                "color_history_size" => {
                    s.color_history_size = val.parse::<usize>().unwrap_or(DEFAULT_HISTORY_SIZE).max(1);
                }
                "notice_cooldown_ms" => {
                    s.notice_cooldown_ms = val.parse().unwrap_or(5000);
                }
                "default_tool" => {
                    s.default_tool = EditorTool::from_name(val);
                }
                "default_color" => {
                    if let Some(c) = parse_hex(val) {
                        s.default_color = c;
                    }
                }
                _ => {
                    log_warn!("Settings: unknown key '{}'", key);
                }
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "max_undo_steps={}\n\
             color_history_size={}\n\
             notice_cooldown_ms={}\n\
             default_tool={}\n\
             default_color={}\n",
            self.max_undo_steps,
            self.color_history_size,
            self.notice_cooldown_ms,
            self.default_tool.display_name(),
            format_hex(self.default_color),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_known_keys() {
        let s = EditorSettings::parse(
            "# editor\n\
             max_undo_steps = 12\n\
             color_history_size=8\n\
             notice_cooldown_ms=250\n\
             default_tool=Fill\n\
             default_color=#FF112233\n\
             theme=dark\n",
        );
        assert_eq!(s.max_undo_steps, 12);
        assert_eq!(s.color_history_size, 8);
        assert_eq!(s.notice_cooldown_ms, 250);
        assert_eq!(s.default_tool, EditorTool::Fill);
        assert_eq!(s.default_color, 0xFF11_2233);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let s = EditorSettings::parse("max_undo_steps=lots\ncolor_history_size=0\ndefault_color=red\nnonsense");
        assert_eq!(s.max_undo_steps, DEFAULT_MAX_UNDO);
        assert_eq!(s.color_history_size, 1);
        assert_eq!(s.default_color, EditorSettings::default().default_color);
    }

    #[test]
    fn config_string_parses_back() {
        let s = EditorSettings {
            max_undo_steps: 7,
            default_tool: EditorTool::Line,
            ..EditorSettings::default()
        };
        assert_eq!(EditorSettings::parse(&s.to_config_string()), s);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = EditorSettings::load(Path::new("/nonexistent/texeledit/settings.cfg"));
        assert_eq!(s, EditorSettings::default());
    }
}
