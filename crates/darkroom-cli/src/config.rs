//! Runtime configuration for the command-line tool.

use std::path::PathBuf;

use darkroom_core::export::DEFAULT_QUALITY;

/// Default longer edge of the interactive preview copy.
pub const DEFAULT_PREVIEW_EDGE: u32 = 1920;
/// Directory under `$HOME` used when `DARKROOM_PRESET_DIR` is unset.
const DEFAULT_PRESET_SUBDIR: &str = ".darkroom/presets";

/// Settings read from the environment; command-line flags override them.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Where the file-backed preset store keeps its JSON files.
    pub preset_dir: PathBuf,
    /// Longer edge of preview renders, in pixels.
    pub preview_edge: u32,
    /// JPEG quality, 1–100.
    pub quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl AppConfig {
    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let preset_dir = lookup("DARKROOM_PRESET_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                lookup("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(DEFAULT_PRESET_SUBDIR)
            });

        Self {
            preset_dir,
            preview_edge: lookup("DARKROOM_PREVIEW_EDGE")
                .and_then(|s| s.parse().ok())
                .filter(|&edge| edge > 0)
                .unwrap_or(DEFAULT_PREVIEW_EDGE),
            quality: lookup("DARKROOM_QUALITY")
                .and_then(|s| s.parse::<u8>().ok())
                .map(|q| q.clamp(1, 100))
                .unwrap_or(DEFAULT_QUALITY),
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        preset_dir: Option<PathBuf>,
        preview_edge: Option<u32>,
        quality: Option<u8>,
    ) -> Self {
        if let Some(dir) = preset_dir {
            self.preset_dir = dir;
        }
        if let Some(edge) = preview_edge.filter(|&e| e > 0) {
            self.preview_edge = edge;
        }
        if let Some(q) = quality {
            self.quality = q.clamp(1, 100);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[("HOME", "/home/ana")]);
        assert_eq!(c.preset_dir, PathBuf::from("/home/ana/.darkroom/presets"));
        assert_eq!(c.preview_edge, 1920);
        assert_eq!(c.quality, 95);
    }

    #[test]
    fn test_environment_values() {
        let c = config(&[
            ("DARKROOM_PRESET_DIR", "/tmp/looks"),
            ("DARKROOM_PREVIEW_EDGE", "800"),
            ("DARKROOM_QUALITY", "70"),
        ]);
        assert_eq!(c.preset_dir, PathBuf::from("/tmp/looks"));
        assert_eq!(c.preview_edge, 800);
        assert_eq!(c.quality, 70);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let c = config(&[
            ("DARKROOM_PREVIEW_EDGE", "0"),
            ("DARKROOM_QUALITY", "lots"),
        ]);
        assert_eq!(c.preview_edge, 1920);
        assert_eq!(c.quality, 95);
        assert_eq!(config(&[("DARKROOM_QUALITY", "0")]).quality, 1);
    }

    #[test]
    fn test_flags_override_environment() {
        let c = config(&[("DARKROOM_QUALITY", "70")]).with_overrides(
            Some(PathBuf::from("p")),
            Some(640),
            Some(200),
        );
        assert_eq!(c.preset_dir, PathBuf::from("p"));
        assert_eq!(c.preview_edge, 640);
        assert_eq!(c.quality, 100);
    }
}
