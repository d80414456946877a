//! Built-in and user-saved looks.
//!
//! Custom presets live as one JSON array under [`PRESET_STORE_KEY`] in a
//! [`KeyValueStore`]. Presets never carry geometry: saving strips it and
//! applying keeps the caller's.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::transform::params::{CurvePoint, EditParams, HslAdjust};

/// Store key holding the custom preset list.
pub const PRESET_STORE_KEY: &str = "darkroom_presets";

/// Minimal string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
}

/// Process-local store, used by tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A named parameter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub params: EditParams,
}

impl Preset {
    pub fn new(name: impl Into<String>, params: EditParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// `current` with this preset's look applied; geometry is kept.
    pub fn apply_to(&self, current: &EditParams) -> EditParams {
        current.with_style_from(&self.params)
    }
}

/// The five looks that ship with the editor, each a full snapshot over
/// the defaults.
pub fn builtin_presets() -> Vec<Preset> {
    let natural = EditParams::default();

    let mut warm = EditParams::default();
    warm.color.temperature = 15.0;
    warm.color.tint = 5.0;
    warm.color.saturation = 10.0;
    warm.color.grading.midtones = HslAdjust::new(40.0, 20.0, 0.0);

    let mut matte = EditParams::default();
    matte.color.temperature = -10.0;
    matte.light.contrast = -10.0;
    matte.light.shadows = 20.0;
    matte.light.blacks = 10.0;
    matte.curves.master = vec![CurvePoint::new(0.0, 0.1), CurvePoint::new(1.0, 0.9)];

    let mut punchy = EditParams::default();
    punchy.light.contrast = 30.0;
    punchy.effects.clarity = 20.0;
    punchy.effects.texture = 10.0;
    punchy.light.highlights = -20.0;
    punchy.light.shadows = -10.0;

    let mut mono = EditParams::default();
    mono.color.saturation = -100.0;
    mono.light.contrast = 20.0;
    mono.effects.clarity = 30.0;
    mono.color.mixer.red = HslAdjust::new(0.0, -100.0, -20.0);
    mono.color.mixer.blue = HslAdjust::new(0.0, -100.0, -40.0);

    vec![
        Preset::new("Natural", natural),
        Preset::new("Warm Finish", warm),
        Preset::new("Cool Matte", matte),
        Preset::new("High Contrast", punchy),
        Preset::new("B&W Punch", mono),
    ]
}

/// Built-ins plus the custom presets held by a store.
pub struct PresetLibrary<S> {
    store: S,
}

impl<S: KeyValueStore> PresetLibrary<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Saved presets in save order.
    ///
    /// A blob that does not parse is logged and read as an empty list; the
    /// next save overwrites it.
    pub fn custom(&self) -> Result<Vec<Preset>, CoreError> {
        let Some(blob) = self.store.get(PRESET_STORE_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&blob) {
            Ok(presets) => Ok(presets),
            Err(e) => {
                warn!(error = %e, "stored presets are unreadable, ignoring them");
                Ok(Vec::new())
            }
        }
    }

    /// Built-ins first, then custom presets.
    pub fn all(&self) -> Result<Vec<Preset>, CoreError> {
        let mut presets = builtin_presets();
        presets.extend(self.custom()?);
        Ok(presets)
    }

    /// Look a preset up by name. The most recently saved custom preset
    /// wins over older ones and over a built-in of the same name.
    pub fn find(&self, name: &str) -> Result<Option<Preset>, CoreError> {
        if let Some(p) = self.custom()?.into_iter().rev().find(|p| p.name == name) {
            return Ok(Some(p));
        }
        Ok(builtin_presets().into_iter().find(|p| p.name == name))
    }

    /// Append a custom preset built from `params` with geometry stripped.
    pub fn save(&self, name: &str, params: &EditParams) -> Result<Preset, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Store("preset name must not be empty".into()));
        }
        let preset = Preset::new(name, params.style_only());
        let mut presets = self.custom()?;
        presets.push(preset.clone());
        self.write(&presets)?;
        info!(name, count = presets.len(), "preset saved");
        Ok(preset)
    }

    /// Remove every custom preset called `name`. Built-ins cannot be
    /// removed. Returns how many were dropped.
    pub fn remove(&self, name: &str) -> Result<usize, CoreError> {
        let mut presets = self.custom()?;
        let before = presets.len();
        presets.retain(|p| p.name != name);
        let removed = before - presets.len();
        if removed > 0 {
            self.write(&presets)?;
            info!(name, removed, "preset removed");
        }
        Ok(removed)
    }

    fn write(&self, presets: &[Preset]) -> Result<(), CoreError> {
        let blob = serde_json::to_string(presets)?;
        self.store.set(PRESET_STORE_KEY, &blob)
    }
}
