//! Preset application, the last compile stage.

use serde_json::Value as Json;

use quarry_core::PresetConfig;

use super::params::{CompiledParams, is_diagnostic};
use crate::state::{Preset, PresetMode};

/// Keys `only` mode keeps besides the preset and diagnostics.
pub const ESSENTIAL_KEYS: &[&str] = &["q", "page", "per_page"];

/// Apply `preset` and return the compiled keys it displaced, in compile
/// order. Only `lock` mode displaces keys.
pub(crate) fn apply(params: &mut CompiledParams, preset: &Preset, config: &PresetConfig) -> Vec<String> {
    let mut conflicts = Vec::new();
    match preset.mode {
        PresetMode::Merge => {}
        PresetMode::Only => {
            params.retain(|k| is_diagnostic(k) || ESSENTIAL_KEYS.contains(&k));
        }
        PresetMode::Lock => {
            conflicts = params
                .keys()
                .filter(|k| config.locked_keys.contains(*k))
                .map(str::to_owned)
                .collect();
            for key in &conflicts {
                params.remove(key);
            }
            params.insert(
                "_preset_conflicts",
                Json::Array(conflicts.iter().cloned().map(Json::String).collect()),
            );
        }
    }
    params.insert("preset", config.qualify(&preset.name));
    params.insert("_preset_mode", preset.mode.as_str());
    conflicts
}
