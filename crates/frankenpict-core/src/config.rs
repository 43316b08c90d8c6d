//! Generator tuning.
//!
//! Defaults are compiled in; each knob can be overridden from the
//! environment:
//! - `FRANKENPICT_CANDIDATES`: candidate rows drawn per accepted row.
//! - `FRANKENPICT_REFINE_PASSES`: upper bound on hill-climbing sweeps.
//! - `FRANKENPICT_REFINE`: `hillclimb` (default) or `off`.
//! - `FRANKENPICT_MAX_OBLIGATIONS`: refuse spaces with more obligations.
//!
//! Unparseable values fall back to the default rather than failing, matching
//! how the rest of the tooling treats env knobs.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CANDIDATE_POOL: usize = 40;
pub const DEFAULT_REFINE_PASSES: usize = 4;
pub const DEFAULT_MAX_OBLIGATIONS: u64 = 64 * 1024 * 1024;

/// Whether the winning candidate is improved by single-position moves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefineMode {
    #[default]
    HillClimb,
    Off,
}

impl RefineMode {
    /// Parse from string (case-insensitive). Unknown input maps to the default.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "disabled" | "0" => Self::Off,
            _ => Self::HillClimb,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HillClimb => "hillclimb",
            Self::Off => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub candidate_pool: usize,
    pub refine_passes: usize,
    pub refine: RefineMode,
    pub max_obligations: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            refine_passes: DEFAULT_REFINE_PASSES,
            refine: RefineMode::HillClimb,
            max_obligations: DEFAULT_MAX_OBLIGATIONS,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overlaid with any `FRANKENPICT_*` variables that are set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable lookup, so tests do not
    /// have to mutate the process environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(k) = lookup("FRANKENPICT_CANDIDATES").and_then(|v| parse_positive(&v)) {
            cfg.candidate_pool = k;
        }
        if let Some(p) = lookup("FRANKENPICT_REFINE_PASSES").and_then(|v| v.trim().parse().ok()) {
            cfg.refine_passes = p;
        }
        if let Some(mode) = lookup("FRANKENPICT_REFINE") {
            cfg.refine = RefineMode::from_str_loose(&mode);
        }
        if let Some(limit) = lookup("FRANKENPICT_MAX_OBLIGATIONS")
            .and_then(|v| v.trim().replace('_', "").parse::<u64>().ok())
            .filter(|&l| l > 0)
        {
            cfg.max_obligations = limit;
        }
        cfg
    }

    #[must_use]
    pub fn with_candidate_pool(mut self, k: usize) -> Self {
        self.candidate_pool = k.max(1);
        self
    }

    #[must_use]
    pub fn with_refine_passes(mut self, passes: usize) -> Self {
        self.refine_passes = passes;
        self
    }

    #[must_use]
    pub fn with_refine(mut self, refine: RefineMode) -> Self {
        self.refine = refine;
        self
    }

    #[must_use]
    pub fn with_max_obligations(mut self, limit: u64) -> Self {
        self.max_obligations = limit;
        self
    }
}

fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&v| v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_refine_modes() {
        assert_eq!(RefineMode::from_str_loose("off"), RefineMode::Off);
        assert_eq!(RefineMode::from_str_loose(" NONE "), RefineMode::Off);
        assert_eq!(RefineMode::from_str_loose("hillclimb"), RefineMode::HillClimb);
        assert_eq!(RefineMode::from_str_loose("garbage"), RefineMode::HillClimb);
        assert_eq!(RefineMode::HillClimb.as_str(), "hillclimb");
    }

    #[test]
    fn lookup_overrides_defaults() {
        let cfg = GeneratorConfig::from_lookup(|key| match key {
            "FRANKENPICT_CANDIDATES" => Some("12".to_string()),
            "FRANKENPICT_REFINE" => Some("off".to_string()),
            "FRANKENPICT_MAX_OBLIGATIONS" => Some("1_000".to_string()),
            _ => None,
        });
        assert_eq!(cfg.candidate_pool, 12);
        assert_eq!(cfg.refine, RefineMode::Off);
        assert_eq!(cfg.max_obligations, 1_000);
        assert_eq!(cfg.refine_passes, DEFAULT_REFINE_PASSES);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = GeneratorConfig::from_lookup(|key| match key {
            "FRANKENPICT_CANDIDATES" => Some("0".to_string()),
            "FRANKENPICT_REFINE_PASSES" => Some("many".to_string()),
            "FRANKENPICT_MAX_OBLIGATIONS" => Some("-5".to_string()),
            _ => None,
        });
        assert_eq!(cfg, GeneratorConfig::default());
    }

    #[test]
    fn builder_clamps_pool() {
        let cfg = GeneratorConfig::default().with_candidate_pool(0);
        assert_eq!(cfg.candidate_pool, 1);
    }
}
