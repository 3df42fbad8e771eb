//! Tunable constants for sector geometry compilation and propagation.
//!
//! The defaults reproduce the behaviour the terrain pipeline is tuned for;
//! host applications can deserialize overrides from their own config files.

use serde::Deserialize;

/// Configuration for the per-sector geometry pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Children of the punched land tree whose contour area magnitude falls
    /// below this value (units²) are pruned together with their subtree.
    ///
    /// 256 = a 16x16 fragment, the size of the noise boolean ops leave behind.
    pub prune_area_threshold: f64,

    /// Extra erosion applied to crossover segments when labeling the punched
    /// land tree, so the labeling point sits safely inside the portal corridor.
    pub crossover_pathing_dilation: f64,

    /// Radius bucket width for every per-radius cache.
    ///
    /// Radii are rounded to the nearest multiple of this value before lookup
    /// and before computing, so jitter below half a quantum never misses.
    pub radius_quantum: f64,

    /// Miter limit handed to the offsetter alongside round joins.
    pub miter_limit: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            prune_area_threshold: 256.0,
            crossover_pathing_dilation: 2.0,
            radius_quantum: 1.0 / 1024.0,
            miter_limit: 2.0,
        }
    }
}

/// Configuration for cross-sector visibility propagation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Upper bound on sector visits per propagation; `None` relies on the
    /// visited set alone.
    pub max_sectors: Option<usize>,

    /// Visible sub-ranges shorter than this parameter span along a
    /// crossover are dropped.
    pub min_visible_fraction: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_sectors: None,
            min_visible_fraction: 1e-9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeometryConfig::default();
        assert_eq!(config.prune_area_threshold, 256.0);
        assert_eq!(config.crossover_pathing_dilation, 2.0);
        assert_eq!(PropagationConfig::default().max_sectors, None);
    }

    #[test]
    fn test_partial_override_from_toml() {
        let config: GeometryConfig = toml::from_str("prune_area_threshold = 100.0").unwrap();
        assert_eq!(config.prune_area_threshold, 100.0);
        assert_eq!(config.crossover_pathing_dilation, 2.0);

        let propagation: PropagationConfig = toml::from_str("max_sectors = 8").unwrap();
        assert_eq!(propagation.max_sectors, Some(8));
    }
}
