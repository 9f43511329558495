pub mod capacity;
pub mod expiry;
pub mod orchestrator;
pub mod proximity;
pub mod window;

use chrono::Duration;

/// Tunables shared by the window filter and the proximity matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    pub max_distance_km: f64,
    /// Half-width of the departure band, applied on both sides of the target.
    pub time_window: Duration,
    pub earth_radius_km: f64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_distance_km: 5.0,
            time_window: Duration::hours(2),
            earth_radius_km: crate::geo::EARTH_RADIUS_KM,
        }
    }
}
