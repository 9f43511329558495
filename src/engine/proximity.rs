use serde::Serialize;

use crate::engine::MatchSettings;
use crate::geo::{haversine_km_with_radius, GeoPoint};
use crate::models::trip::Trip;
use crate::models::trip_request::TripRequest;

/// Anything with a pickup and a dropoff point.
pub trait Endpoints {
    fn pickup_point(&self) -> &GeoPoint;
    fn dropoff_point(&self) -> &GeoPoint;
}

impl Endpoints for Trip {
    fn pickup_point(&self) -> &GeoPoint {
        &self.pickup.point
    }

    fn dropoff_point(&self) -> &GeoPoint {
        &self.dropoff.point
    }
}

impl Endpoints for TripRequest {
    fn pickup_point(&self) -> &GeoPoint {
        &self.pickup.point
    }

    fn dropoff_point(&self) -> &GeoPoint {
        &self.dropoff.point
    }
}

impl<T: Endpoints + ?Sized> Endpoints for &T {
    fn pickup_point(&self) -> &GeoPoint {
        (**self).pickup_point()
    }

    fn dropoff_point(&self) -> &GeoPoint {
        (**self).dropoff_point()
    }
}

/// A compatible candidate together with the distances that qualified it.
#[derive(Debug, Clone, Serialize)]
pub struct ProximityMatch<T> {
    pub candidate: T,
    pub pickup_distance_km: f64,
    pub dropoff_distance_km: f64,
}

/// Pickup and dropoff distances, or `None` if either exceeds the threshold.
pub fn measure(
    req_pickup: &GeoPoint,
    req_dropoff: &GeoPoint,
    cand_pickup: &GeoPoint,
    cand_dropoff: &GeoPoint,
    settings: &MatchSettings,
) -> Option<(f64, f64)> {
    let pickup_km = haversine_km_with_radius(req_pickup, cand_pickup, settings.earth_radius_km);
    if pickup_km > settings.max_distance_km {
        return None;
    }

    let dropoff_km = haversine_km_with_radius(req_dropoff, cand_dropoff, settings.earth_radius_km);
    if dropoff_km > settings.max_distance_km {
        return None;
    }

    Some((pickup_km, dropoff_km))
}

/// Both endpoints must be within `settings.max_distance_km`; a close pickup does not
/// rescue a far dropoff.
pub fn is_compatible(
    req_pickup: &GeoPoint,
    req_dropoff: &GeoPoint,
    cand_pickup: &GeoPoint,
    cand_dropoff: &GeoPoint,
    settings: &MatchSettings,
) -> bool {
    measure(req_pickup, req_dropoff, cand_pickup, cand_dropoff, settings).is_some()
}

pub fn match_candidates<T, I>(
    pickup: &GeoPoint,
    dropoff: &GeoPoint,
    candidates: I,
    settings: &MatchSettings,
) -> Vec<ProximityMatch<T>>
where
    T: Endpoints,
    I: IntoIterator<Item = T>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let (pickup_distance_km, dropoff_distance_km) = measure(
                pickup,
                dropoff,
                candidate.pickup_point(),
                candidate.dropoff_point(),
                settings,
            )?;

            Some(ProximityMatch {
                candidate,
                pickup_distance_km,
                dropoff_distance_km,
            })
        })
        .collect()
}

/// Ascending pickup distance. The sort is stable, so equal distances keep their input order.
pub fn rank_by_pickup_distance<T>(matches: &mut [ProximityMatch<T>]) {
    matches.sort_by(|a, b| a.pickup_distance_km.total_cmp(&b.pickup_distance_km));
}

/// Two decimals, the precision distances are shown with.
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}
