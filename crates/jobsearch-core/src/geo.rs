//! Great-circle distance, search radii and bounding boxes.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const EARTH_RADIUS_KM: f64 = 6371.0088;
const KM_PER_DEGREE_LAT: f64 = 111.195;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat)) {
            return Err(Error::invalid(format!("latitude out of range: {}", self.lat)));
        }
        if !(self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng)) {
            return Err(Error::invalid(format!("longitude out of range: {}", self.lng)));
        }
        Ok(())
    }
}

/// Haversine distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// `pivot / (pivot + distance)`: 1.0 at the origin, 0.5 at the pivot.
pub fn proximity_decay(distance_km: f64, pivot_km: f64) -> f64 {
    pivot_km / (pivot_km + distance_km.max(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRadius {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl GeoRadius {
    pub fn contains(&self, point: GeoPoint) -> bool {
        haversine_km(self.center, point) <= self.radius_km
    }

    /// Smallest lat/lng box enclosing the circle, clamped to valid ranges.
    ///
    /// Used as a coarse index predicate; `contains` is the exact check.
    pub fn bounding_box(&self) -> BoundingBox {
        let d_lat = self.radius_km / KM_PER_DEGREE_LAT;
        let min_lat = (self.center.lat - d_lat).max(-90.0);
        let max_lat = (self.center.lat + d_lat).min(90.0);

        let widest = self.center.lat.abs() + d_lat;
        let (min_lng, max_lng) = if widest >= 90.0 {
            (-180.0, 180.0)
        } else {
            let d_lng = d_lat / widest.to_radians().cos();
            let lo = self.center.lng - d_lng;
            let hi = self.center.lng + d_lng;
            if lo < -180.0 || hi > 180.0 {
                (-180.0, 180.0)
            } else {
                (lo, hi)
            }
        };

        BoundingBox { min_lat, min_lng, max_lat, max_lng }
    }
}

/// Axis-aligned viewport. Does not wrap the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<()> {
        GeoPoint::new(self.min_lat, self.min_lng).validate()?;
        GeoPoint::new(self.max_lat, self.max_lng).validate()?;
        if self.min_lat > self.max_lat || self.min_lng > self.max_lng {
            return Err(Error::invalid("bounding box minimum exceeds maximum"));
        }
        Ok(())
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_matches_known_distance() {
        // Hanoi to Ho Chi Minh City, roughly 1,140 km.
        let hanoi = GeoPoint::new(21.0285, 105.8542);
        let hcmc = GeoPoint::new(10.8231, 106.6297);
        let d = haversine_km(hanoi, hcmc);
        assert!((1130.0..1150.0).contains(&d), "got {d}");
        assert!(haversine_km(hanoi, hanoi).abs() < 1e-9);
    }

    #[test]
    fn radius_box_encloses_circle() {
        let r = GeoRadius { center: GeoPoint::new(21.0, 105.8), radius_km: 25.0 };
        let bbox = r.bounding_box();
        for bearing in 0..36 {
            let theta = f64::from(bearing * 10).to_radians();
            // Point just inside the circle along this bearing.
            let d = 24.9 / KM_PER_DEGREE_LAT;
            let p = GeoPoint::new(
                21.0 + d * theta.cos(),
                105.8 + d * theta.sin() / 21.0_f64.to_radians().cos(),
            );
            if r.contains(p) {
                assert!(bbox.contains(p), "bearing {bearing}");
            }
        }
    }

    #[test]
    fn proximity_decay_halves_at_pivot() {
        assert!((proximity_decay(0.0, 20.0) - 1.0).abs() < 1e-12);
        assert!((proximity_decay(20.0, 20.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inverted_box_is_rejected() {
        let bbox = BoundingBox { min_lat: 10.0, min_lng: 100.0, max_lat: 5.0, max_lng: 110.0 };
        assert!(bbox.validate().is_err());
    }
}
