//! Request parameters and their validation.

use serde::{Deserialize, Serialize};

use crate::config::SearchSettings;
use crate::error::{Error, Result};
use crate::geo::{BoundingBox, GeoPoint, GeoRadius};
use crate::types::{ExperienceLevel, JobType, WorkType};

/// Structured equality and range filters shared by search and map requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_salary: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_salary: Option<i64>,
}

impl JobFilters {
    /// Blank strings are treated as absent.
    pub fn normalized(mut self) -> Self {
        for slot in [&mut self.category, &mut self.province, &mut self.district] {
            if slot.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *slot = None;
            } else if let Some(s) = slot.as_mut() {
                *s = s.trim().to_string();
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
    #[serde(flatten)]
    pub filters: JobFilters,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub distance_km: Option<f64>,
    pub text_weight: Option<f64>,
    pub vector_weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchWeights {
    pub text: f64,
    pub vector: f64,
}

/// Echo of the filters that shaped a result page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    #[serde(flatten)]
    pub filters: JobFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<GeoRadius>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedParams {
    /// Trimmed; `None` when the query was absent or blank.
    pub query: Option<String>,
    pub page: usize,
    pub size: usize,
    pub filters: JobFilters,
    pub radius: Option<GeoRadius>,
    pub weights: BranchWeights,
}

impl ValidatedParams {
    pub fn skip(&self) -> usize {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn applied_filters(&self) -> AppliedFilters {
        AppliedFilters { filters: self.filters.clone(), radius: self.radius }
    }
}

impl SearchParams {
    pub fn validate(&self, settings: &SearchSettings) -> Result<ValidatedParams> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(Error::invalid("page must be at least 1"));
        }
        let size = match self.size {
            Some(0) => return Err(Error::invalid("size must be at least 1")),
            Some(size) => size.min(settings.max_page_size),
            None => settings.default_page_size,
        };
        if page.saturating_mul(size) > settings.max_result_window {
            return Err(Error::invalid(format!(
                "page {page} of size {size} is beyond the first {} results",
                settings.max_result_window
            )));
        }

        let weights = BranchWeights {
            text: self.text_weight.unwrap_or(settings.text_weight),
            vector: self.vector_weight.unwrap_or(settings.vector_weight),
        };
        for (name, w) in [("textWeight", weights.text), ("vectorWeight", weights.vector)] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(Error::invalid(format!("{name} must be a non-negative number")));
            }
        }

        let radius = match (self.lat, self.lng, self.distance_km) {
            (None, None, None) => None,
            (Some(_), None, _) | (None, Some(_), _) => {
                return Err(Error::invalid("lat and lng must be supplied together"));
            }
            (None, None, Some(_)) => {
                return Err(Error::invalid("distanceKm requires lat and lng"));
            }
            (Some(lat), Some(lng), distance) => {
                let center = GeoPoint::new(lat, lng);
                center.validate()?;
                match distance {
                    None => None,
                    Some(d) if d.is_finite() && d > 0.0 => Some(GeoRadius { center, radius_km: d }),
                    Some(d) => return Err(Error::invalid(format!("distanceKm must be positive, got {d}"))),
                }
            }
        };

        if let (Some(min), Some(max)) = (self.filters.min_salary, self.filters.max_salary) {
            if min > max {
                return Err(Error::invalid("minSalary exceeds maxSalary"));
            }
        }

        let query = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        Ok(ValidatedParams {
            query,
            page,
            size,
            filters: self.filters.clone().normalized(),
            radius,
            weights,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQuery {
    pub bbox: BoundingBox,
    pub zoom: f64,
    #[serde(flatten, default)]
    pub filters: JobFilters,
}

impl MapQuery {
    pub fn validate(&self) -> Result<()> {
        self.bbox.validate()?;
        if !(self.zoom.is_finite() && self.zoom >= 0.0) {
            return Err(Error::invalid(format!("zoom must be a non-negative number, got {}", self.zoom)));
        }
        Ok(())
    }
}
