use std::collections::HashMap;

use jobsearch_core::types::{CompanySummary, Job, JobPosition, MapPoint, RecruiterId};

/// Map marker for `job`; `None` when the job has no coordinates.
pub fn map_point(job: &Job, companies: &HashMap<RecruiterId, CompanySummary>) -> Option<MapPoint> {
    let point = job.location.point?;
    Some(MapPoint {
        id: job.id.clone(),
        title: job.title.clone(),
        point,
        min_salary: job.min_salary,
        max_salary: job.max_salary,
        job_type: job.job_type,
        company: companies.get(&job.recruiter_id).cloned(),
    })
}

pub fn position(job: &Job) -> Option<JobPosition> {
    job.location.point.map(|point| JobPosition { id: job.id.clone(), point })
}
