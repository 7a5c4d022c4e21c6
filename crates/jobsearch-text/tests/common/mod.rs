#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use jobsearch_core::geo::GeoPoint;
use jobsearch_core::types::{ExperienceLevel, Job, JobLocation, JobStatus, JobType, ModerationStatus, WorkType};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

pub fn job(id: &str, title: &str) -> Job {
    Job {
        id: id.into(),
        recruiter_id: format!("rec-{id}"),
        title: title.into(),
        description: String::new(),
        requirements: String::new(),
        benefits: String::new(),
        category: "IT".into(),
        job_type: JobType::FullTime,
        work_type: WorkType::Onsite,
        experience: ExperienceLevel::OneToThreeYears,
        min_salary: None,
        max_salary: None,
        location: JobLocation {
            province: Some("Hanoi".into()),
            district: None,
            point: Some(GeoPoint::new(21.03, 105.84)),
        },
        deadline: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        status: JobStatus::Active,
        moderation: ModerationStatus::Approved,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        chunks: vec![],
    }
}
