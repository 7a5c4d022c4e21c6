#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use jobsearch_core::geo::GeoPoint;
use jobsearch_core::types::{ExperienceLevel, Job, JobChunk, JobLocation, JobStatus, JobType, ModerationStatus, WorkType};

pub const DIM: usize = 4;

pub fn now() -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

pub fn unit(v: [f32; DIM]) -> Vec<f32> {
	let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
	v.iter().map(|x| x / norm).collect()
}

pub fn chunk(text: &str, v: [f32; DIM]) -> JobChunk {
	JobChunk { text: text.into(), embedding: unit(v) }
}

pub fn job(id: &str, title: &str, vectors: &[[f32; DIM]]) -> Job {
	Job {
		id: id.into(),
		recruiter_id: format!("rec-{id}"),
		title: title.into(),
		description: format!("{title} description"),
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
		chunks: vectors.iter().enumerate().map(|(i, v)| chunk(&format!("{title} part {i}"), *v)).collect(),
	}
}
