use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::EmbeddingSettings;
use crate::types::Job;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub words_per_chunk: usize,
    pub overlap_percent: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { words_per_chunk: 300, overlap_percent: 0.2 }
    }
}

impl From<&EmbeddingSettings> for ChunkingConfig {
    fn from(s: &EmbeddingSettings) -> Self {
        Self { words_per_chunk: s.chunk_words.max(1), overlap_percent: s.chunk_overlap.clamp(0.0, 0.9) }
    }
}

/// Splits a job's text into embedding-sized passages.
///
/// Each paragraph of description, requirements and benefits becomes one chunk,
/// long paragraphs are cut into overlapping word windows. The title is
/// prefixed to every chunk so each passage carries the role it belongs to.
#[derive(Default)]
pub struct JobChunker {
    config: ChunkingConfig,
}

impl JobChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn chunk_job(&self, job: &Job) -> Vec<String> {
        let title = job.title.trim();
        let mut chunks = Vec::new();
        for section in [&job.description, &job.requirements, &job.benefits] {
            for paragraph in section.split("\n\n") {
                let paragraph = paragraph.trim();
                if paragraph.is_empty() {
                    continue;
                }
                for piece in self.split_paragraph_with_overlap(paragraph) {
                    chunks.push(format!("{title}\n{piece}"));
                }
            }
        }
        if chunks.is_empty() && !title.is_empty() {
            chunks.push(title.to_string());
        }
        chunks
    }

    fn split_paragraph_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let per_chunk = self.config.words_per_chunk;
        if words.len() <= per_chunk {
            return vec![words.join(" ")];
        }
        let overlap = ((per_chunk as f32 * self.config.overlap_percent) as usize).min(per_chunk - 1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + per_chunk).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            start = end - overlap;
        }
        chunks
    }
}

/// Reads a JSON Lines job feed. Blank lines are skipped; a malformed line
/// fails the whole load with its line number.
pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading job feed {}", path.display()))?;
    let mut jobs = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let job: Job = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid job record", path.display(), n + 1))?;
        jobs.push(job);
    }
    tracing::info!(count = jobs.len(), path = %path.display(), "loaded job feed");
    Ok(jobs)
}
