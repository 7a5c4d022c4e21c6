use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use jobsearch_cli::{init_tracing, load_context, open_engine};
use jobsearch_core::geo::BoundingBox;
use jobsearch_core::params::{JobFilters, MapQuery, SearchParams};
use jobsearch_core::types::{ExperienceLevel, JobType, WorkType};

#[derive(Parser)]
#[command(name = "jobsearch", version, about = "Query the job search indexes; results are printed as JSON")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ranked hybrid search, or newest-first listing without a query.
    Search {
        query: Option<String>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        size: Option<usize>,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long)]
        distance_km: Option<f64>,
        #[arg(long)]
        text_weight: Option<f64>,
        #[arg(long)]
        vector_weight: Option<f64>,
        /// User whose saved jobs are flagged.
        #[arg(long)]
        viewer: Option<String>,
    },
    /// Title suggestions for a partial query.
    Suggest {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Points or clusters inside a viewport.
    Map {
        /// minLat,minLng,maxLat,maxLng
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,
        #[arg(long)]
        zoom: f64,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    category: Option<String>,
    #[arg(long, value_parser = parse_job_type)]
    job_type: Option<JobType>,
    #[arg(long, value_parser = parse_work_type)]
    work_type: Option<WorkType>,
    #[arg(long, value_parser = parse_experience)]
    experience: Option<ExperienceLevel>,
    #[arg(long)]
    province: Option<String>,
    #[arg(long)]
    district: Option<String>,
    #[arg(long)]
    min_salary: Option<i64>,
    #[arg(long)]
    max_salary: Option<i64>,
}

impl From<FilterArgs> for JobFilters {
    fn from(a: FilterArgs) -> Self {
        JobFilters {
            category: a.category,
            job_type: a.job_type,
            work_type: a.work_type,
            experience: a.experience,
            province: a.province,
            district: a.district,
            min_salary: a.min_salary,
            max_salary: a.max_salary,
        }
    }
}

fn parse_job_type(s: &str) -> Result<JobType, String> {
    JobType::parse(s).ok_or_else(|| format!("unknown job type '{s}'"))
}

fn parse_work_type(s: &str) -> Result<WorkType, String> {
    WorkType::parse(s).ok_or_else(|| format!("unknown work type '{s}'"))
}

fn parse_experience(s: &str) -> Result<ExperienceLevel, String> {
    ExperienceLevel::parse(s).ok_or_else(|| format!("unknown experience level '{s}'"))
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [min_lat, min_lng, max_lat, max_lng] => Ok(BoundingBox { min_lat, min_lng, max_lat, max_lng }),
        _ => Err("expected minLat,minLng,maxLat,maxLng".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = load_context()?;
    let engine = open_engine(&ctx).await?;

    let output = match cli.command {
        Command::Search { query, page, size, filters, lat, lng, distance_km, text_weight, vector_weight, viewer } => {
            let params = SearchParams {
                query,
                page,
                size,
                filters: filters.into(),
                lat,
                lng,
                distance_km,
                text_weight,
                vector_weight,
            };
            serde_json::to_string_pretty(&engine.search(&params, viewer.as_deref()).await?)?
        }
        Command::Suggest { query, limit } => serde_json::to_string_pretty(&engine.suggest(&query, limit).await?)?,
        Command::Map { bbox, zoom, filters } => {
            let query = MapQuery { bbox, zoom, filters: filters.into() };
            serde_json::to_string_pretty(&engine.map(&query).await?)?
        }
    };
    println!("{output}");
    Ok(())
}
