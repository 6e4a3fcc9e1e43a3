use std::collections::BTreeSet;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use evidence_common::{CategoryKind, Config, SearchRequest, StanceDirection};
use evidence_scout::{EvidencePipeline, Stage};

#[derive(Parser)]
#[command(name = "evidence-scout", about = "Gather citable evidence for a debate topic")]
struct Cli {
    /// Debate topic, e.g. "학교에서 스마트폰 사용을 허용해야 한다"
    #[arg(long)]
    topic: String,

    /// Stance label shown to the student, e.g. "찬성"
    #[arg(long, default_value = "")]
    stance: String,

    #[arg(long, value_enum, default_value_t = DirectionArg::None)]
    direction: DirectionArg,

    /// Repeat to request several categories (default: news and video)
    #[arg(long = "category", value_enum)]
    categories: Vec<CategoryArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Supporting,
    Opposing,
    None,
}

impl From<DirectionArg> for StanceDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Supporting => StanceDirection::Supporting,
            DirectionArg::Opposing => StanceDirection::Opposing,
            DirectionArg::None => StanceDirection::Unspecified,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    News,
    Video,
}

impl From<CategoryArg> for CategoryKind {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::News => CategoryKind::NewsArticle,
            CategoryArg::Video => CategoryKind::EducationalVideo,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("evidence=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pipeline = EvidencePipeline::from_config(&config)?;

    let categories: BTreeSet<CategoryKind> = if cli.categories.is_empty() {
        CategoryKind::ACTIVE.into_iter().collect()
    } else {
        cli.categories.into_iter().map(CategoryKind::from).collect()
    };
    let request = SearchRequest::builder()
        .topic(cli.topic)
        .stance_label(cli.stance)
        .stance_direction(cli.direction.into())
        .requested_categories(categories)
        .build();

    info!(topic = request.topic(), "Evidence search starting");

    let progress = |stage: Stage| eprintln!("[{}/5] {}", stage.number(), stage.label());
    let items = pipeline.run(&request, Some(&progress)).await?;

    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}
