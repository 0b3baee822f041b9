mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ContentCommands, CurationCommands, HighlightCommands, VideoCommands};
use curation::config::Settings;
use curation::types::{ContentMetadataInsert, ContentType};
use curation::Curation;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("curation=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url.clone() {
        settings.database_url = Some(url);
    }

    let app = Curation::connect(settings, true).await?;

    match cli.command {
        Commands::Migrate => {
            // connect already applied them
            println!("Migrations applied");
        }
        Commands::Content { command } => match command {
            ContentCommands::Load { file } => {
                let raw = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("reading {}", file.display()))?;
                let records: Vec<ContentMetadataInsert> = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", file.display()))?;
                let n = app.load_content(&records).await?;
                println!("Loaded {n} records");
            }
            ContentCommands::Show { key, content_type } => {
                let content_type: ContentType = content_type.parse()?;
                let record = app.get_content(&key, content_type).await?;
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            ContentCommands::Delete { key, content_type } => {
                let content_type: ContentType = content_type.parse()?;
                app.delete_content(&key, content_type).await?;
                println!("Deleted {content_type} {key}");
            }
            ContentCommands::Children { key } => {
                for child in app.child_records(&key).await? {
                    println!("{}\t{}\t{}", child.content_key, child.content_type, child.title().unwrap_or(""));
                }
            }
        },
        Commands::Curation { command } => match command {
            CurationCommands::Init { enterprise, title } => {
                let config = app.get_or_create_curation(&enterprise, &title).await?;
                println!("Curation {} for enterprise {}", config.uuid, config.enterprise_uuid);
            }
            CurationCommands::Activate { enterprise, off } => {
                app.set_highlight_feature_active(&enterprise, !off).await?;
                println!("Highlights {} for enterprise {}", if off { "disabled" } else { "enabled" }, enterprise);
            }
        },
        Commands::Highlights { command } => match command {
            HighlightCommands::Create { enterprise, title, published } => {
                let set = app.create_highlight_set(&enterprise, &title, published).await?;
                println!("{}", set.uuid);
            }
            HighlightCommands::Add { set, keys } => {
                let added = app.add_highlighted_content(&set, &keys).await?;
                println!("Added {} of {} keys", added.len(), keys.len());
            }
            HighlightCommands::Remove { set, key } => {
                let removed = app.remove_highlighted_content(&set, &key).await?;
                println!("Removed {removed} entries");
            }
            HighlightCommands::Show { set } => {
                let view = app.highlight_set(&set).await?;
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            HighlightCommands::List { enterprise } => {
                let views = app.highlight_sets(&enterprise).await?;
                println!("{}", serde_json::to_string_pretty(&views)?);
            }
            HighlightCommands::Publish { set, unpublish } => {
                app.publish_highlight_set(&set, !unpublish).await?;
                println!("Set {set} {}", if unpublish { "unpublished" } else { "published" });
            }
            HighlightCommands::Delete { set } => {
                app.delete_highlight_set(&set).await?;
                println!("Deleted set {set}");
            }
        },
        Commands::Videos { command } => match command {
            VideoCommands::Fetch { courses } => {
                let n = app.fetch_videos(&courses).await?;
                println!("Stored {n} videos");
            }
            VideoCommands::FetchRun { course_run } => {
                let n = app.fetch_course_video_metadata(&course_run).await?;
                println!("Stored {n} videos");
            }
            VideoCommands::List { course_run } => {
                for video in app.course_run_videos(&course_run).await? {
                    println!("{}\t{}", video.edx_video_id, video.client_video_id);
                }
            }
            VideoCommands::Summarize { video, language } => {
                println!("{}", app.generate_video_summary(&video, &language).await?);
            }
            VideoCommands::Title { video } => {
                let video = app.get_video(&video).await?;
                println!("{}", app.generate_video_title(&video.transcript_urls()).await?);
            }
        },
    }
    Ok(())
}
