use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Enterprise catalog curation: highlight sets, course videos and transcript summaries
#[derive(Parser)]
#[command(name = "curation")]
#[command(about = "Manage highlighted catalog content and course-run videos", long_about = None)]
pub struct Cli {
    /// Database URL (defaults to a SQLite file in the user data dir)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Config file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,
    /// Content metadata records
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
    /// Enterprise curation settings
    Curation {
        #[command(subcommand)]
        command: CurationCommands,
    },
    /// Highlight sets
    Highlights {
        #[command(subcommand)]
        command: HighlightCommands,
    },
    /// Course-run videos
    Videos {
        #[command(subcommand)]
        command: VideoCommands,
    },
}

#[derive(Subcommand)]
pub enum ContentCommands {
    /// Upsert records from a JSON file holding an array of content records
    Load { file: PathBuf },
    /// Show one record
    Show {
        key: String,
        #[arg(long, default_value = "course")]
        content_type: String,
    },
    /// List records whose parent is KEY
    Children { key: String },
    /// Delete one record with its highlights and videos
    Delete {
        key: String,
        #[arg(long, default_value = "course")]
        content_type: String,
    },
}

#[derive(Subcommand)]
pub enum CurationCommands {
    /// Create the curation config for an enterprise if missing
    Init {
        enterprise: String,
        #[arg(long, default_value = "Highlights")]
        title: String,
    },
    /// Turn the highlight feature on or off
    Activate {
        enterprise: String,
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
pub enum HighlightCommands {
    /// Create a highlight set
    Create {
        enterprise: String,
        title: String,
        #[arg(long)]
        published: bool,
    },
    /// Add content keys to a set
    Add {
        set: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Remove a content key from a set
    Remove { set: String, key: String },
    /// Show one set with its content
    Show { set: String },
    /// List the sets of an enterprise
    List { enterprise: String },
    /// Publish or unpublish a set
    Publish {
        set: String,
        #[arg(long)]
        unpublish: bool,
    },
    /// Delete a set and its content
    Delete { set: String },
}

#[derive(Subcommand)]
pub enum VideoCommands {
    /// Fetch videos for courses through their first known run
    Fetch {
        #[arg(required = true)]
        courses: Vec<String>,
    },
    /// Fetch videos for one course run
    FetchRun { course_run: String },
    /// List stored videos of a course run
    List { course_run: String },
    /// Summarize a stored video's transcript
    Summarize {
        video: String,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Generate a title from a stored video's English transcript
    Title { video: String },
}
