//! Command-line interface for lectern.
//!
//! Provides commands for serving the catalog over HTTP, dumping it as
//! JSON, browsing courses, and creating courses and chapters.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig};
use crate::library::{self, Catalog, Course, NewCourse};
use crate::server;

/// lectern - Filesystem-backed course catalog and media server
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Content root (overrides config file and LECTERN_CONTENT_ROOT)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the catalog as JSON
    Catalog {
        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List courses
    Courses {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Search title, description and instructor
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum number of courses to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show the chapters and lectures of a course
    Show {
        /// Course ID (directory name)
        course_id: String,
    },

    /// Create a course directory with a metadata record
    CreateCourse {
        /// Directory name, which becomes the course ID
        name: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        instructor: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        level: Option<String>,

        #[arg(long)]
        duration: Option<String>,
    },

    /// Create a chapter directory inside a course
    AddChapter {
        /// Course ID
        course_id: String,

        /// Chapter name
        name: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let mut cfg = config::load_config()?;
        if let Some(root) = self.root {
            cfg.content_root = root;
        }

        match self.command {
            Commands::Serve { host, port } => {
                if let Some(host) = host {
                    cfg.server.host = host;
                }
                if let Some(port) = port {
                    cfg.server.port = port;
                }
                server::start_server(cfg).await
            }
            Commands::Catalog { pretty } => print_catalog(&cfg, pretty).await,
            Commands::Courses {
                category,
                query,
                limit,
            } => list_courses(&cfg, category, query, limit).await,
            Commands::Show { course_id } => show_course(&cfg, &course_id).await,
            Commands::CreateCourse {
                name,
                title,
                description,
                instructor,
                category,
                level,
                duration,
            } => {
                let request = NewCourse {
                    name,
                    title,
                    description,
                    instructor,
                    category,
                    level,
                    duration,
                };
                let id = library::create_course(&cfg.content_root, request).await?;
                println!("Created course: {}", id);
                Ok(())
            }
            Commands::AddChapter { course_id, name } => {
                let chapter = library::create_chapter(&cfg.content_root, &course_id, &name).await?;
                println!("Created chapter: {}/{}", course_id, chapter);
                Ok(())
            }
            Commands::Config => {
                show_config(&cfg);
                Ok(())
            }
        }
    }
}

async fn build_catalog(cfg: &ResolvedConfig) -> Result<Catalog> {
    let catalog = Catalog::build(&cfg.content_root, &cfg.scan_options())
        .await
        .with_context(|| format!("Failed to scan {}", cfg.content_root.display()))?;

    for warning in &catalog.warnings {
        eprintln!(
            "warning: skipped {:?} {}: {}",
            warning.level,
            warning.path.display(),
            warning.reason
        );
    }

    Ok(catalog)
}

/// Print the course list exactly as `GET /api/courses` returns it
async fn print_catalog(cfg: &ResolvedConfig, pretty: bool) -> Result<()> {
    let catalog = build_catalog(cfg).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&catalog.courses)?
    } else {
        serde_json::to_string(&catalog.courses)?
    };
    println!("{}", json);

    Ok(())
}

async fn list_courses(
    cfg: &ResolvedConfig,
    category: Option<String>,
    query: Option<String>,
    limit: usize,
) -> Result<()> {
    let catalog = build_catalog(cfg).await?;

    if catalog.is_empty() {
        println!(
            "No courses found in {}. Use 'lectern create-course <name>' to add one.",
            cfg.content_root.display()
        );
        return Ok(());
    }

    let courses = catalog.query(query.as_deref(), category.as_deref());

    println!("{:<32} {:<16} {:>8} {:>8}", "ID", "CATEGORY", "CHAPTERS", "FILES");
    println!("{}", "-".repeat(67));

    for course in courses.iter().take(limit) {
        println!(
            "{:<32} {:<16} {:>8} {:>8}",
            truncate(&course.id, 32),
            truncate(&course.category, 16),
            course.chapters.len(),
            course.lecture_count()
        );
    }

    println!("\nShowing {} of {} courses", courses.len().min(limit), catalog.len());

    Ok(())
}

async fn show_course(cfg: &ResolvedConfig, course_id: &str) -> Result<()> {
    let course: Course = Catalog::build_course(&cfg.content_root, course_id, &cfg.scan_options())
        .await?
        .with_context(|| format!("Course not found: {}", course_id))?;

    println!("Course: {}", course.title);
    println!("ID: {}", course.id);
    if let Some(uid) = course.uid {
        println!("UID: {}", uid);
    }
    println!("Category: {}", course.category);
    if !course.instructor.is_empty() {
        println!("Instructor: {}", course.instructor);
    }
    if !course.description.is_empty() {
        println!("Description: {}", course.description);
    }
    if let Some(level) = &course.level {
        println!("Level: {}", level);
    }

    for chapter in &course.chapters {
        println!("\n{} ({} files)", chapter.name, chapter.lectures.len());
        for lecture in &chapter.lectures {
            println!(
                "  {:<6} {:>12}  {}",
                lecture.media_type.to_string(),
                lecture.size,
                lecture.url
            );
        }
    }

    Ok(())
}

fn show_config(cfg: &ResolvedConfig) {
    println!("Lectern Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Content root: {}", cfg.content_root.display());
    println!("Listen:       {}", cfg.address());
    println!();
    println!("Scan:");
    println!("  Mount:   /{}", cfg.scan.mount);
    if cfg.scan.timeout_seconds == 0 {
        println!("  Timeout: (none)");
    } else {
        println!("  Timeout: {}s", cfg.scan.timeout_seconds);
    }
    println!("  Ignore:  {}", cfg.scan.ignore_patterns.join(", "));
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
