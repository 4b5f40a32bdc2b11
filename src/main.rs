//! # Pagewright CLI (`pw`)
//!
//! The `pw` binary applies idempotent maintenance transforms to a directory
//! of static HTML articles and regenerates the derived artifacts (JSON
//! index, sitemap, RSS feed).
//!
//! ## Usage
//!
//! ```bash
//! pw --config ./pagewright.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pw list` | Show registered transforms, markers, and anchors |
//! | `pw apply <transform>` | Apply a transform (or `all`) across the content set |
//! | `pw related <slug>` | Preview ranked related links for one article |
//! | `pw meta <slug>` | Show extracted metadata for one article |
//! | `pw build` | Regenerate articles.json, sitemap.xml, and feed.xml |
//! | `pw validate` | Audit every article for required template elements |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pagewright::batch::{self, ApplyOptions};
use pagewright::config;
use pagewright::export;
use pagewright::validate;

/// Pagewright — idempotent batch maintenance for static content sites.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `pagewright.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pw",
    about = "Pagewright — idempotent batch maintenance for static content sites",
    version,
    long_about = "Pagewright applies named, idempotent HTML transforms (analytics tags, \
    newsletter CTAs, related-article blocks) across a directory of articles, using structural \
    anchors and atomic writes so a batch run can never corrupt a page."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./pagewright.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List registered transforms with their idempotency markers and
    /// anchor rules.
    List,

    /// Apply a named transform to the content set.
    ///
    /// Transforms are idempotent: documents already carrying the
    /// fragment's marker are skipped, and re-running a batch after a fix
    /// is always safe. Exit status is nonzero if any document errored.
    Apply {
        /// Transform name (see `pw list`) or `all` for the full sequence.
        transform: String,

        /// Narrow the target set with an extra glob (relative paths).
        #[arg(long)]
        glob: Option<String>,

        /// Report outcomes without writing any file.
        #[arg(long)]
        dry_run: bool,

        /// Ignore idempotency markers; regeneratable blocks are replaced.
        #[arg(long)]
        force: bool,

        /// Maximum number of documents to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Preview the ranked related links for one article slug.
    Related {
        /// Article slug (file stem).
        slug: String,
    },

    /// Show the metadata extracted from one article.
    Meta {
        /// Article slug (file stem).
        slug: String,
    },

    /// Regenerate articles.json, sitemap.xml, and feed.xml from content.
    Build,

    /// Audit every article for required template elements.
    ///
    /// Exit status is nonzero if any article fails a check.
    Validate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::List => {
            batch::run_list(&cfg)?;
        }
        Commands::Apply {
            transform,
            glob,
            dry_run,
            force,
            limit,
        } => {
            let summary = batch::run_apply(
                &cfg,
                &ApplyOptions {
                    transform,
                    glob,
                    dry_run,
                    force,
                    limit,
                },
            )?;
            if summary.has_errors() {
                std::process::exit(1);
            }
        }
        Commands::Related { slug } => {
            batch::run_related(&cfg, &slug)?;
        }
        Commands::Meta { slug } => {
            batch::run_meta(&cfg, &slug)?;
        }
        Commands::Build => {
            export::run_build(&cfg)?;
        }
        Commands::Validate => {
            let issues = validate::run_validate(&cfg)?;
            if !issues.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
