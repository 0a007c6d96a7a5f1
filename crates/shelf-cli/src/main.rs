mod console;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use shelf_core::backup;
use shelf_core::config::ShelfConfig;
use shelf_core::context::RunContext;
use shelf_core::model::MediaKind;
use shelf_core::pipeline::{self, Pipeline, RunSummary};
use shelf_core::poster::PosterFetcher;
use shelf_core::prompt::{NonInteractive, Prompter};
use shelf_core::provider::{MetadataProvider, Provider};
use shelf_core::vault::Vault;
use tracing_subscriber::EnvFilter;

use crate::console::{read_titles, ConsolePrompter};

#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Shelf: canonical names, metadata and consistent wikilinks for Obsidian media notes",
    version
)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct VaultArgs {
    /// Path to the Obsidian vault
    vault: PathBuf,
    /// Backup archive to write before changing anything (a directory gets a timestamped name)
    backup: PathBuf,
    /// Skip every ambiguous choice instead of prompting
    #[arg(long)]
    non_interactive: bool,
    /// Report what would change without touching the vault
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create notes for titles read from stdin, one per line
    Add {
        #[command(flatten)]
        args: VaultArgs,
        /// Media kind of the titles (movie, tv, game, album)
        #[arg(long, alias = "media-type")]
        kind: MediaKind,
    },
    /// Rename unresolved notes to "Title (Year)" and add metadata
    Resolve {
        #[command(flatten)]
        args: VaultArgs,
        /// Media kinds to resolve
        #[arg(long = "kind", value_delimiter = ',', default_values = ["movie", "tv"])]
        kinds: Vec<MediaKind>,
    },
    /// Point bare-title wikilinks at canonical "Title (Year)" notes
    FixLinks {
        #[command(flatten)]
        args: VaultArgs,
    },
    /// Download poster images for notes without one
    Posters {
        #[command(flatten)]
        args: VaultArgs,
        /// Media kinds to fetch posters for
        #[arg(long = "kind", value_delimiter = ',', default_values = ["movie", "tv"])]
        kinds: Vec<MediaKind>,
        /// Download again even when a poster is already set
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    run(cli.command).await
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Add { args, kind } => cmd_add(&args, kind).await,
        Command::Resolve { args, kinds } => cmd_resolve(&args, &kinds).await,
        Command::FixLinks { args } => cmd_fix_links(&args),
        Command::Posters {
            args,
            kinds,
            refresh,
        } => cmd_posters(&args, &kinds, refresh).await,
    }
}

/// Vault, config and run state shared by every command.
struct Session {
    vault: Vault,
    config: ShelfConfig,
    ctx: RunContext,
}

impl Session {
    fn open(args: &VaultArgs) -> Result<Self> {
        if !args.vault.is_dir() {
            bail!("vault path is not a directory: {}", args.vault.display());
        }
        let config = ShelfConfig::load(Some(&args.vault)).context("failed to load config")?;
        let vault = Vault::new(&args.vault, &config.vault);
        let ctx = RunContext::new().with_dry_run(args.dry_run);
        Ok(Self { vault, config, ctx })
    }

    fn providers(&self, kinds: &[MediaKind]) -> Result<Vec<Provider>> {
        let mut providers = Vec::new();
        for &kind in kinds {
            if providers.iter().any(|p: &Provider| p.kind() == kind) {
                continue;
            }
            let provider = Provider::from_config(kind, &self.config)
                .with_context(|| format!("cannot search {kind} metadata"))?;
            providers.push(provider);
        }
        Ok(providers)
    }

    /// Archive the vault before the first change. Dry runs change nothing.
    fn backup(&self, args: &VaultArgs) -> Result<()> {
        if args.dry_run {
            println!("{}", "Dry run: no backup, no changes.".dimmed());
            return Ok(());
        }
        let dest = backup::backup_destination(&args.backup);
        let summary = backup::create_backup(self.vault.root(), &dest)
            .with_context(|| format!("backup to {} failed", dest.display()))?;
        println!(
            "{} {} ({} files)",
            "Backup:".dimmed(),
            summary.path.display(),
            summary.files
        );
        Ok(())
    }
}

fn prompter(args: &VaultArgs, stdin_is_data: bool) -> Box<dyn Prompter> {
    if args.non_interactive {
        Box::new(NonInteractive)
    } else {
        Box::new(ConsolePrompter::new(stdin_is_data))
    }
}

async fn cmd_add(args: &VaultArgs, kind: MediaKind) -> Result<()> {
    let mut session = Session::open(args)?;
    let provider = Provider::from_config(kind, &session.config)
        .with_context(|| format!("cannot search {kind} metadata"))?;

    let titles = read_titles(std::io::stdin()).context("failed to read titles from stdin")?;
    if titles.is_empty() {
        bail!("no titles on stdin (one title per line)");
    }
    println!("{} {} title(s) via {}", "Adding".bold(), titles.len(), provider.name().cyan());

    session.backup(args)?;
    let mut prompter = prompter(args, true);
    let pipeline = Pipeline::new(&provider, &session.vault, &session.config);
    let summary = pipeline
        .add_titles(&titles, &mut session.ctx, prompter.as_mut())
        .await?;

    print_summary("add", &summary, "created");
    Ok(())
}

async fn cmd_resolve(args: &VaultArgs, kinds: &[MediaKind]) -> Result<()> {
    let mut session = Session::open(args)?;
    let providers = session.providers(kinds)?;
    session.backup(args)?;

    let mut prompter = prompter(args, false);
    let mut total = RunSummary::default();
    for provider in &providers {
        println!(
            "{} {} notes via {}",
            "Resolving".bold(),
            provider.kind(),
            provider.name().cyan()
        );
        let pipeline = Pipeline::new(provider, &session.vault, &session.config);
        let summary = pipeline
            .resolve_documents(&mut session.ctx, prompter.as_mut())
            .await?;
        total.merge(&summary);
    }

    for rename in session.ctx.renames() {
        println!(
            "  {} {} {} {}",
            "renamed".green(),
            rename.old_identity.raw_name(),
            "->".dimmed(),
            rename.new_identity.stem()
        );
    }
    print_summary("resolve", &total, "renamed");
    Ok(())
}

fn cmd_fix_links(args: &VaultArgs) -> Result<()> {
    let mut session = Session::open(args)?;
    session.backup(args)?;

    let mut prompter = prompter(args, false);
    let summary = pipeline::fix_links(&session.vault, &mut session.ctx, prompter.as_mut())?;
    print_summary("fix-links", &summary, "relinked");
    Ok(())
}

async fn cmd_posters(args: &VaultArgs, kinds: &[MediaKind], refresh: bool) -> Result<()> {
    let mut session = Session::open(args)?;
    if refresh {
        session.config.posters.refresh = true;
    }
    let providers = session.providers(kinds)?;
    let fetcher = PosterFetcher::new(&session.config.posters)?;
    session.backup(args)?;

    let mut prompter = prompter(args, false);
    let mut total = RunSummary::default();
    for provider in &providers {
        println!(
            "{} for {} notes via {}",
            "Fetching posters".bold(),
            provider.kind(),
            provider.name().cyan()
        );
        let pipeline = Pipeline::new(provider, &session.vault, &session.config);
        let summary = pipeline
            .fetch_posters(&fetcher, &mut session.ctx, prompter.as_mut())
            .await?;
        total.merge(&summary);
    }
    print_summary("posters", &total, "downloaded");
    Ok(())
}

fn print_summary(command: &str, summary: &RunSummary, changed_label: &str) {
    println!();
    println!("{}", format!("{command} summary").bold());
    println!("  {:<16} {}", "Examined:".dimmed(), summary.examined);
    if command == "fix-links" {
        println!("  {:<16} {}", format!("{}:", capitalize(changed_label)).dimmed(), summary.notes_relinked.green());
    } else {
        println!("  {:<16} {}", format!("{}:", capitalize(changed_label)).dimmed(), summary.changed.green());
        println!("  {:<16} {}", "Skipped:".dimmed(), summary.skipped.yellow());
    }
    if summary.failed > 0 {
        println!("  {:<16} {}", "Failed:".dimmed(), summary.failed.red());
    }
    if summary.links_updated > 0 || summary.ambiguous_links > 0 {
        println!(
            "  {:<16} {} in {} notes",
            "Links updated:".dimmed(),
            summary.links_updated.green(),
            summary.notes_relinked
        );
    }
    if summary.ambiguous_links > 0 {
        println!(
            "  {:<16} {}",
            "Ambiguous kept:".dimmed(),
            summary.ambiguous_links.yellow()
        );
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
