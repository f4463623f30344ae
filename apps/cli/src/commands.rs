//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use draftdeck_core::{GenerateContentRequest, ProgressReporter, SectionRef, projects};
use draftdeck_gateway::{GatewayClient, GatewayOptions};
use draftdeck_http::{HttpServer, Router};
use draftdeck_shared::{AppConfig, User, init_config, load_config};
use draftdeck_storage::Storage;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DraftDeck: draft business documents and slide decks with an AI gateway.
#[derive(Parser)]
#[command(
    name = "draftdeck",
    version,
    about = "Draft, refine and export business documents and slide decks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the HTTP API.
    Serve {
        /// Listen address (overrides `server.bind`).
        #[arg(long)]
        bind: Option<String>,

        /// Database file (overrides `database.path`).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// User administration.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Work with a user's projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum UserAction {
    /// Create a user and print their API token.
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub(crate) enum ProjectAction {
    /// List projects, newest first.
    List {
        #[arg(long)]
        email: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Draft content for every section of a project.
    Generate {
        #[arg(long)]
        email: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Write the project as a .docx or .pptx file.
    Export {
        #[arg(long)]
        email: String,
        #[arg(long)]
        project: String,
        /// Output path (defaults to a name derived from the topic).
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "draftdeck=info",
        1 => "draftdeck=debug",
        _ => "draftdeck=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { bind, db } => cmd_serve(bind, db.as_deref()).await,
        Command::User { action } => match action {
            UserAction::Add { email, db } => cmd_user_add(&email, db.as_deref()).await,
        },
        Command::Project { action } => match action {
            ProjectAction::List { email, db } => cmd_project_list(&email, db.as_deref()).await,
            ProjectAction::Generate { email, project, db } => {
                cmd_project_generate(&email, &project, db.as_deref()).await
            }
            ProjectAction::Export {
                email,
                project,
                out,
                db,
            } => cmd_project_export(&email, &project, out.as_deref(), db.as_deref()).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn open_storage(config: &AppConfig, db: Option<&Path>) -> Result<Storage> {
    let path = match db {
        Some(path) => path.to_path_buf(),
        None => config.database.resolved_path()?,
    };
    info!(path = %path.display(), "opening database");
    Ok(Storage::open(&path).await?)
}

async fn require_user(storage: &Storage, email: &str) -> Result<User> {
    storage
        .user_by_email(email)
        .await?
        .ok_or_else(|| eyre!("no user with email '{email}'; create one with `draftdeck user add`"))
}

fn gateway(config: &AppConfig) -> Result<GatewayClient> {
    let options = GatewayOptions::from_config(&config.gateway)?;
    Ok(GatewayClient::new(options)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(bind: Option<String>, db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    // Fail before binding if the key is missing.
    let client = gateway(&config)?;
    let storage = Arc::new(open_storage(&config, db).await?);

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let server = HttpServer::bind(&bind)?;
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            shutdown.shutdown();
        }
    });

    info!(model = client.model(), "gateway configured");
    let router = Router::new(storage, client, config.server.allowed_origin.clone());
    println!("DraftDeck API listening on http://{bind} (Ctrl-C to stop)");
    server.run(router).await?;
    Ok(())
}

async fn cmd_user_add(email: &str, db: Option<&Path>) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(eyre!("email must not be empty"));
    }
    let config = load_config()?;
    let storage = open_storage(&config, db).await?;
    let (user, token) = storage.create_user(email).await?;

    println!();
    println!("  User created.");
    println!("  ID:    {}", user.id);
    println!("  Email: {}", user.email);
    println!("  Token: {token}");
    println!();
    println!("  The token is shown only once. Send it as `Authorization: Bearer <token>`.");
    println!();
    Ok(())
}

async fn cmd_project_list(email: &str, db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config, db).await?;
    let user = require_user(&storage, email).await?;
    let list = projects::list_projects(&storage, &user.id).await?;

    if list.is_empty() {
        println!("No projects for {email}.");
        return Ok(());
    }
    for project in list {
        println!(
            "{}  {:<4}  {:<10}  {}  {}",
            project.id,
            project.document_kind.as_str(),
            project.status.as_str(),
            project.created_at.format("%Y-%m-%d %H:%M"),
            project.topic
        );
    }
    Ok(())
}

async fn cmd_project_generate(email: &str, project_id: &str, db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let client = gateway(&config)?;
    let storage = open_storage(&config, db).await?;
    let user = require_user(&storage, email).await?;

    let current = projects::get_project(&storage, &user.id, project_id).await?;
    let request = GenerateContentRequest {
        project_id: current.project.id.clone(),
        topic: current.project.topic.clone(),
        document_type: current.project.document_kind,
        sections: current
            .sections
            .iter()
            .map(|s| SectionRef {
                id: s.id.clone(),
                title: s.title.clone(),
            })
            .collect(),
    };

    let progress = CliProgress::new();
    let result =
        draftdeck_core::generate_content(&storage, &client, &user.id, &request, &progress).await;
    progress.spinner.finish_and_clear();
    result?;

    println!(
        "Drafted {} {}s for \"{}\".",
        request.sections.len(),
        request.document_type.unit_name(),
        request.topic
    );
    Ok(())
}

async fn cmd_project_export(
    email: &str,
    project_id: &str,
    out: Option<&Path>,
    db: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config, db).await?;
    let user = require_user(&storage, email).await?;

    let file = projects::export_project(&storage, &user.id, project_id).await?;
    let path = out.map_or_else(|| PathBuf::from(&file.file_name), Path::to_path_buf);
    std::fs::write(&path, &file.bytes)
        .map_err(|e| eyre!("failed to write {}: {e}", path.display()))?;

    println!("Wrote {} ({} bytes)", path.display(), file.bytes.len());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner showing which section is being drafted.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn section_started(&self, index: usize, total: usize, title: &str) {
        self.spinner
            .set_message(format!("Drafting [{}/{total}] {title}", index + 1));
    }

    fn finished(&self, total: usize) {
        self.spinner.set_message(format!("Saving {total} drafts"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["draftdeck", "-vv", "serve", "--bind", "0.0.0.0:9000"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Serve { bind, db } => {
                assert_eq!(bind.as_deref(), Some("0.0.0.0:9000"));
                assert!(db.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parses_project_export() {
        let cli = Cli::try_parse_from([
            "draftdeck",
            "project",
            "export",
            "--email",
            "a@example.com",
            "--project",
            "p1",
            "-o",
            "deck.pptx",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        match cli.command {
            Command::Project {
                action: ProjectAction::Export { project, out, .. },
            } => {
                assert_eq!(project, "p1");
                assert_eq!(out, Some(PathBuf::from("deck.pptx")));
            }
            _ => panic!("expected project export"),
        }
    }

    #[test]
    fn user_add_requires_email() {
        assert!(Cli::try_parse_from(["draftdeck", "user", "add"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
