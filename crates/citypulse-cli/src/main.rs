use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use citypulse_infrastructure::logging::init_logging;
use citypulse_infrastructure::{CityPulsePaths, ConfigService};

mod commands;

use commands::App;

#[derive(Parser)]
#[command(name = "citypulse")]
#[command(about = "CityPulse console - drive the client stores from a terminal", long_about = None)]
struct Cli {
    /// Use this directory instead of ~/.config/citypulse
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Signup {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Forget the session
    Logout,
    /// Mail a password-recovery link
    ForgotPassword {
        email: String,
        /// Where the link in the mail leads
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// Change the password of the signed-in user
    SetPassword {
        #[arg(long)]
        password: String,
    },
    /// Show the current session
    Whoami,
    /// Save the home city of the signed-in user
    SetCity { city: String },
    /// Browse the location catalog
    Cities {
        #[command(subcommand)]
        action: CitiesAction,
    },
    /// Show content feeds
    Feed {
        #[command(subcommand)]
        action: FeedAction,
    },
    /// Manage your own events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },
    /// Manage the profile picture
    Avatar {
        #[command(subcommand)]
        action: AvatarAction,
    },
}

#[derive(Subcommand)]
enum CitiesAction {
    /// Walk the full catalog
    List {
        /// Country code filter (e.g. RO)
        #[arg(long)]
        country: Option<String>,
        /// First-level division filter
        #[arg(long)]
        division1: Option<String>,
    },
    /// Search cities by name
    Search {
        term: String,
        /// Save the N-th result (1-based) as your city
        #[arg(long)]
        pick: Option<usize>,
    },
}

#[derive(Subcommand)]
enum FeedAction {
    /// Events in a city (defaults to your saved city)
    Events {
        #[arg(long)]
        city: Option<String>,
    },
    /// Latest videos
    Videos,
}

#[derive(Subcommand)]
enum EventsAction {
    /// List events you organize
    Mine,
    /// Create an event
    Add {
        name: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        location: String,
        /// Defaults to your saved city
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete one of your events
    Delete { id: String },
}

#[derive(Subcommand)]
enum AvatarAction {
    /// Upload an image file as profile picture
    Upload {
        path: PathBuf,
        /// The file holds base64 text rather than raw bytes
        #[arg(long)]
        base64: bool,
        #[arg(long)]
        content_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = CityPulsePaths::new(cli.config_dir.clone()).context("Failed to resolve paths")?;
    let config = ConfigService::new(paths.clone())
        .get_config()
        .context("Failed to load configuration")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.client.log_level.clone());
    init_logging(&level)?;
    tracing::debug!("[Config] Using {}", paths.config_file().display());

    let app = App::new(paths, config, cli.json);

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&app, &email, &password).await?
        }
        Commands::Signup {
            email,
            password,
            first_name,
            last_name,
        } => commands::session::signup(&app, &email, &password, first_name, last_name).await?,
        Commands::Logout => commands::session::logout(&app).await?,
        Commands::ForgotPassword { email, redirect_to } => {
            commands::session::forgot_password(&app, &email, redirect_to.as_deref()).await?
        }
        Commands::SetPassword { password } => {
            commands::session::set_password(&app, &password).await?
        }
        Commands::Whoami => commands::session::whoami(&app).await?,
        Commands::SetCity { city } => commands::session::set_city(&app, &city).await?,
        Commands::Cities { action } => match action {
            CitiesAction::List { country, division1 } => {
                commands::cities::list(&app, country, division1).await?
            }
            CitiesAction::Search { term, pick } => {
                commands::cities::search(&app, &term, pick).await?
            }
        },
        Commands::Feed { action } => match action {
            FeedAction::Events { city } => commands::feed::events(&app, city).await?,
            FeedAction::Videos => commands::feed::videos(&app).await?,
        },
        Commands::Events { action } => match action {
            EventsAction::Mine => commands::events::mine(&app).await?,
            EventsAction::Add {
                name,
                start,
                end,
                location,
                city,
                website,
                description,
            } => {
                let draft = commands::events::Draft {
                    name,
                    start,
                    end,
                    location,
                    city,
                    website,
                    description,
                };
                commands::events::add(&app, draft).await?
            }
            EventsAction::Delete { id } => commands::events::delete(&app, &id).await?,
        },
        Commands::Avatar { action } => match action {
            AvatarAction::Upload {
                path,
                base64,
                content_type,
            } => commands::avatar::upload(&app, &path, base64, content_type).await?,
        },
    }

    Ok(())
}
