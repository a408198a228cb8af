//! Teamgrid CLI - operator tool for the access-propagation engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use teamgrid_db::entities::team_member;
use teamgrid_engine::{AccessEngine, ManagerGraph, MAX_MANAGER_DEPTH};

mod seed;

/// Teamgrid - derived team access over an org chart
#[derive(Parser, Debug)]
#[command(name = "teamgrid")]
#[command(about = "Maintain and inspect derived team access", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database URL (sqlite or postgres)
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://teamgrid.db?mode=rwc"
    )]
    database_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Populate a sample organization through the engine
    Seed,
    /// Add a user to a team as a direct member
    AddMember {
        /// User UUID
        user: Uuid,
        /// Team UUID
        team: Uuid,
    },
    /// Remove a user's direct team membership
    RemoveMember {
        /// User UUID
        user: Uuid,
        /// Team UUID
        team: Uuid,
    },
    /// Record that a manager manages a user
    AssignManager {
        /// Managed user UUID
        user: Uuid,
        /// Manager UUID
        manager: Uuid,
    },
    /// Delete a manager relationship
    RemoveManager {
        /// Managed user UUID
        user: Uuid,
        /// Manager UUID
        manager: Uuid,
    },
    /// Make a resource visible to a team
    AssignResource {
        /// Team UUID
        team: Uuid,
        /// Resource UUID
        resource: Uuid,
    },
    /// Remove a resource from a team
    RemoveResource {
        /// Team UUID
        team: Uuid,
        /// Resource UUID
        resource: Uuid,
    },
    /// List a team's members and how they got access
    Members {
        /// Team UUID
        team: Uuid,
    },
    /// List the teams a user belongs to
    Teams {
        /// User UUID
        user: Uuid,
    },
    /// Show a user's upward management chain
    Chain {
        /// User UUID
        user: Uuid,
    },
    /// List everyone who can see a resource
    Accessors {
        /// Resource UUID
        resource: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let db = teamgrid_db::connect(&cli.database_url)
        .await
        .with_context(|| format!("connecting to {}", cli.database_url))?;

    match cli.command {
        Commands::Migrate => {
            teamgrid_db::migrate(&db).await.context("running migrations")?;
            println!("migrations applied");
        }
        Commands::Seed => {
            teamgrid_db::migrate(&db).await.context("running migrations")?;
            seed::run(&db).await?;
        }
        Commands::AddMember { user, team } => {
            print_log(AccessEngine::new(db).add_user_to_team(user, team).await?);
        }
        Commands::RemoveMember { user, team } => {
            print_log(
                AccessEngine::new(db)
                    .remove_user_from_team(user, team)
                    .await?,
            );
        }
        Commands::AssignManager { user, manager } => {
            print_log(AccessEngine::new(db).assign_manager(user, manager).await?);
        }
        Commands::RemoveManager { user, manager } => {
            print_log(AccessEngine::new(db).remove_manager(user, manager).await?);
        }
        Commands::AssignResource { team, resource } => {
            print_log(
                AccessEngine::new(db)
                    .assign_resource_to_team(team, resource)
                    .await?,
            );
        }
        Commands::RemoveResource { team, resource } => {
            print_log(
                AccessEngine::new(db)
                    .remove_resource_from_team(team, resource)
                    .await?,
            );
        }
        Commands::Members { team } => {
            print_rows(AccessEngine::new(db).members_of(team).await?)?;
        }
        Commands::Teams { user } => {
            print_rows(AccessEngine::new(db).teams_of(user).await?)?;
        }
        Commands::Chain { user } => {
            let graph = ManagerGraph::load(&db).await.context("loading org chart")?;
            for link in graph.managers_of(user, MAX_MANAGER_DEPTH) {
                println!(
                    "{}: {} (via {})",
                    link.depth, link.manager_id, link.via
                );
            }
        }
        Commands::Accessors { resource } => {
            print_rows(AccessEngine::new(db).accessors_of(resource).await?)?;
        }
    }

    Ok(())
}

fn print_log(log: Vec<String>) {
    for line in log {
        println!("{line}");
    }
}

fn print_rows(rows: Vec<team_member::Model>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
