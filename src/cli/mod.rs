pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use crate::config::config;
use crate::database::{DatabaseManager, DbPool};

#[derive(Parser)]
#[command(name = "gestion")]
#[command(about = "Gestion Travaux admin CLI - database and account maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Hash every plaintext password left in users and mobile_users")]
    MigratePasswords,

    #[command(about = "Back-office accounts")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Field staff accounts used by the mobile application")]
    MobileUser {
        #[command(subcommand)]
        cmd: commands::user::MobileUserCommands,
    },

    #[command(about = "List the roles that can be given to back-office accounts")]
    Roles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let settings = config();
    let cost = settings.security.bcrypt_cost;

    // Only `migrate` runs against an unmigrated database
    let pool: DbPool = match cli.command {
        Commands::Migrate => DatabaseManager::connect(&settings.database).await?,
        _ => DatabaseManager::init(&settings.database).await?,
    };

    match cli.command {
        Commands::Migrate => commands::db::migrate(&pool, output_format).await,
        Commands::MigratePasswords => commands::db::migrate_passwords(&pool, cost, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &pool, cost, output_format).await,
        Commands::MobileUser { cmd } => commands::user::handle_mobile(cmd, &pool, cost, output_format).await,
        Commands::Roles => commands::role::list(&pool, output_format).await,
    }
}
