use clap::Subcommand;
use serde_json::json;

use crate::auth::password::hash_password_blocking;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DbPool;
use crate::services::{NewMobileUser, NewUser, UserService};
use crate::types::Role;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a back-office account")]
    Create {
        #[arg(long)]
        matricule: String,
        #[arg(long)]
        nom: String,
        #[arg(long)]
        prenoms: String,
        #[arg(long, help = "Role name, e.g. \"Admin\" or \"RESPONSABLE TECHNIQUE\"")]
        role: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
pub enum MobileUserCommands {
    #[command(about = "Create a field staff account")]
    Create {
        #[arg(long)]
        matricule: String,
        #[arg(long)]
        nom: String,
        #[arg(long)]
        prenoms: String,
        #[arg(long, help = "Job title; TECHNICIEN accounts may upload work orders")]
        fonction: String,
        #[arg(long)]
        password: String,
    },
}

pub async fn handle(cmd: UserCommands, pool: &DbPool, cost: u32, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            matricule,
            nom,
            prenoms,
            role,
            password,
        } => {
            let role: Role = role.parse()?;
            let service = UserService::new(pool.clone());
            let role_id = service.role_id_by_name(role.as_str()).await?;

            let id = service
                .create(&NewUser {
                    matricule: matricule.clone(),
                    nom,
                    prenoms,
                    role_id,
                    password_hash: hash_password_blocking(password, cost).await?,
                })
                .await?;

            output_success(
                output_format,
                &format!("Created user {} with role {}", matricule, role),
                Some(json!({ "id": id, "matricule": matricule, "role": role.as_str() })),
            )
        }
    }
}

pub async fn handle_mobile(
    cmd: MobileUserCommands,
    pool: &DbPool,
    cost: u32,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        MobileUserCommands::Create {
            matricule,
            nom,
            prenoms,
            fonction,
            password,
        } => {
            let id = UserService::new(pool.clone())
                .create_mobile(&NewMobileUser {
                    matricule: matricule.clone(),
                    nom,
                    prenoms,
                    fonction: fonction.trim().to_string(),
                    password_hash: hash_password_blocking(password, cost).await?,
                })
                .await?;

            output_success(
                output_format,
                &format!("Created mobile user {}", matricule),
                Some(json!({ "id": id, "matricule": matricule })),
            )
        }
    }
}
