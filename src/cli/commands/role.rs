use crate::cli::utils::output_collection;
use crate::cli::OutputFormat;
use crate::database::DbPool;
use crate::services::UserService;

pub async fn list(pool: &DbPool, output_format: OutputFormat) -> anyhow::Result<()> {
    let roles = UserService::new(pool.clone()).roles().await?;
    output_collection(output_format, "roles", &roles, "No roles defined", |role| {
        format!("{:>4}  {}", role.id, role.name)
    })
}
