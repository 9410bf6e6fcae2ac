use anyhow::Context;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};

pub struct PostgresConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

/// Opens a connection and drives it on a background task.
/// The returned client is shared by all postgres repositories
pub async fn connect(config: &PostgresConfig) -> anyhow::Result<Client> {
    let connection_str = format!(
        "postgresql://{}:{}@{}",
        config.username, config.password, config.hostname
    );
    tracing::info!(
        "Postgres connection to {} as {}",
        config.hostname,
        config.username
    );
    let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
        .await
        .context("Failed to start postgres")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Postgres connection error: {}", e);
        }
    });

    Ok(client)
}

/// True for the unique constraint validation error
pub fn is_unique_violation(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

/// Builds an ILIKE pattern matching values starting with `prefix`,
/// wildcards in the prefix itself are matched literally
pub fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
