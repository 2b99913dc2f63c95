// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Create a CMS administrator.
//!
//! Usage: `create_admin_user <first_name> <last_name> <email> <password>`
//!
//! Reads the same environment as the server (`DATABASE_URL`, `BCRYPT_COST`, ...).

use anyhow::{bail, Context};
use ronin_fitness::{config::Config, db::Database, db::Repositories, services::AdminService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [first_name, last_name, email, password] = args.as_slice() else {
        bail!("usage: create_admin_user <first_name> <last_name> <email> <password>");
    };
    if [first_name, last_name, email, password]
        .iter()
        .any(|a| a.trim().is_empty())
    {
        bail!("first_name, last_name, email and password are all required");
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let service = AdminService::new(&config, Repositories::sql(&db));
    let admin = service
        .create_admin(first_name, last_name, email, password)
        .await
        .context("Failed to create admin user")?;

    println!("Created admin user {} <{}>", admin.id, admin.email);
    Ok(())
}
