//! Storepify management commands

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;
use storepify::apps::accounts::models::create_superuser;
use storepify::apps::store::StoreModels;
use storepify::config::settings::{Settings, get_settings};
use storepify::config::{logging, urls};
use storepify::MIGRATOR;
use storepify_db::Database;
use storepify_http::{HttpServer, ShutdownCoordinator};

const PASSWORD_VAR: &str = "STOREPIFY_SUPERUSER_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "manage")]
#[command(about = "Storepify management interface", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Apply migrations and serve the application
	Runserver {
		/// Address to bind, defaults to `bind_address` from settings
		#[arg(long, value_name = "ADDR")]
		addr: Option<SocketAddr>,
	},

	/// Apply database migrations
	Migrate,

	/// Create an active staff user
	Createsuperuser {
		#[arg(long, value_name = "USERNAME")]
		username: String,

		#[arg(long, value_name = "EMAIL", default_value = "")]
		email: String,

		/// Falls back to STOREPIFY_SUPERUSER_PASSWORD
		#[arg(long, value_name = "PASSWORD")]
		password: Option<String>,
	},

	/// Run system checks without starting the server
	Check,
}

async fn connect(settings: &Settings) -> anyhow::Result<Database> {
	let db = Database::connect(&settings.database.url, settings.database.max_connections)
		.await
		.with_context(|| format!("cannot open database {}", settings.database.url))?;
	db.run_migrations(&MIGRATOR).await.context("migration failed")?;
	Ok(db)
}

async fn runserver(settings: Settings, addr: Option<SocketAddr>) -> anyhow::Result<()> {
	let addr = match addr {
		Some(addr) => addr,
		None => settings
			.bind_address
			.parse()
			.with_context(|| format!("invalid bind_address '{}'", settings.bind_address))?,
	};
	let db = connect(&settings).await?;
	let app = urls::build_application(&settings, db)?;
	if settings.debug {
		tracing::warn!("debug mode is on; do not use this configuration in production");
	}

	let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
	coordinator.shutdown_on_ctrl_c();
	HttpServer::new(app.handler())
		.listen_with_shutdown(addr, coordinator)
		.await
		.context("server error")?;
	Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = get_settings().context("failed to load settings")?;
	logging::init(&settings.logging)?;

	match cli.command {
		Commands::Runserver { addr } => runserver(settings, addr).await?,
		Commands::Migrate => {
			connect(&settings).await?;
			println!("Migrations applied.");
		}
		Commands::Createsuperuser {
			username,
			email,
			password,
		} => {
			let password = match password {
				Some(password) => password,
				None => std::env::var(PASSWORD_VAR)
					.with_context(|| format!("pass --password or set {PASSWORD_VAR}"))?,
			};
			let db = connect(&settings).await?;
			let user = create_superuser(&db, &username, &email, &password)
				.await
				.map_err(|e| match e {
					storepify::apps::accounts::AuthError::Validation(errors) => {
						anyhow::anyhow!("invalid superuser: {}", serde_json::Value::Object(errors))
					}
					other => other.into(),
				})?;
			println!("Superuser '{}' created.", user.username);
		}
		Commands::Check => {
			urls::build_admin_site(&StoreModels::new(), &settings)?;
			println!("System check identified no issues.");
		}
	}
	Ok(())
}
