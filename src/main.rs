// library system

use std::sync::Arc;

use lsys::{notify::Notifier, notify::WhatsApp, routes, sql, Config, Library};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(json: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer().json())
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer())
			.init();
	}
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "cannot listen for ctrl-c");
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config = Config::from_env()?;
	init_tracing(config.log_json);
	if let Some(err) = &config.env_file_error {
		tracing::warn!(error = %err, "ignoring unreadable .env");
	}

	let db = sql::open(&config.database_url, config.max_connections).await?;
	sql::migrate(&db).await?;
	if config.seed {
		sql::seed(&db, chrono::Utc::now()).await?;
	}

	let notifier = match config.whatsapp.clone() {
		Some(whatsapp) => {
			tracing::info!(phone_id = %whatsapp.phone_id, "whatsapp alerts enabled");
			Notifier::WhatsApp(WhatsApp::new(whatsapp)?)
		}
		None => {
			tracing::info!("no whatsapp credentials, alerts go to the log only");
			Notifier::Log
		}
	};

	let app = routes::app(Arc::new(Library::new(db, notifier)));

	let listener = tokio::net::TcpListener::bind(config.bind).await?;
	tracing::info!(addr = %config.bind, "listening");
	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;
	Ok(())
}
