use axum::Router;
use clap::Parser;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paygate::config::Config;
use paygate::db::{create_pool, init_db, queries, AppState};
use paygate::handlers;
use paygate::models::ShippingRate;

#[derive(Parser, Debug)]
#[command(name = "paygate")]
#[command(about = "Payment-gateway bridge between a storefront and its payment processor")]
struct Cli {
    /// Delete order mappings whose storefront order was never placed, then exit
    #[arg(long)]
    prune_orphans: bool,

    /// Seed a shipping rate as country:method_id:label:amount:currency, then exit.
    /// May be repeated.
    #[arg(long = "seed-rate", value_name = "RATE")]
    seed_rates: Vec<String>,
}

fn parse_rate(raw: &str) -> Option<ShippingRate> {
    let mut parts = raw.splitn(5, ':');
    Some(ShippingRate {
        id: uuid::Uuid::new_v4().to_string(),
        country: parts.next()?.to_uppercase(),
        method_id: parts.next()?.to_string(),
        label: parts.next()?.to_string(),
        amount_minor: parts.next()?.parse().ok()?,
        currency: parts.next()?.to_uppercase(),
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paygate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    // Create database connection pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    if cli.prune_orphans {
        let conn = db_pool.get().expect("Failed to get connection");
        let count = queries::delete_orphaned_mappings(&conn)
            .expect("Failed to prune orphaned order mappings");
        tracing::info!("Pruned {} orphaned order mapping(s)", count);
        return;
    }

    if !cli.seed_rates.is_empty() {
        let conn = db_pool.get().expect("Failed to get connection");
        for raw in &cli.seed_rates {
            let rate = parse_rate(raw).unwrap_or_else(|| {
                eprintln!("Invalid --seed-rate value: {} (expected country:method_id:label:amount:currency)", raw);
                std::process::exit(1);
            });
            queries::insert_shipping_rate(&conn, &rate).expect("Failed to insert shipping rate");
            tracing::info!(
                "Seeded shipping rate {} for {} ({} {})",
                rate.method_id,
                rate.country,
                rate.amount_minor,
                rate.currency
            );
        }
        return;
    }

    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        http: reqwest::Client::new(),
    };

    tracing::info!("Running in {} mode", config.mode);

    // Build the application router
    let app = Router::new()
        // Checkout and order endpoints
        .merge(handlers::checkout::router())
        // Webhook endpoints (signature auth)
        .merge(handlers::webhooks::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Paygate server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
