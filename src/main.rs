mod cart;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod pricing;
mod state;
mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use dotenvy::dotenv;

use config::Config;
use database::{create_database_pool, ensure_admin, run_migrations};
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let db = create_database_pool(&config.database_url, config.max_connections).await?;
    run_migrations(&db).await?;

    if let Some(seed) = &config.admin {
        ensure_admin(&db, seed, config.bcrypt_cost).await?;
    }

    let addr = config.bind_address();
    let app = create_router(AppState::new(db, config));

    log::info!("Mandi server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Auth
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))

        // Products
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )

        // Cart and orders
        .route("/cart/quote", post(handlers::cart::quote))
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::place_order),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/status", patch(handlers::orders::update_order_status))

        // Supply side
        .route(
            "/supply-offers",
            get(handlers::supply::list_offers).post(handlers::supply::create_offer),
        )
        .route("/supply-offers/:id/status", patch(handlers::supply::update_offer_status))
        .route("/daily-demand", get(handlers::demand::daily_demand))

        // Special requests
        .route(
            "/special-requests",
            get(handlers::special_requests::list_requests)
                .post(handlers::special_requests::create_request),
        )
        .route("/special-requests/vendor", get(handlers::special_requests::vendor_requests))
        .route(
            "/special-requests/:id/respond",
            post(handlers::special_requests::respond_to_request),
        )
        .route(
            "/special-requests/:id/responses/:response_id",
            patch(handlers::special_requests::decide_response),
        )
        .route("/special-requests/:id/cancel", patch(handlers::special_requests::cancel_request))

        // Admin
        .route("/admin/users", get(handlers::admin::users_list))
        .route("/admin/users/:id/status", patch(handlers::admin::update_user_status))
        .route("/admin/orders", get(handlers::admin::orders_list))
        .route("/admin/orders/:id/status", patch(handlers::orders::update_order_status))

        // Analytics
        .route("/analytics/vendor", get(handlers::analytics::vendor_stats))
        .route("/analytics/supplier", get(handlers::analytics::supplier_stats))
        .route("/analytics/admin", get(handlers::analytics::admin_stats));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(1024 * 1024)),
        )
        .with_state(state)
}
