pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::BookingConfig;
use crate::services::{
    storage::UPLOADS_ROUTE, ArchiveService, AuthService, BookingService, BrokerService,
    EmailProvider, InvoiceService, JwtService, MongoDb, PlotService, RecordService, Storage,
    Stores,
};

#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtService,
    /// `None` when running on the in-memory store.
    pub db: Option<MongoDb>,
    pub auth: AuthService,
    pub plots: PlotService,
    pub brokers: BrokerService,
    pub bookings: BookingService,
    pub invoices: InvoiceService,
    pub archive: ArchiveService,
    pub records: RecordService,
    pub login_rate_limiter: IpRateLimiter,
    pub uploads_path: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &BookingConfig,
        stores: Stores,
        storage: Arc<dyn Storage>,
        email: Arc<dyn EmailProvider>,
        db: Option<MongoDb>,
    ) -> Self {
        let jwt = JwtService::new(&config.auth);
        let archive = ArchiveService::new(stores.clone());

        Self {
            auth: AuthService::new(
                stores.clone(),
                jwt.clone(),
                email,
                config.auth.frontend_url.clone(),
            ),
            plots: PlotService::new(stores.clone()),
            brokers: BrokerService::new(stores.clone()),
            bookings: BookingService::new(stores.clone(), storage.clone(), archive.clone()),
            invoices: InvoiceService::new(stores.clone()),
            records: RecordService::new(stores, storage),
            archive,
            jwt,
            db,
            login_rate_limiter: create_ip_rate_limiter(config.auth.login_attempts_per_minute, 60),
            uploads_path: PathBuf::from(&config.uploads.local_path),
            max_upload_bytes: config.uploads.max_upload_bytes,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/users", post(handlers::auth::create_user))
        // Plots
        .route(
            "/api/plots",
            get(handlers::plots::list_plots).post(handlers::plots::create_plot),
        )
        .route(
            "/api/plots/:id",
            get(handlers::plots::get_plot)
                .put(handlers::plots::update_plot)
                .delete(handlers::plots::delete_plot),
        )
        // Brokers
        .route(
            "/api/brokers",
            get(handlers::brokers::list_brokers).post(handlers::brokers::create_broker),
        )
        .route(
            "/api/brokers/:id",
            get(handlers::brokers::get_broker)
                .put(handlers::brokers::update_broker)
                .delete(handlers::brokers::delete_broker),
        )
        .route(
            "/api/brokers/:id/financials",
            get(handlers::brokers::broker_financials),
        )
        // Bookings
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route(
            "/api/bookings/:id",
            get(handlers::bookings::get_booking)
                .put(handlers::bookings::update_booking)
                .delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:id/documents",
            post(handlers::bookings::upload_booking_documents),
        )
        // Invoices
        .route(
            "/api/invoices",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route("/api/invoices/:id", get(handlers::invoices::get_invoice))
        .route(
            "/api/invoices/:id/add-payment",
            post(handlers::invoices::add_payment),
        )
        .route(
            "/api/invoices/:id/payments/:payment_id",
            put(handlers::invoices::edit_payment).delete(handlers::invoices::delete_payment),
        )
        // Deleted contacts
        .route(
            "/api/deleted-contacts",
            get(handlers::deleted_contacts::list_deleted_contacts),
        )
        .route(
            "/api/deleted-contacts/:id/restore",
            post(handlers::deleted_contacts::restore_deleted_contact),
        )
        // Expenses; GET on the item path serves an attached document by file name
        .route(
            "/api/expenses",
            get(handlers::records::list_expenses).post(handlers::records::create_expense),
        )
        .route(
            "/api/expenses/:id",
            get(handlers::records::download_expense_document)
                .put(handlers::records::update_expense)
                .delete(handlers::records::delete_expense),
        )
        .route(
            "/api/expenses/:id/upload",
            post(handlers::records::upload_expense_document),
        )
        .route(
            "/api/expenses/:id/document",
            axum::routing::delete(handlers::records::delete_expense_document),
        )
        // Others
        .route(
            "/api/others",
            get(handlers::records::list_others).post(handlers::records::create_other),
        )
        .route(
            "/api/others/:id",
            put(handlers::records::update_other).delete(handlers::records::delete_other),
        )
        // Enquiries
        .route(
            "/api/enquiries",
            get(handlers::records::list_enquiries).post(handlers::records::create_enquiry),
        )
        .route(
            "/api/enquiries/:id",
            put(handlers::records::update_enquiry).delete(handlers::records::delete_enquiry),
        )
        // Layout resources
        .route(
            "/api/layout-resources",
            get(handlers::records::list_layout_resources)
                .post(handlers::records::create_layout_resource),
        )
        .route(
            "/api/layout-resources/:id",
            axum::routing::delete(handlers::records::delete_layout_resource),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(login_route)
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password/:token",
            post(handlers::auth::reset_password),
        )
        .merge(api_routes)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&state.uploads_path))
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        // The SPA is served from its own origin.
        .layer(CorsLayer::permissive())
}
