//! Web server for the tower catalog and its admin area.

pub mod assets;
pub mod handlers;
pub mod session;
pub mod templates;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::repository::DbContext;
use crate::services::CredentialVerifier;

use handlers::admin;
use session::SessionKey;

/// Room for multipart framing and the other form fields around the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     img-src 'self' https: data:; \
     frame-src 'self' https:; \
     style-src 'self'; \
     script-src 'self' 'unsafe-inline'; \
     object-src 'none'; \
     frame-ancestors 'self'";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: DbContext,
    pub settings: Arc<Settings>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub session_key: Arc<SessionKey>,
}

impl AppState {
    pub fn new(db: DbContext, settings: Settings, verifier: Arc<dyn CredentialVerifier>) -> Self {
        let session_key = Arc::new(SessionKey::new(&settings.secret_key));
        Self {
            db,
            settings: Arc::new(settings),
            verifier,
            session_key,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to determine local address: {source}")]
    LocalAddr {
        #[source]
        source: std::io::Error,
    },
    #[error("axum server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.settings.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard::dashboard))
        .route("/admin/", get(admin::dashboard::dashboard))
        // Categories
        .route("/admin/categories", get(admin::categories::list))
        .route(
            "/admin/category/new",
            get(admin::categories::new_form).post(admin::categories::create),
        )
        .route(
            "/admin/category/:id/edit",
            get(admin::categories::edit_form).post(admin::categories::update),
        )
        .route("/admin/category/:id/delete", post(admin::categories::delete))
        // Variants
        .route("/admin/variants", get(admin::variants::list))
        .route(
            "/admin/variant/new",
            get(admin::variants::new_form).post(admin::variants::create),
        )
        .route(
            "/admin/variant/:id/edit",
            get(admin::variants::edit_form).post(admin::variants::update),
        )
        .route("/admin/variant/:id/delete", post(admin::variants::delete))
        // Documents
        .route("/admin/documents", get(admin::documents::list))
        .route(
            "/admin/variant/:id/upload",
            get(admin::documents::upload_form).post(admin::documents::upload),
        )
        .route("/admin/document/:id/delete", post(admin::documents::delete))
        // Sliders
        .route("/admin/sliders", get(admin::sliders::list))
        .route(
            "/admin/slider/new",
            get(admin::sliders::new_form).post(admin::sliders::create),
        )
        .route(
            "/admin/slider/:id/edit",
            get(admin::sliders::edit_form).post(admin::sliders::update),
        )
        .route("/admin/slider/:id/delete", post(admin::sliders::delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_admin,
        ));

    Router::new()
        // Public catalog
        .route("/", get(handlers::public::index))
        .route("/category/:id", get(handlers::public::category))
        .route("/variant/:id", get(handlers::public::variant))
        .route("/search", get(handlers::public::search))
        .route("/health", get(handlers::health::health))
        // JSON views
        .route("/api/categories", get(handlers::api::categories))
        .route("/api/variants/:id", get(handlers::api::variant))
        // Files
        .route("/uploads/:name", get(handlers::static_files::serve_upload))
        .route("/static/style.css", get(handlers::static_files::serve_css))
        // Admin login is reachable without a session
        .route(
            "/admin/login",
            get(admin::auth::login_form).post(admin::auth::login),
        )
        .route("/admin/logout", get(admin::auth::logout))
        .merge(admin_routes)
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::map_response(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    // Same-origin framing stays allowed so variant pages can embed local PDFs.
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    response
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ShutdownEvent {
    CtrlC,
    SigTerm,
    ListenerFailed,
}

/// Bind to the configured address and serve until ctrl-c or SIGTERM.
pub async fn serve(state: AppState) -> Result<(), ServerError> {
    let address = state.settings.bind.trim().to_string();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| ServerError::LocalAddr { source })?;
    tracing::info!(%local_addr, "towerdocs server listening");

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let event = wait_for_shutdown().await;
            tracing::info!(?event, "shutdown signal received");
        })
        .await
        .map_err(|source| ServerError::Serve { source })?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() -> ShutdownEvent {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ShutdownEvent::CtrlC,
            Err(error) => {
                tracing::warn!(%error, "failed to capture Ctrl+C signal");
                ShutdownEvent::ListenerFailed
            }
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => match term.recv().await {
                Some(_) => ShutdownEvent::SigTerm,
                None => ShutdownEvent::ListenerFailed,
            },
            Err(error) => {
                tracing::warn!(%error, "failed to capture SIGTERM");
                ShutdownEvent::ListenerFailed
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<ShutdownEvent>();

    tokio::select! {
        event = ctrl_c => event,
        event = sigterm => event,
    }
}
