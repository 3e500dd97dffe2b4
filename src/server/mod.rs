pub mod auth;
mod pages;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use indicatif::ProgressBar;
use serde::Deserialize;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::export;
use crate::scraper::{self, Fetcher, HttpFetcher};
use auth::{AuthSession, SessionStore};

pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub fetcher: Arc<dyn Fetcher>,
}

impl AppState {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        Self {
            config,
            sessions,
            fetcher,
        }
    }
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct ScrapeForm {
    #[serde(default)]
    urls: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/scrape", post(scrape))
        .route("/download/{file}", get(download))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: Config) -> Result<()> {
    if config.users.is_empty() {
        bail!("AUTHORIZED_USERS must list at least one user:password pair to serve");
    }

    let fetcher = HttpFetcher::from_config(&config)?;
    let addr = format!("{}:{}", config.host, config.port);
    let port = config.port;
    let state = Arc::new(AppState::new(config, Arc::new(fetcher)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    println!("{}", "=".repeat(60));
    println!("  Product Scraper");
    println!("{}", "=".repeat(60));
    println!("  Local:   http://localhost:{port}");
    println!("  Sign in with a user from AUTHORIZED_USERS.");
    println!("  Press Ctrl+C to stop.");
    println!("{}", "=".repeat(60));
    info!("Listening on {addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn login_page() -> Html<String> {
    Html(pages::login(None))
}

async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    if !auth::check_credentials(&state.config.users, &form.username, &form.password) {
        warn!("Failed login for {:?}", form.username);
        return (
            StatusCode::UNAUTHORIZED,
            Html(pages::login(Some("Invalid username or password"))),
        )
            .into_response();
    }

    let token = state.sessions.create(&form.username).await;
    info!("{} signed in", form.username);
    (
        [(header::SET_COOKIE, auth::session_cookie(&token, state.sessions.ttl()))],
        Redirect::to("/"),
    )
        .into_response()
}

async fn logout(State(state): State<Arc<AppState>>, session: AuthSession) -> Response {
    state.sessions.revoke(&session.token).await;
    (
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

async fn index_page(session: AuthSession) -> Html<String> {
    Html(pages::index(&session.username))
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Form(form): Form<ScrapeForm>,
) -> Response {
    let user = session.username.as_str();
    let batch = scraper::partition_urls(&form.urls);

    if batch.accepted.is_empty() {
        let (heading, message) = if batch.rejected.is_empty() {
            ("No URLs provided", "Paste at least one product URL, one per line.")
        } else {
            (
                "Amazon URLs Not Supported",
                "All the URLs you provided are from Amazon, which this scraper does not handle. \
                 Try product pages from other stores.",
            )
        };
        return (StatusCode::BAD_REQUEST, Html(pages::error(user, heading, message))).into_response();
    }

    if !batch.rejected.is_empty() {
        info!("Skipped {} Amazon URL(s)", batch.rejected.len());
    }
    info!("{} started a scrape of {} URL(s)", user, batch.accepted.len());

    let records =
        scraper::scrape_batch(state.fetcher.as_ref(), &batch.accepted, &ProgressBar::hidden()).await;

    let path = match export::save_export(&state.config.export_dir, &records) {
        Ok(path) => path,
        Err(e) => {
            error!("Export failed: {e:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::error(user, "Export failed", &e.to_string())),
            )
                .into_response();
        }
    };
    info!("Saved {} products to {}", records.len(), path.display());

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Html(pages::results(user, &records, &batch.rejected, &file_name)).into_response()
}

async fn download(
    State(state): State<Arc<AppState>>,
    _session: AuthSession,
    Path(file): Path<String>,
) -> Response {
    if !export::is_export_file_name(&file) {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    match tokio::fs::read(state.config.export_dir.join(&file)).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::scraper::tests::MapFetcher;

    fn test_state(export_dir: PathBuf) -> Arc<AppState> {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.users = HashMap::from([("admin".to_string(), "s3cret".to_string())]);
        config.export_dir = export_dir;
        let pages = HashMap::from([(
            "https://shop.example/p/lamp".to_string(),
            r#"<meta property="og:title" content="Brass Lamp">{"price": 89.00}"#.to_string(),
        )]);
        Arc::new(AppState::new(config, Arc::new(MapFetcher(pages))))
    }

    fn temp_export_dir() -> PathBuf {
        std::env::temp_dir().join(format!("product_scraper_test_{}", uuid::Uuid::new_v4().simple()))
    }

    async fn cookie_for(state: &AppState) -> String {
        let token = state.sessions.create("admin").await;
        format!("{}={}", auth::COOKIE_NAME, token)
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_index_redirects_to_login() {
        let app = router(test_state(temp_export_dir()));
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/login");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let state = test_state(temp_export_dir());

        let bad = router(state.clone())
            .oneshot(form_post("/login", None, "username=admin&password=nope"))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

        let good = router(state.clone())
            .oneshot(form_post("/login", None, "username=admin&password=s3cret"))
            .await
            .unwrap();
        assert_eq!(good.status(), StatusCode::SEE_OTHER);
        let cookie = good.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let token = cookie
            .strip_prefix("ps_session=")
            .and_then(|c| c.split(';').next())
            .unwrap();
        assert_eq!(state.sessions.lookup(token).await.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn amazon_only_batch_is_rejected() {
        let state = test_state(temp_export_dir());
        let cookie = cookie_for(&state).await;
        let resp = router(state)
            .oneshot(form_post(
                "/scrape",
                Some(&cookie),
                "urls=https%3A%2F%2Fwww.amazon.com%2Fdp%2FB01",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(resp).await.contains("Amazon URLs Not Supported"));
    }

    #[tokio::test]
    async fn scrape_exports_and_serves_download() {
        let dir = temp_export_dir();
        let state = test_state(dir.clone());
        let cookie = cookie_for(&state).await;

        let resp = router(state.clone())
            .oneshot(form_post(
                "/scrape",
                Some(&cookie),
                "urls=https%3A%2F%2Fshop.example%2Fp%2Flamp%0Ahttps%3A%2F%2Fshop.example%2Fp%2Fmissing",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Brass Lamp"));
        assert!(html.contains("Scraped 2 products"));

        let file = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .find(|n| export::is_export_file_name(n))
            .unwrap();

        let resp = router(state)
            .oneshot(
                Request::get(format!("/download/{file}"))
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let csv = body_text(resp).await;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Brass Lamp"));
        assert!(lines[2].starts_with("ERROR,"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn download_rejects_unknown_names() {
        let state = test_state(temp_export_dir());
        let cookie = cookie_for(&state).await;
        let resp = router(state)
            .oneshot(
                Request::get("/download/Cargo.toml")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
