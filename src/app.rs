use crate::alt_source::{AltSourceResolver, SuggestApi, SuggestClient};
use crate::catalog::{Catalog, Kind};
use crate::config::Config;
use crate::detail;
use crate::error::{ApiError, ApiResult};
use crate::query::{self, ListParams, ListQuery};
use crate::view::{self, ViewState};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub alt_source: AltSourceResolver,
}

pub async fn run_server(config: Config) -> Result<()> {
    let catalog = Arc::new(Catalog::load(&config.films_path, &config.tv_path).await);

    let suggest: Arc<dyn SuggestApi> =
        Arc::new(SuggestClient::new(config.alt_source.suggest_base.clone())?);
    let alt_source = AltSourceResolver::new(suggest, config.alt_source.clone());
    info!(
        "Alternate sources via {} -> {}",
        config.alt_source.suggest_base, config.alt_source.embed_base
    );

    let state = AppState {
        catalog,
        alt_source,
    };

    let app = build_router(state);

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/detail.html", get(detail_page))
        .route("/health", get(health))
        .route("/film.json", get(raw_films))
        .route("/tv.json", get(raw_tv))
        .route("/api/films", get(list_films))
        .route("/api/films/:slug", get(film_detail))
        .route("/api/films/:slug/alternate", get(film_alternate))
        .route("/api/tv", get(list_tv))
        .route("/api/tv/:slug", get(tv_detail))
        .route("/api/tv/:slug/alternate", get(tv_alternate))
        .route("/api/search", get(search))
        .route("/api/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn raw_films(State(state): State<AppState>) -> Response {
    Json(state.catalog.films()).into_response()
}

async fn raw_tv(State(state): State<AppState>) -> Response {
    Json(state.catalog.tv()).into_response()
}

type ParamsResult<T> = Result<Query<T>, QueryRejection>;

async fn list_films(
    State(state): State<AppState>,
    params: ParamsResult<ListParams>,
) -> ApiResult<Response> {
    list(&state, Kind::Film, params)
}

async fn list_tv(
    State(state): State<AppState>,
    params: ParamsResult<ListParams>,
) -> ApiResult<Response> {
    list(&state, Kind::Tv, params)
}

fn list(state: &AppState, kind: Kind, params: ParamsResult<ListParams>) -> ApiResult<Response> {
    let Query(params) = params?;
    let q = params.into_query()?;
    let page = query::query(state.catalog.collection(kind), &q);
    debug!(
        kind = kind.as_param(),
        page = q.page,
        total = page.pagination.total,
        "Listing"
    );
    Ok(Json(page).into_response())
}

async fn film_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    detail_json(&state, Kind::Film, &slug)
}

async fn tv_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    detail_json(&state, Kind::Tv, &slug)
}

fn detail_json(state: &AppState, kind: Kind, slug: &str) -> ApiResult<Response> {
    let detail = detail::resolve(state.catalog.collection(kind), slug).ok_or_else(|| {
        debug!("No {} with slug '{}'", kind.as_param(), slug);
        ApiError::not_found()
    })?;
    Ok(Json(detail).into_response())
}

async fn film_alternate(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    alternate(&state, Kind::Film, &slug).await
}

async fn tv_alternate(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    alternate(&state, Kind::Tv, &slug).await
}

async fn alternate(state: &AppState, kind: Kind, slug: &str) -> ApiResult<Response> {
    let title = detail::find_by_slug(state.catalog.collection(kind), slug)
        .ok_or_else(ApiError::not_found)?;
    let found = state.alt_source.resolve(title, kind).await;
    Ok(Json(found).into_response())
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    params: ParamsResult<SearchParams>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    Ok(Json(query::search_catalog(&state.catalog, params.q.as_deref())).into_response())
}

async fn stats(State(state): State<AppState>) -> Response {
    Json(state.catalog.stats()).into_response()
}

#[derive(Debug, Deserialize)]
struct KindParam {
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn index_page(
    State(state): State<AppState>,
    kind: ParamsResult<KindParam>,
    params: ParamsResult<ListParams>,
) -> Html<String> {
    let kind = kind
        .map(|Query(k)| Kind::from_param(k.kind.as_deref()))
        .unwrap_or_default();
    let q = params
        .map_err(ApiError::from)
        .and_then(|Query(params)| params.into_query())
        .unwrap_or_else(|e| {
            warn!("Ignoring invalid index parameters: {}", e);
            ListQuery::default()
        });
    let page = query::query(state.catalog.collection(kind), &q);
    let view_state = ViewState::new(kind, q);
    Html(view::render_index(&view_state, &page, state.catalog.stats()))
}

#[derive(Debug, Deserialize)]
struct DetailParams {
    slug: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    server: Option<String>,
}

async fn detail_page(
    State(state): State<AppState>,
    params: ParamsResult<DetailParams>,
) -> Response {
    let Ok(Query(params)) = params else {
        return Redirect::to("/").into_response();
    };
    let Some(slug) = params.slug.filter(|s| !s.is_empty()) else {
        return Redirect::to("/").into_response();
    };
    let kind = Kind::from_param(params.kind.as_deref());
    let Some(detail) = detail::resolve(state.catalog.collection(kind), &slug) else {
        return (StatusCode::NOT_FOUND, Html(view::render_not_found())).into_response();
    };

    let alternate = if params.server.as_deref() == Some("alt") {
        Some(state.alt_source.resolve(detail.title, kind).await)
    } else {
        None
    };
    Html(view::render_detail(kind, &detail, alternate.as_ref())).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
