use std::path::Path;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::state::{IndexSource, ServerState};
use crate::domain::{AppError, PLUGIN_ASSETS_DIR, ProxyRoute};

const BUNDLER_CLIENT_SCRIPT: &str = r#"<script type="module" src="/@vite/client"></script>"#;

/// Routes of the front server. Anything unmatched goes through [`fallback`].
pub fn router(state: ServerState) -> Router {
    let mut router = Router::new()
        .route("/app.config.json", get(app_config))
        .route("/", get(index))
        .route("/index.html", get(index));
    if state.config_root.is_some() {
        router = router.route("/config/*path", get(module_config));
    }
    router.fallback(fallback).layer(TraceLayer::new_for_http()).with_state(state)
}

async fn app_config(State(state): State<ServerState>) -> Response {
    match state.resolver.app_config().await {
        Ok(config) => json_response(&config),
        Err(err) => {
            error!("Failed to serve app.config.json: {}", err);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn module_config(State(state): State<ServerState>, uri: Uri) -> Response {
    let Some(config_root) = state.config_root.as_deref() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.resolver.module_config(config_root, uri.path()).await {
        Ok(Some(document)) => json_response(&document),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to serve {}: {}", uri.path(), err);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn index(State(state): State<ServerState>) -> Response {
    match load_index(&state).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!("Failed to load index.html: {}", err);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn load_index(state: &ServerState) -> Result<String, AppError> {
    match &state.index {
        IndexSource::File { path, inject_client } => {
            let html = tokio::fs::read_to_string(path).await?;
            Ok(if *inject_client { inject_bundler_client(&html) } else { html })
        }
        IndexSource::Remote { url, credentials } => {
            state.http.fetch_text(url, credentials.as_ref()).await
        }
    }
}

/// Add the bundler's HMR client script at the end of `<head>`.
fn inject_bundler_client(html: &str) -> String {
    match html.find("</head>") {
        Some(position) => {
            format!("{}{}\n{}", &html[..position], BUNDLER_CLIENT_SCRIPT, &html[position..])
        }
        None => format!("{}\n{}", BUNDLER_CLIENT_SCRIPT, html),
    }
}

/// Asset redirect, static mounts, proxy table, bundler dev server; in that order.
async fn fallback(State(state): State<ServerState>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    if let Some(location) = asset_redirect(&state, &path, request.uri().query()) {
        return Redirect::permanent(&location).into_response();
    }

    if let Some((mount, rest)) =
        state.mounts.iter().find_map(|mount| mount.strip(&path).map(|rest| (mount, rest)))
    {
        return serve_static(&mount.dir, rest, request).await;
    }

    if let Some(resolved) = state.proxies.resolve(&path) {
        return state.forwarder.forward(resolved.route, &resolved.path, request).await;
    }

    if let Some(target) = &state.fallback {
        let route = ProxyRoute::to(target.clone()).changing_origin();
        return state.forwarder.forward(&route, &path, request).await;
    }

    StatusCode::NOT_FOUND.into_response()
}

fn asset_redirect(state: &ServerState, path: &str, query: Option<&str>) -> Option<String> {
    let rest = path.strip_prefix(state.asset_redirect.as_deref()?)?;
    if !(rest.is_empty() || rest.starts_with('/')) {
        return None;
    }
    let location = format!("/{}{}", PLUGIN_ASSETS_DIR, rest);
    Some(match query {
        Some(query) => format!("{}?{}", location, query),
        None => location,
    })
}

async fn serve_static(dir: &Path, rest: &str, mut request: Request) -> Response {
    let rest = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{}?{}", rest, query),
        None => rest.to_string(),
    };
    match path_and_query.parse::<Uri>() {
        Ok(uri) => *request.uri_mut() = uri,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    }
    match ServeDir::new(dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn json_response(value: &Value) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => {
            error!("Failed to serialize config: {}", err);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
