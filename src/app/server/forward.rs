//! Forwards requests to proxy targets and the bundler dev server.

use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::{debug, error};
use url::Url;

use crate::domain::{AppError, ProxyRoute};

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const CSP_HEADERS: [HeaderName; 2] =
    [header::CONTENT_SECURITY_POLICY, header::CONTENT_SECURITY_POLICY_REPORT_ONLY];

/// HTTP clients used for forwarding; `insecure` skips certificate checks.
#[derive(Debug, Clone)]
pub struct Forwarder {
    strict: Client,
    insecure: Client,
}

impl Forwarder {
    pub fn new() -> Result<Self, AppError> {
        let build = |accept_invalid: bool| {
            Client::builder()
                .redirect(Policy::none())
                .danger_accept_invalid_certs(accept_invalid)
                .build()
                .map_err(|err| {
                    AppError::http("client", format!("failed to create proxy client: {}", err))
                })
        };
        Ok(Self { strict: build(false)?, insecure: build(true)? })
    }

    /// Send `request` to `route` with the already rewritten `path`.
    ///
    /// Transport failures answer 502 and are logged.
    pub async fn forward(&self, route: &ProxyRoute, path: &str, request: Request) -> Response {
        let url = target_url(&route.target, path, request.uri().query());
        match self.send(route, &url, request).await {
            Ok(response) => response,
            Err(err) => {
                error!("proxy request to {} failed: {}", url, err);
                StatusCode::BAD_GATEWAY.into_response()
            }
        }
    }

    async fn send(
        &self,
        route: &ProxyRoute,
        url: &Url,
        request: Request,
    ) -> Result<Response, reqwest::Error> {
        let (parts, body) = request.into_parts();
        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        if route.change_origin {
            headers.remove(header::HOST);
            if let Some(host) = host_header(url) {
                headers.insert(header::HOST, host);
            }
        }

        let client = if route.secure { &self.strict } else { &self.insecure };
        debug!("{} {} -> {}", parts.method, parts.uri, url);
        let upstream = client
            .request(parts.method, url.clone())
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await?;

        let mut response = Response::builder().status(upstream.status());
        if let Some(response_headers) = response.headers_mut() {
            *response_headers = upstream.headers().clone();
            strip_hop_by_hop(response_headers);
            if route.strip_csp {
                for name in &CSP_HEADERS {
                    response_headers.remove(name);
                }
            }
        }
        Ok(response
            .body(Body::from_stream(upstream.bytes_stream()))
            .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response()))
    }
}

/// `target` with `path` appended to its own path and the original query kept.
fn target_url(target: &Url, path: &str, query: Option<&str>) -> Url {
    let mut url = target.clone();
    let base = target.path().trim_end_matches('/');
    let path = if path.starts_with('/') { path.to_string() } else { format!("/{}", path) };
    url.set_path(&format!("{}{}", base, path));
    url.set_query(query);
    url
}

fn host_header(url: &Url) -> Option<HeaderValue> {
    let host = url.host_str()?;
    let value = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).ok()
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_url_joins_base_path_and_query() {
        let target = Url::parse("https://map.example.com/base/").unwrap();
        let url = target_url(&target, "/plugins/a/index.js", Some("v=1"));
        assert_eq!(url.as_str(), "https://map.example.com/base/plugins/a/index.js?v=1");

        let root = Url::parse("http://localhost:5173").unwrap();
        let url = target_url(&root, "src/index.js", None);
        assert_eq!(url.as_str(), "http://localhost:5173/src/index.js");
    }

    #[test]
    fn host_header_includes_explicit_port() {
        let url = Url::parse("http://localhost:5173/x").unwrap();
        assert_eq!(host_header(&url).unwrap(), "localhost:5173");
        let url = Url::parse("https://map.example.com/x").unwrap();
        assert_eq!(host_header(&url).unwrap(), "map.example.com");
    }

    #[tokio::test]
    async fn forwards_and_strips_csp() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/assets/app.js")
            .match_query(mockito::Matcher::UrlEncoded("v".into(), "2".into()))
            .with_status(200)
            .with_header("content-security-policy", "default-src 'self'")
            .with_header("content-type", "text/javascript")
            .with_body("export {}")
            .create_async()
            .await;

        let target = Url::parse(&server.url()).unwrap();
        let route = ProxyRoute::to(target).changing_origin().stripping_csp();
        let request =
            http::Request::builder().uri("/assets/app.js?v=2").body(Body::empty()).unwrap();

        let response = Forwarder::new().unwrap().forward(&route, "/assets/app.js", request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_SECURITY_POLICY).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"export {}");
    }

    #[tokio::test]
    async fn unreachable_target_is_bad_gateway() {
        let route = ProxyRoute::to(Url::parse("http://127.0.0.1:1").unwrap());
        let request = http::Request::builder().uri("/x").body(Body::empty()).unwrap();
        let response = Forwarder::new().unwrap().forward(&route, "/x", request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
