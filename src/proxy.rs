//! Pingora-based gateway implementation.
//!
//! This module implements the HTTP service using the Pingora framework.
//! It handles:
//! - Route dispatch for `/hns/:name/*` and `/hnsres/:name`
//! - Handshake name resolution before the upstream forward
//! - Upstream path substitution with the query string preserved
//! - `Location` rewriting on redirect responses

use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::hsd::HsdClient;
use crate::resolver::{rewrite_location, skylink_from_records, upstream_path};
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Uri};
use pingora_core::prelude::*;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_http::{RequestHeader, ResponseHeader};
use pingora_proxy::{FailToProxy, ProxyHttp, Session};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace};

/// Parsed route for an inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// `/hns/:name/*` — resolve and proxy to the content portal.
    Proxy {
        /// The Handshake name.
        name: String,
        /// Everything after `/hns/:name`, leading slash included (or empty).
        sub_path: String,
    },

    /// `/hnsres/:name` — resolve and return the skylink as JSON.
    Resolve {
        /// The Handshake name.
        name: String,
    },
}

/// Parses a request path into a route. Query strings are not part of the
/// path and must be stripped by the caller.
pub fn parse_route(path: &str) -> Option<Route> {
    if let Some(rest) = path.strip_prefix("/hnsres/") {
        // The resolution endpoint takes exactly one segment.
        if rest.is_empty() || rest.contains('/') {
            return None;
        }
        return Some(Route::Resolve {
            name: rest.to_string(),
        });
    }

    if let Some(rest) = path.strip_prefix("/hns/") {
        let (name, sub_path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if name.is_empty() {
            return None;
        }
        return Some(Route::Proxy {
            name: name.to_string(),
            sub_path: sub_path.to_string(),
        });
    }

    None
}

/// Context maintained across the request lifecycle.
#[derive(Default)]
pub struct GatewayContext {
    /// The parsed route, if any.
    pub route: Option<Route>,

    /// The computed upstream path for proxied requests.
    pub upstream_path: Option<String>,
}

/// The gateway service.
pub struct HnsGatewayService {
    /// Immutable process configuration.
    config: Arc<AppConfig>,

    /// Handshake node client, shared across requests.
    hsd: HsdClient,
}

impl HnsGatewayService {
    /// Creates a new gateway service.
    pub fn new(config: Arc<AppConfig>, hsd: HsdClient) -> Self {
        Self { config, hsd }
    }

    /// Resolves a name to its skylink through the hsd node.
    async fn resolve_skylink(&self, name: &str) -> Result<String, GatewayError> {
        let records = self.hsd.get_name_resource(name).await?;

        let records = records.ok_or_else(|| GatewayError::NameNotFound {
            name: name.to_string(),
        })?;

        skylink_from_records(&records)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::SkylinkNotFound {
                name: name.to_string(),
            })
    }
}

/// Writes a complete response and ends the exchange.
async fn respond(
    session: &mut Session,
    status: u16,
    content_type: &str,
    body: String,
) -> Result<()> {
    let mut resp = ResponseHeader::build(status, Some(2))?;
    resp.insert_header(header::CONTENT_TYPE, content_type)?;
    session.write_response_header(Box::new(resp), false).await?;
    session
        .write_response_body(Some(Bytes::from(body)), true)
        .await?;
    Ok(())
}

/// Converts a resolution failure into its client-facing response.
async fn respond_resolution_error(session: &mut Session, err: &GatewayError) -> Result<()> {
    let status = err.http_status();
    let body = if status == 404 {
        err.to_string()
    } else {
        format!("Handshake error: {}", err)
    };
    respond(session, status, "text/plain", body).await
}

#[async_trait]
impl ProxyHttp for HnsGatewayService {
    type CTX = GatewayContext;

    fn new_ctx(&self) -> Self::CTX {
        GatewayContext::default()
    }

    /// Dispatches the request. Resolution endpoint requests and all failures
    /// are answered here directly; only successfully resolved `/hns/`
    /// requests continue to the proxy phase.
    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool>
    where
        Self::CTX: Send + Sync,
    {
        let path = session.req_header().uri.path().to_string();

        let Some(route) = parse_route(&path) else {
            respond(session, 404, "text/plain", "Not found".to_string()).await?;
            return Ok(true);
        };
        ctx.route = Some(route.clone());

        match route {
            Route::Resolve { name } => {
                // The resolution endpoint is GET-only.
                if session.req_header().method != http::Method::GET {
                    respond(session, 404, "text/plain", "Not found".to_string()).await?;
                    return Ok(true);
                }

                match self.resolve_skylink(&name).await {
                    Ok(skylink) => {
                        debug!(name = %name, skylink = %skylink, "name resolved");
                        let body = serde_json::json!({ "skylink": skylink }).to_string();
                        respond(session, 200, "application/json", body).await?;
                    }
                    Err(e) => {
                        error!(name = %name, error = %e, "resolution failed");
                        respond_resolution_error(session, &e).await?;
                    }
                }
                Ok(true)
            }

            Route::Proxy { name, sub_path } => {
                let resolved = match self.resolve_skylink(&name).await {
                    Ok(skylink) => upstream_path(&skylink, &sub_path),
                    Err(e) => Err(e),
                };

                match resolved {
                    Ok(target) => {
                        trace!(name = %name, target = %target, "proxying to content portal");
                        ctx.upstream_path = Some(target);
                        Ok(false)
                    }
                    Err(e) => {
                        // The upstream forward is never attempted on failure.
                        error!(name = %name, error = %e, "resolution failed");
                        respond_resolution_error(session, &e).await?;
                        Ok(true)
                    }
                }
            }
        }
    }

    /// Determines the upstream peer to connect to.
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        let content = &self.config.content;
        let server = &self.config.server;

        let mut peer = HttpPeer::new(
            (content.host.clone(), content.port),
            false,
            content.host.clone(),
        );

        peer.options.connect_timeout = Some(Duration::from_secs(server.connect_timeout));
        peer.options.read_timeout = Some(Duration::from_secs(server.read_timeout));
        peer.options.write_timeout = Some(Duration::from_secs(server.write_timeout));

        Ok(Box::new(peer))
    }

    /// Substitutes the computed path before sending upstream.
    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        let target = ctx
            .upstream_path
            .as_deref()
            .ok_or_else(|| Error::new(ErrorType::Custom("upstream path missing")))?;

        let path_and_query = match upstream_request.uri.query() {
            Some(query) => format!("{}?{}", target, query),
            None => target.to_string(),
        };

        let uri = path_and_query
            .parse::<Uri>()
            .map_err(|_| Error::new(ErrorType::Custom("invalid upstream uri")))?;
        upstream_request.set_uri(uri);

        upstream_request.insert_header(header::HOST, self.config.content.authority())?;

        trace!(
            method = %upstream_request.method,
            uri = %upstream_request.uri,
            "sending upstream request"
        );

        Ok(())
    }

    /// Rewrites redirect targets that leak the raw skylink; every other
    /// header passes through untouched.
    async fn response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        if let Some(Route::Proxy { name, .. }) = &ctx.route {
            let rewritten = upstream_response
                .headers
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| rewrite_location(location, name));

            if let Some(location) = rewritten {
                debug!(name = %name, location = %location, "rewrote redirect location");
                upstream_response.insert_header(header::LOCATION, location)?;
            }
        }

        trace!(status = %upstream_response.status, "received upstream response");

        Ok(())
    }

    /// Handles errors during proxying.
    async fn fail_to_proxy(&self, _session: &mut Session, e: &Error, ctx: &mut Self::CTX) -> FailToProxy
    where
        Self::CTX: Send + Sync,
    {
        error!(error = %e, route = ?ctx.route, "proxy error");

        let error_code = match e.etype() {
            ErrorType::ConnectTimedout => 504, // Gateway Timeout
            _ => 502,                          // Bad Gateway
        };

        FailToProxy {
            error_code,
            can_reuse_downstream: false,
        }
    }

    /// Logging after request completion.
    async fn logging(&self, session: &mut Session, _e: Option<&Error>, ctx: &mut Self::CTX) {
        let status = session
            .response_written()
            .map(|r| r.status.as_u16())
            .unwrap_or(0);

        debug!(route = ?ctx.route, status = status, "request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proxy_route() {
        let route = parse_route("/hns/example/images/a.png").unwrap();
        assert_eq!(
            route,
            Route::Proxy {
                name: "example".to_string(),
                sub_path: "/images/a.png".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_proxy_route_bare_name() {
        let route = parse_route("/hns/example").unwrap();
        assert_eq!(
            route,
            Route::Proxy {
                name: "example".to_string(),
                sub_path: String::new(),
            }
        );

        let route = parse_route("/hns/example/").unwrap();
        assert_eq!(
            route,
            Route::Proxy {
                name: "example".to_string(),
                sub_path: "/".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_resolve_route() {
        let route = parse_route("/hnsres/example").unwrap();
        assert_eq!(
            route,
            Route::Resolve {
                name: "example".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_route_rejects() {
        assert!(parse_route("/").is_none());
        assert!(parse_route("/hns").is_none());
        assert!(parse_route("/hns/").is_none());
        assert!(parse_route("/hnsres").is_none());
        assert!(parse_route("/hnsres/").is_none());
        assert!(parse_route("/hnsres/example/more").is_none());
        assert!(parse_route("/other/example").is_none());
    }
}
