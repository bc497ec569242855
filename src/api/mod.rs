use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    HouseSearchError, Result,
    config::ListingsConfig,
    listings,
    location_resolver::{IpLocationProvider, LocationResolver},
    models::{Coordinate, HouseListing, LocationInfo, RouteResult},
    routing::{self, RouteProvider},
};

mod client_ip;

pub use client_ip::ClientIp;

/// Everything the handlers need, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub ip_locations: Arc<dyn IpLocationProvider>,
    pub routes: Arc<dyn RouteProvider>,
    pub listings: ListingsConfig,
}

#[derive(Debug, Deserialize)]
pub struct HousesQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

/// `src` and `dest` are `[lat, lng]` pairs
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub src: Option<[f64; 2]>,
    pub dest: Option<[f64; 2]>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ipLocation", get(get_ip_location))
        .route("/houses", get(get_houses))
        .route("/route", post(post_route))
        .route("/health", get(health))
        .with_state(state)
}

async fn get_ip_location(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
) -> Result<Json<LocationInfo>> {
    let location = LocationResolver::resolve(state.ip_locations.as_ref(), client_ip).await?;
    Ok(Json(location))
}

async fn get_houses(
    State(state): State<AppState>,
    query: std::result::Result<Query<HousesQuery>, QueryRejection>,
) -> Result<Json<Vec<HouseListing>>> {
    let Query(query) = query?;

    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        return Err(HouseSearchError::invalid_argument(
            "Both lat and lng query parameters are required",
        ));
    };
    let center = Coordinate::new(lat, lng)?;
    let radius = query
        .radius
        .unwrap_or(state.listings.default_radius_meters);

    let houses = listings::generate(center, radius, state.listings.count)?;
    Ok(Json(houses))
}

async fn post_route(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<RouteResult>> {
    let Json(request) = payload?;

    let source = request.src.map(Coordinate::from_lat_lng).transpose()?;
    let destination = request.dest.map(Coordinate::from_lat_lng).transpose()?;

    let route = routing::get_route(state.routes.as_ref(), source, destination).await?;
    Ok(Json(route))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use std::net::IpAddr;
    use tower::ServiceExt;

    struct UnreachableIpLookup;

    #[async_trait]
    impl IpLocationProvider for UnreachableIpLookup {
        async fn lookup(&self, _ip: Option<IpAddr>) -> Result<Option<LocationInfo>> {
            Err(HouseSearchError::service_unavailable("connection refused"))
        }
    }

    /// Finds a route only when `found` is set
    struct CannedRoutes {
        found: bool,
    }

    #[async_trait]
    impl RouteProvider for CannedRoutes {
        async fn route(&self, source: Coordinate, destination: Coordinate) -> Result<RouteResult> {
            if !self.found {
                return Err(HouseSearchError::not_found("No route found"));
            }
            Ok(RouteResult {
                geometry: vec![source, destination],
                duration_seconds: 42.0,
                distance_meters: 314.0,
            })
        }
    }

    fn app(routes_found: bool) -> Router {
        router(AppState {
            ip_locations: Arc::new(UnreachableIpLookup),
            routes: Arc::new(CannedRoutes {
                found: routes_found,
            }),
            listings: ListingsConfig::default(),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_houses_returns_fifty() {
        let (status, body) = send(app(true), get("/houses?lat=0&lng=0&radius=1000")).await;

        assert_eq!(status, StatusCode::OK);
        let houses = body.as_array().unwrap();
        assert_eq!(houses.len(), 50);
        for house in houses {
            assert!(house["lat"].is_f64());
            assert!(house["lng"].is_f64());
            let price = house["price"].as_u64().unwrap();
            assert!((200_000..700_000).contains(&price));
        }
    }

    #[tokio::test]
    async fn test_houses_uses_default_radius() {
        let (status, body) = send(app(true), get("/houses?lat=10&lng=20")).await;

        assert_eq!(status, StatusCode::OK);
        let limit = 7500.0 / listings::METERS_PER_DEGREE;
        for house in body.as_array().unwrap() {
            let dlat = house["lat"].as_f64().unwrap() - 10.0;
            let dlng = house["lng"].as_f64().unwrap() - 20.0;
            assert!(dlat * dlat + dlng * dlng <= limit * limit + 1e-12);
        }
    }

    #[tokio::test]
    async fn test_houses_rejects_bad_input() {
        for uri in [
            "/houses?lng=0&radius=1000",
            "/houses?lat=abc&lng=0",
            "/houses?lat=95&lng=0",
            "/houses?lat=0&lng=0&radius=-5",
        ] {
            let (status, body) = send(app(true), get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_route_success() {
        let (status, body) = send(
            app(true),
            post_json("/route", r#"{"src": [0, 0], "dest": [1, 2]}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["geometry"]["type"], "LineString");
        assert_eq!(body["geometry"]["coordinates"][1], json!([2.0, 1.0]));
        assert_eq!(body["duration"], 42.0);
        assert_eq!(body["distance"], 314.0);
    }

    #[tokio::test]
    async fn test_route_missing_dest_is_bad_request() {
        let (status, body) = send(app(true), post_json("/route", r#"{"src": [0, 0]}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("dest"));
    }

    #[tokio::test]
    async fn test_route_malformed_body_is_bad_request() {
        let (status, body) = send(app(true), post_json("/route", "{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_route_not_found() {
        let (status, body) = send(
            app(false),
            post_json("/route", r#"{"src": [0, 0], "dest": [1, 1]}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No route found");
    }

    #[tokio::test]
    async fn test_ip_location_private_address_falls_back() {
        let request = Request::builder()
            .uri("/ipLocation")
            .header("x-forwarded-for", "192.168.1.20")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "New Delhi");
        assert_eq!(body["country"], "India");
    }

    #[tokio::test]
    async fn test_ip_location_upstream_failure_is_server_error() {
        let (status, body) = send(app(true), get("/ipLocation")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(true), get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
