// AQI Dashboard - REST API
// JSON routes over the historical data, model, recommendations and live providers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::analytics::{self, AqiSummary, PollutantShare, DEFAULT_TOP_LIMIT};
use crate::category::{classify, AqiCategory, AqiValue};
use crate::impact::{estimate, ImpactResult, MitigationAction};
use crate::live::{live_aqi_status, weather_status, LiveAqiProvider, WeatherProvider};
use crate::model::{predict_with_category, ModelPort, Prediction};
use crate::pollutants::PollutantReadings;
use crate::recommendations::{HealthProfile, RecommendationBlock, RecommendationTable};
use crate::records::{export_csv, HistoricalDataPort};

/// Shared application state. Everything is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<dyn HistoricalDataPort + Send + Sync>,
    pub model: Option<Arc<dyn ModelPort>>,
    pub recommendations: Arc<RecommendationTable>,
    pub live_aqi: Arc<dyn LiveAqiProvider>,
    pub weather: Arc<dyn WeatherProvider>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

fn parse_profiles(raw: Option<&str>) -> Result<Vec<HealthProfile>, Response> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HealthProfile>()
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
        })
        .collect()
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Serialize)]
struct CategoryResponse {
    aqi: AqiValue,
    category: AqiCategory,
    color: &'static str,
}

#[derive(Serialize)]
struct CitySummaryResponse {
    city: String,
    summary: AqiSummary,
    pollutants: Vec<PollutantShare>,
}

#[derive(Deserialize)]
struct CompareQuery {
    a: String,
    b: String,
}

#[derive(Deserialize)]
struct TopQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct RecommendQuery {
    aqi: Option<AqiValue>,
    category: Option<String>,
    profiles: Option<String>,
}

#[derive(Serialize)]
struct RecommendResponse {
    category: AqiCategory,
    blocks: Vec<RecommendationBlock>,
}

#[derive(Deserialize)]
struct PredictRequest {
    readings: PollutantReadings,
    #[serde(default)]
    profiles: Vec<HealthProfile>,
}

#[derive(Serialize)]
struct PredictResponse {
    prediction: Prediction,
    recommendations: Vec<RecommendationBlock>,
}

#[derive(Deserialize)]
struct ImpactRequest {
    action: MitigationAction,
    current_aqi: AqiValue,
}

#[derive(Serialize)]
struct ImpactResponse {
    action: MitigationAction,
    current_aqi: AqiValue,
    current_category: AqiCategory,
    result: ImpactResult,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ok("OK")
}

/// GET /api/cities - Sorted city list
async fn list_cities(State(state): State<AppState>) -> Response {
    ok(analytics::cities(state.data.records()))
}

/// GET /api/cities/:city - One city's records in date order
async fn city_records(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    let records = analytics::city_records(state.data.records(), &city);

    if records.is_empty() {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown city: {}", city));
    }
    ok(records)
}

/// GET /api/cities/:city/summary - Mean/min/max and pollutant contribution
async fn city_summary(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    let records = state.data.records();

    match analytics::summary(records, &city) {
        Some(summary) => ok(CitySummaryResponse {
            pollutants: analytics::pollutant_contribution(records, &city),
            city,
            summary,
        }),
        None => error_response(StatusCode::NOT_FOUND, format!("Unknown city: {}", city)),
    }
}

/// GET /api/cities/:city/export - CSV download
async fn city_export(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    let records = analytics::city_records(state.data.records(), &city);

    if records.is_empty() {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown city: {}", city));
    }

    match export_csv(&records) {
        Ok(csv_text) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}_aqi_data.csv\"", city),
                ),
            ],
            csv_text,
        )
            .into_response(),
        Err(e) => {
            log::error!("Error exporting {}: {:#}", city, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed")
        }
    }
}

/// GET /api/compare?a=&b= - Two cities side by side
async fn compare_cities(State(state): State<AppState>, Query(query): Query<CompareQuery>) -> Response {
    let comparison = analytics::compare(state.data.records(), &query.a, &query.b);

    for trend in [&comparison.first, &comparison.second] {
        if trend.series.is_empty() {
            return error_response(StatusCode::NOT_FOUND, format!("Unknown city: {}", trend.city));
        }
    }
    ok(comparison)
}

/// GET /api/heatmap - Mean AQI by city and month
async fn heatmap(State(state): State<AppState>) -> Response {
    ok(analytics::monthly_heatmap(state.data.records()))
}

/// GET /api/top?limit= - Most polluted cities
async fn top_cities(State(state): State<AppState>, Query(query): Query<TopQuery>) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    ok(analytics::top_polluted(state.data.records(), limit))
}

/// GET /api/classify/:aqi - Category for an AQI value
async fn classify_aqi(Path(raw): Path<String>) -> Response {
    match raw.parse::<AqiValue>() {
        Ok(aqi) => {
            let category = classify(aqi);
            ok(CategoryResponse {
                aqi,
                category,
                color: category.color_hex(),
            })
        }
        Err(_) => error_response(StatusCode::BAD_REQUEST, format!("Not a number: {}", raw)),
    }
}

/// GET /api/recommend?aqi=&profiles= - Aggregated recommendations
async fn recommend(State(state): State<AppState>, Query(query): Query<RecommendQuery>) -> Response {
    let category = match (query.aqi, query.category.as_deref()) {
        (Some(aqi), _) => classify(aqi),
        (None, Some(label)) => match label.parse::<AqiCategory>() {
            Ok(category) => category,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        },
        (None, None) => {
            return error_response(StatusCode::BAD_REQUEST, "Provide either aqi or category")
        }
    };

    let profiles = match parse_profiles(query.profiles.as_deref()) {
        Ok(profiles) => profiles,
        Err(response) => return response,
    };

    ok(RecommendResponse {
        category,
        blocks: state.recommendations.recommend_for_profiles(category, &profiles),
    })
}

/// POST /api/predict - Pollutant readings → AQI, category and advice
async fn predict(State(state): State<AppState>, Json(request): Json<PredictRequest>) -> Response {
    let Some(model) = state.model.as_ref() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Prediction model not loaded");
    };

    let prediction = predict_with_category(model.as_ref(), &request.readings);
    ok(PredictResponse {
        recommendations: state
            .recommendations
            .recommend_for_profiles(prediction.category, &request.profiles),
        prediction,
    })
}

/// POST /api/impact - What-if mitigation estimate
async fn impact(Json(request): Json<ImpactRequest>) -> Response {
    ok(ImpactResponse {
        action: request.action,
        current_aqi: request.current_aqi,
        current_category: classify(request.current_aqi),
        result: estimate(request.action, request.current_aqi),
    })
}

/// GET /api/live/:city - Live AQI or "unavailable"
async fn live_aqi(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    ok(live_aqi_status(state.live_aqi.as_ref(), &city).await)
}

/// GET /api/weather/:city - Current weather or "unavailable"
async fn weather(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    ok(weather_status(state.weather.as_ref(), &city).await)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/cities", get(list_cities))
        .route("/cities/:city", get(city_records))
        .route("/cities/:city/summary", get(city_summary))
        .route("/cities/:city/export", get(city_export))
        .route("/compare", get(compare_cities))
        .route("/heatmap", get(heatmap))
        .route("/top", get(top_cities))
        .route("/classify/:aqi", get(classify_aqi))
        .route("/recommend", get(recommend))
        .route("/predict", post(predict))
        .route("/impact", post(impact))
        .route("/live/:city", get(live_aqi))
        .route("/weather/:city", get(weather))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::live::{LiveAqi, WeatherSnapshot};
    use crate::model::LinearModel;
    use crate::records::{AirQualityRecord, InMemoryHistoricalSource};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FakeLive;

    #[async_trait]
    impl LiveAqiProvider for FakeLive {
        async fn current_aqi(&self, city: &str) -> Result<LiveAqi, FetchError> {
            if city == "Delhi" {
                Ok(LiveAqi {
                    station: "Delhi".to_string(),
                    aqi: 310.0,
                    category: classify(310.0),
                    observed_at: None,
                    dominant_pollutant: Some("pm25".to_string()),
                })
            } else {
                Err(FetchError::Provider("Unknown station".to_string()))
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeLive {
        async fn current_weather(&self, _city: &str) -> Result<WeatherSnapshot, FetchError> {
            Err(FetchError::Status(500))
        }
    }

    fn record(city: &str, day: u32, aqi: f64) -> AirQualityRecord {
        AirQualityRecord {
            city: city.to_string(),
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            pm25: 50.0,
            pm10: 80.0,
            no2: 30.0,
            co: 1.0,
            o3: 40.0,
            aqi,
        }
    }

    fn state(with_model: bool) -> AppState {
        state_with(
            vec![
                record("Delhi", 2, 380.0),
                record("Delhi", 1, 420.0),
                record("New Delhi", 1, 250.0),
                record("Mumbai", 1, 90.0),
            ],
            with_model,
        )
    }

    fn state_with(records: Vec<AirQualityRecord>, with_model: bool) -> AppState {
        let model: Option<Arc<dyn ModelPort>> = if with_model {
            Some(Arc::new(LinearModel::new(0.0, [1.0, 0.5, 0.0, 0.0, 0.0])))
        } else {
            None
        };

        AppState {
            data: Arc::new(InMemoryHistoricalSource::new(records)),
            model,
            recommendations: Arc::new(RecommendationTable::builtin()),
            live_aqi: Arc::new(FakeLive),
            weather: Arc::new(FakeLive),
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(router(state(true)), request).await
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": "OK"}));
    }

    #[tokio::test]
    async fn test_cities_and_records() {
        let (_, body) = get_json("/api/cities").await;
        assert_eq!(body["data"], json!(["Delhi", "Mumbai", "New Delhi"]));

        let (status, body) = get_json("/api/cities/Delhi").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["Date"], "2020-01-01");
        assert_eq!(body["data"][1]["AQI"], 380.0);

        let (status, _) = get_json("/api/cities/New%20Delhi").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_json("/api/cities/Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_city_path_is_decoded_once() {
        let app = router(state_with(vec![record("Zone%20A", 1, 120.0)], true));
        let request = Request::builder()
            .uri("/api/cities/Zone%2520A/summary")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["city"], "Zone%20A");
    }

    #[tokio::test]
    async fn test_summary_and_top() {
        let (_, body) = get_json("/api/cities/Delhi/summary").await;
        assert_eq!(body["data"]["summary"]["mean"], 400.0);
        assert_eq!(body["data"]["summary"]["mean_category"], "Very Poor");
        assert_eq!(body["data"]["pollutants"].as_array().unwrap().len(), 5);

        let (_, body) = get_json("/api/top?limit=2").await;
        let top = body["data"].as_array().unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["city"], "Delhi");
        assert_eq!(top[1]["city"], "New Delhi");
    }

    #[tokio::test]
    async fn test_compare_requires_known_cities() {
        let (status, body) = get_json("/api/compare?a=Delhi&b=Mumbai").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["second"]["city"], "Mumbai");

        let (status, _) = get_json("/api/compare?a=Delhi&b=Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_classify_route() {
        let (_, body) = get_json("/api/classify/100").await;
        assert_eq!(body["data"]["category"], "Satisfactory");
        assert_eq!(body["data"]["color"], "#ffff00");

        let (status, _) = get_json("/api/classify/high").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recommend_route() {
        let (_, body) = get_json("/api/recommend?aqi=250&profiles=asthma,children").await;
        let blocks = body["data"]["blocks"].as_array().unwrap();

        assert_eq!(body["data"]["category"], "Poor");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["profile"], "General");
        assert_eq!(blocks[2]["profile"], "Children");

        let (status, _) = get_json("/api/recommend?aqi=250&profiles=athletes").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json("/api/recommend").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_route() {
        let body = json!({
            "readings": {"pm25": 100.0, "pm10": 200.0, "no2": 0.0, "co": 0.0, "o3": 0.0},
            "profiles": ["Elderly"]
        });

        let (status, response) = post_json(router(state(true)), "/api/predict", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["data"]["prediction"]["aqi"], 200.0);
        assert_eq!(response["data"]["prediction"]["category"], "Moderate");
        assert_eq!(response["data"]["recommendations"][1]["profile"], "Elderly");

        let (status, _) = post_json(router(state(false)), "/api/predict", body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_impact_route() {
        let body = json!({
            "action": {"type": "plant_trees", "count": 10000},
            "current_aqi": 100.0
        });
        let (status, response) = post_json(router(state(true)), "/api/impact", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["data"]["current_category"], "Satisfactory");
        let new_aqi = response["data"]["result"]["new_aqi"].as_f64().unwrap();
        assert!((new_aqi - 99.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_live_routes_report_unavailable() {
        let (_, body) = get_json("/api/live/Delhi").await;
        assert_eq!(body["data"]["status"], "available");
        assert_eq!(body["data"]["data"]["category"], "Very Poor");

        let (status, body) = get_json("/api/live/Atlantis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({"status": "unavailable"}));

        let (_, body) = get_json("/api/weather/Delhi").await;
        assert_eq!(body["data"]["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_export_route() {
        let request = Request::builder()
            .uri("/api/cities/Mumbai/export")
            .body(Body::empty())
            .unwrap();
        let response = router(state(true)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("City,Date,PM2.5,PM10,NO2,CO,O3,AQI\n"));
        assert!(text.contains("Mumbai,2020-01-01"));
    }
}
