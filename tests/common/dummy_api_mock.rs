//! WireMock-based stand-in for the mock thermostat REST API
//!
//! Serves the same three thermostats and the same generated history as the
//! real mock service, so client and tool tests see realistic payloads.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use wiremock::{matchers::any, Mock, MockServer, Request, Respond, ResponseTemplate};

/// (id, name, current, target, mode, humidity)
const THERMOSTATS: &[(&str, &str, f64, f64, &str, f64)] = &[
    ("thermostat-1", "Living Room", 72.0, 70.0, "cooling", 45.0),
    ("thermostat-2", "Bedroom", 68.0, 68.0, "heating", 50.0),
    ("thermostat-3", "Office", 74.0, 72.0, "off", 42.0),
];

fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn find(id: &str) -> Option<&'static (&'static str, &'static str, f64, f64, &'static str, f64)> {
    THERMOSTATS.iter().find(|t| t.0 == id)
}

fn thermostat_json(t: &(&str, &str, f64, f64, &str, f64)) -> Value {
    json!({
        "id": t.0,
        "name": t.1,
        "current_temperature": t.2,
        "target_temperature": t.3,
        "mode": t.4,
        "humidity": t.5,
        "status": "active",
        "last_updated": now(),
    })
}

fn not_found(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"error": format!("Thermostat {id} not found")}))
}

fn history(base: f64, hours: u32) -> Vec<Value> {
    let now = Utc::now();
    (0..hours)
        .map(|i| {
            json!({
                "timestamp": (now - Duration::hours(i64::from(hours - i)))
                    .format("%Y-%m-%dT%H:%M:%S%.6fZ")
                    .to_string(),
                "temperature": base + f64::from(i % 3) - 1.0,
                "humidity": 45 + (i % 5),
            })
        })
        .collect()
}

/// Routes every request the way the mock thermostat service does
pub struct DummyApiResponder;

impl Respond for DummyApiResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().trim_matches('/').to_string();
        let parts: Vec<&str> = path.split('/').collect();
        let method = request.method.as_str();

        match (method, parts.as_slice()) {
            ("GET", ["thermostats"]) => {
                let thermostats: Vec<Value> = THERMOSTATS.iter().map(thermostat_json).collect();
                ResponseTemplate::new(200).set_body_json(json!({
                    "count": thermostats.len(),
                    "thermostats": thermostats,
                }))
            }
            ("GET", ["thermostats", id]) => match find(id) {
                Some(t) => ResponseTemplate::new(200).set_body_json(thermostat_json(t)),
                None => not_found(id),
            },
            ("POST", ["thermostats", id, "temperature"]) => {
                let Some(t) = find(id) else {
                    return not_found(id);
                };
                let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
                let Some(temperature) = body["temperature"].as_f64() else {
                    return ResponseTemplate::new(400)
                        .set_body_json(json!({"error": "Request body is required"}));
                };
                if !(50.0..=90.0).contains(&temperature) {
                    return ResponseTemplate::new(400)
                        .set_body_json(json!({"error": "Invalid request"}));
                }
                let unit = body["unit"].as_str().unwrap_or("fahrenheit");
                ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "thermostat_id": t.0,
                    "previous_temperature": t.3,
                    "new_temperature": temperature,
                    "unit": unit,
                    "estimated_time_minutes": ((temperature - t.2).abs() * 5.0) as u32,
                    "timestamp": now(),
                }))
            }
            ("GET", ["thermostats", id, "history"]) => {
                let Some(t) = find(id) else {
                    return not_found(id);
                };
                let hours = request
                    .url
                    .query_pairs()
                    .find(|(k, _)| k == "hours")
                    .and_then(|(_, v)| v.parse::<u32>().ok())
                    .unwrap_or(24)
                    .min(168);
                let history = history(t.2, hours);
                ResponseTemplate::new(200).set_body_json(json!({
                    "thermostat_id": t.0,
                    "count": history.len(),
                    "history": history,
                }))
            }
            _ => ResponseTemplate::new(404)
                .set_body_json(json!({"error": "Endpoint not found", "path": path})),
        }
    }
}

/// Mock thermostat API backed by a wiremock server
pub struct MockDummyApi {
    pub server: MockServer,
}

impl MockDummyApi {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(DummyApiResponder)
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }
}
