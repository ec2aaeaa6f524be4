//! WireMock-based OpenWeatherMap mocking

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// 2024-01-15 12:00:00 UTC
pub const NOON: i64 = 1_705_320_000;

pub fn current_weather_json() -> Value {
    json!({
        "name": "London",
        "dt": NOON,
        "main": {"temp": 46.4, "feels_like": 42.1, "humidity": 81, "pressure": 1012},
        "weather": [{"main": "Clouds", "description": "overcast clouds"}],
        "wind": {"speed": 9.2, "deg": 240},
        "clouds": {"all": 90}
    })
}

pub fn forecast_json(count: usize) -> Value {
    let list: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "dt": NOON + (i as i64) * 3 * 3600,
                "main": {"temp": 45.0 + i as f64, "feels_like": 40.0, "humidity": 70},
                "weather": [{"description": "light rain"}],
                "wind": {"speed": 5.5},
                "pop": if i == 0 { 0.4 } else { 0.0 }
            })
        })
        .collect();
    json!({"cod": "200", "cnt": count, "list": list})
}

pub fn alerts_json() -> Value {
    json!({
        "lat": 51.5,
        "lon": -0.12,
        "alerts": [{
            "sender_name": "Met Office",
            "event": "Yellow Wind Warning",
            "start": NOON,
            "end": NOON + 6 * 3600,
            "description": "Strong winds expected",
            "tags": ["Wind"]
        }]
    })
}

pub struct MockWeatherServer {
    pub server: MockServer,
}

impl MockWeatherServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn mount_current(&self, units: &str) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", units))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_json()))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_forecast(&self, cnt: &str, count: usize) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("q", "London"))
            .and(query_param("cnt", cnt))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(count)))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_alerts(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .and(query_param("exclude", "current,minutely,hourly,daily"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_not_found(&self) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&self.server)
            .await;
    }
}
