//! Integration tests for IpGeolocation using wiremock.

use std::time::Duration;

use geoweather_core::{IpGeolocation, LocationError, LocationProvider};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn resolves_coordinate_from_lookup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 59.9127,
            "lon": 10.7461,
            "city": "Oslo"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = IpGeolocation::with_base_url(mock_server.uri()).unwrap();

    assert!(provider.is_enabled().await);
    let fix = provider.current_location(Duration::from_secs(5)).await.unwrap();
    assert_eq!((fix.latitude, fix.longitude), (59.9127, 10.7461));
}

#[tokio::test]
async fn failed_lookup_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&mock_server)
        .await;

    let provider = IpGeolocation::with_base_url(mock_server.uri()).unwrap();
    let err = provider.current_location(Duration::from_secs(5)).await.unwrap_err();

    match err {
        LocationError::Unavailable(msg) => assert!(msg.contains("private range")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_lookup_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "success", "lat": 1.0, "lon": 2.0 }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let provider = IpGeolocation::with_base_url(mock_server.uri()).unwrap();
    let err = provider.current_location(Duration::from_millis(50)).await.unwrap_err();

    assert!(matches!(err, LocationError::Timeout(_)));
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let provider = IpGeolocation::with_base_url(mock_server.uri()).unwrap();
    let err = provider.current_location(Duration::from_secs(5)).await.unwrap_err();

    assert!(matches!(err, LocationError::Unavailable(_)));
}
