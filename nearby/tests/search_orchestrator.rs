use std::sync::{Arc, Mutex};
use std::time::Duration;

use nearby::api::{Coordinate, SearchOptions};
use nearby::client::{HttpCall, HttpReply, PlacesClient, TransportFn, TransportFuture};
use nearby::location::LocationReading;
use nearby::search::{SearchOrchestrator, SearchOutcome};
use nearby::state::{PlacesStore, SearchState};
use serde_json::{json, Value};
use tokio::sync::Notify;

type Calls = Arc<Mutex<Vec<HttpCall>>>;

fn replying(calls: Calls, code: u16, body: &'static str) -> Arc<TransportFn> {
    Arc::new(move |call: HttpCall| {
        calls.lock().unwrap().push(call);
        Box::pin(async move {
            Ok(HttpReply {
                code,
                body: body.as_bytes().to_vec(),
            })
        }) as TransportFuture
    })
}

fn toronto() -> LocationReading {
    LocationReading {
        coords: Coordinate::new(43.6, -79.4),
        timestamp: 1_700_000_000_000,
    }
}

fn body_of(call: &HttpCall) -> Value {
    serde_json::from_slice(&call.body).expect("json body")
}

#[tokio::test]
async fn search_without_location_sends_nothing() {
    let calls: Calls = Arc::default();
    let store = PlacesStore::new();
    let orch = SearchOrchestrator::new(
        PlacesClient::new_test(replying(calls.clone(), 200, "{}")),
        store.clone(),
    );

    let outcome = orch
        .search(SearchOptions::new().terms("").radius(10.0))
        .await;

    assert_eq!(outcome, SearchOutcome::Failed);
    assert!(calls.lock().unwrap().is_empty());
    let state = store.snapshot();
    assert_eq!(state.error.as_deref(), Some("Waiting for GPS location..."));
    assert!(!state.searching);
    assert!(state.places.is_empty());
}

#[tokio::test]
async fn empty_terms_use_nearby_search() {
    let calls: Calls = Arc::default();
    let store = PlacesStore::new();
    store.record_location(toronto());
    let orch = SearchOrchestrator::new(
        PlacesClient::new_test(replying(calls.clone(), 200, r#"{"places":[]}"#)),
        store.clone(),
    );

    let outcome = orch
        .search(SearchOptions::new().terms("").radius(25.0))
        .await;
    assert_eq!(outcome, SearchOutcome::Completed);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.url, "http://places.test/v1/places:searchNearby");
    assert_eq!(call.header("x-goog-api-key"), Some("test-key"));
    assert_eq!(call.header("X-Goog-FieldMask"), Some("*"));
    assert_eq!(
        body_of(call),
        json!({
            "includedTypes": ["restaurant"],
            "maxResultCount": 10,
            "locationRestriction": {
                "circle": {
                    "center": { "latitude": 43.6, "longitude": -79.4 },
                    "radius": 25.0
                }
            }
        })
    );
}

#[tokio::test]
async fn terms_use_text_search() {
    let calls: Calls = Arc::default();
    let store = PlacesStore::new();
    store.record_location(toronto());
    let orch = SearchOrchestrator::new(
        PlacesClient::new_test(replying(calls.clone(), 200, "{}")),
        store.clone(),
    );

    orch.search(SearchOptions::new().terms("sushi").radius(5.0).page_size(20))
        .await;

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].url, "http://places.test/v1/places:searchText");
    let body = body_of(&calls[0]);
    assert_eq!(body["textQuery"], "sushi");
    assert_eq!(body["includedType"], "restaurant");
    assert_eq!(body["pageSize"], 20);
    assert_eq!(body["locationBias"]["circle"]["radius"], 5.0);
    assert_eq!(body["locationBias"]["circle"]["center"]["latitude"], 43.6);
}

#[tokio::test]
async fn places_are_published_verbatim() {
    let raw = r#"{"places":[
        {"id":"z","displayName":{"text":"Zen"},"servesWine":true},
        {"id":"a","rating":3.5}
    ]}"#;
    let calls: Calls = Arc::default();
    let store = PlacesStore::new();
    store.record_location(toronto());
    let orch = SearchOrchestrator::new(
        PlacesClient::new_test(replying(calls, 200, raw)),
        store.clone(),
    );

    orch.search(SearchOptions::new()).await;

    let state = store.snapshot();
    let published = serde_json::to_value(&state.places).unwrap();
    let expected: Value = serde_json::from_str::<Value>(raw).unwrap()["places"].clone();
    assert_eq!(published, expected);
    assert!(state.error.is_none());
    assert!(!state.searching);
}

#[tokio::test]
async fn http_500_sets_error_and_clears_results() {
    let calls: Calls = Arc::default();
    let store = PlacesStore::new();
    store.record_location(toronto());
    let orch = SearchOrchestrator::new(
        PlacesClient::new_test(replying(calls, 500, "")),
        store.clone(),
    );

    let outcome = orch.search(SearchOptions::new()).await;

    assert_eq!(outcome, SearchOutcome::Failed);
    let state = store.snapshot();
    assert_eq!(
        state.error.as_deref(),
        Some("Request failed with status code 500")
    );
    assert!(state.places.is_empty());
    assert!(!state.searching);
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let body = r#"{"error":{"code":400,"message":"Invalid included_types","status":"INVALID_ARGUMENT"}}"#;
    let store = PlacesStore::new();
    store.record_location(toronto());
    let orch = SearchOrchestrator::new(
        PlacesClient::new_test(replying(Arc::default(), 400, body)),
        store.clone(),
    );

    orch.search(SearchOptions::new().place_type("not_a_type")).await;

    assert_eq!(
        store.snapshot().error.as_deref(),
        Some("Request failed with status code 400: Invalid included_types")
    );
}

#[tokio::test]
async fn in_flight_state_is_fresh_and_location_is_captured_at_dispatch() {
    let store = PlacesStore::new();
    store.record_location(toronto());
    let seen: Arc<Mutex<Option<SearchState>>> = Arc::default();

    let transport: Arc<TransportFn> = {
        let store = store.clone();
        let seen = seen.clone();
        Arc::new(move |_call: HttpCall| {
            *seen.lock().unwrap() = Some(store.snapshot());
            // the device moves while the request is out
            store.record_location(LocationReading {
                coords: Coordinate::new(45.5, -73.6),
                timestamp: 1_700_000_001_000,
            });
            Box::pin(async move {
                Ok(HttpReply {
                    code: 200,
                    body: br#"{"places":[{"id":"new"}]}"#.to_vec(),
                })
            }) as TransportFuture
        })
    };
    let calls: Calls = Arc::default();
    let recorder = {
        let calls = calls.clone();
        Arc::new(move |call: HttpCall| {
            calls.lock().unwrap().push(call.clone());
            transport(call)
        }) as Arc<TransportFn>
    };
    let orch = SearchOrchestrator::new(PlacesClient::new_test(recorder), store.clone());

    // leftovers from an earlier attempt
    store.finish_search(Err(nearby::search::SearchError::LocationUnavailable));
    assert!(store.snapshot().error.is_some());

    orch.search(SearchOptions::new()).await;

    let during = seen.lock().unwrap().clone().expect("transport called");
    assert!(during.searching);
    assert!(during.error.is_none());
    assert!(during.places.is_empty());

    let body = body_of(&calls.lock().unwrap()[0]);
    assert_eq!(
        body["locationRestriction"]["circle"]["center"],
        json!({ "latitude": 43.6, "longitude": -79.4 })
    );

    let after = store.snapshot();
    assert!(!after.searching);
    assert_eq!(after.places.len(), 1);
    assert_eq!(after.location, Some(Coordinate::new(45.5, -73.6)));
}

#[tokio::test]
async fn newer_search_wins_over_slower_older_one() {
    let calls: Calls = Arc::default();
    let gate = Arc::new(Notify::new());
    let store = PlacesStore::new();
    store.record_location(toronto());

    let transport: Arc<TransportFn> = {
        let calls = calls.clone();
        let gate = gate.clone();
        Arc::new(move |call: HttpCall| {
            let query = body_of(&call)["textQuery"].as_str().unwrap_or("").to_string();
            calls.lock().unwrap().push(call);
            let gate = gate.clone();
            Box::pin(async move {
                if query == "slow" {
                    gate.notified().await;
                }
                Ok(HttpReply {
                    code: 200,
                    body: format!(r#"{{"places":[{{"id":"{query}"}}]}}"#).into_bytes(),
                })
            }) as TransportFuture
        })
    };
    let orch = SearchOrchestrator::new(PlacesClient::new_test(transport), store.clone());

    let slow = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.search(SearchOptions::new().terms("slow")).await })
    };
    tokio::time::timeout(Duration::from_secs(2), async {
        while calls.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("slow search dispatched");

    let fast = orch.search(SearchOptions::new().terms("fast")).await;
    assert_eq!(fast, SearchOutcome::Completed);
    assert_eq!(store.snapshot().places[0].id(), Some("fast"));
    assert!(!store.snapshot().searching);

    gate.notify_one();
    let slow = slow.await.unwrap();
    assert_eq!(slow, SearchOutcome::Superseded);

    let state = store.snapshot();
    assert_eq!(state.places.len(), 1);
    assert_eq!(state.places[0].id(), Some("fast"));
    assert!(!state.searching);
}

#[tokio::test]
async fn failed_search_drops_results_from_the_previous_one() {
    let store = PlacesStore::new();
    store.record_location(toronto());
    let seen: Arc<Mutex<Vec<SearchState>>> = Arc::default();

    let transport: Arc<TransportFn> = {
        let store = store.clone();
        let seen = seen.clone();
        Arc::new(move |_call: HttpCall| {
            let mut seen = seen.lock().unwrap();
            seen.push(store.snapshot());
            let reply = if seen.len() == 1 {
                HttpReply {
                    code: 200,
                    body: br#"{"places":[{"id":"a"},{"id":"b"}]}"#.to_vec(),
                }
            } else {
                HttpReply {
                    code: 500,
                    body: Vec::new(),
                }
            };
            Box::pin(async move { Ok(reply) }) as TransportFuture
        })
    };
    let orch = SearchOrchestrator::new(PlacesClient::new_test(transport), store.clone());

    assert_eq!(orch.search(SearchOptions::new()).await, SearchOutcome::Completed);
    assert_eq!(store.snapshot().places.len(), 2);

    assert_eq!(
        orch.search(SearchOptions::new().terms("pizza")).await,
        SearchOutcome::Failed
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].searching);
    assert!(seen[1].places.is_empty(), "old places visible during new search");

    let state = store.snapshot();
    assert!(state.places.is_empty());
    assert_eq!(
        state.error.as_deref(),
        Some("Request failed with status code 500")
    );
    assert!(!state.searching);
}
