//! End-to-end resolution of template trees against the fixture store

use super::test_utils::{resolver, resolver_for};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use trellis::{ContentStore, Params, ResolveError, StoreError};

fn ids(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_news_feed_grouped_by_day_without_duplicates() {
    let template = json!({
        "feed": {
            "_query": "{cms}/list/news",
            "_process": [
                "TimeAgoInDays",
                "GroupByDate",
                {
                    "action": "RemoveDuplicatesFromGroups",
                    "dedupField": "name",
                    "priorityField": "kind",
                    "priorityValues": ["new", "updated"]
                }
            ]
        }
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    let feed = resolved["feed"].as_array().unwrap();

    let labels: Vec<&str> = feed.iter().map(|g| g["date"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["Today", "Yesterday", "6 days ago"]);
    assert_eq!(ids(&feed[0]["items"]), vec!["n2"]);
    assert_eq!(ids(&feed[1]["items"]), vec!["n3"]);
    assert_eq!(ids(&feed[2]["items"]), vec!["n4"]);
    assert!(feed[1]["items"][0].get("date").is_none());
}

#[tokio::test]
async fn test_events_with_year_and_month_headings() {
    let template = json!({
        "events": {"_query": "{cms}/list/event", "_process": "AddYearMonthHeadings"}
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    assert_eq!(
        resolved["events"],
        json!([
            {"date": "2020", "ref": "2020", "type": "year", "current": true},
            {"date": "June 2020", "ref": "2020-06", "type": "month"},
            {"id": "e1", "type": "event", "TS": 1592665200000i64, "title": "Summer fair"},
            {"date": "2019", "ref": "2019", "type": "year"},
            {"date": "December 2019", "ref": "2019-12", "type": "month"},
            {"id": "e2", "type": "event", "TS": 1575558000000i64, "title": "Winter fair"}
        ])
    );
}

#[tokio::test]
async fn test_calendar_events_and_projection() {
    let template = json!({
        "calendar": {
            "_query": "{cms}/list/event",
            "_process": [
                "CalendarEvents",
                {"action": "Project", "fields": ["title", "year", "month", "day", "time"]}
            ]
        }
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    assert_eq!(
        resolved["calendar"],
        json!([
            {"title": "Summer fair", "year": "2020", "month": "June", "day": "20", "time": "9:00 AM"},
            {"title": "Winter fair", "year": "2019", "month": "December", "day": "05", "time": "9:00 AM"}
        ])
    );
}

#[tokio::test]
async fn test_single_item_article_dates() {
    let template = json!({
        "about": {"_query": "{cms}/get/about", "_process": "ArticleDate"}
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    assert_eq!(
        resolved["about"],
        json!({
            "title": "About",
            "publishUp": "2019-12-05T15:00:00Z",
            "shortDate": "Dec 5",
            "fullDate": "Thursday, December 5, 2019"
        })
    );
}

#[tokio::test]
async fn test_highlights_with_normalized_images() {
    let template = json!({
        "top": {"_query": "{cms}/highlight/home--top", "_process": "NormalizeImages"},
        "hero": {
            "_query": "{cms}/list/news?limit=2",
            "_process": [
                {"action": "NormalizeImages", "fields": "heroImage"},
                {"action": "Project", "fields": ["id", "heroImage"]}
            ]
        }
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    assert_eq!(ids(&resolved["top"]), vec!["n3", "e1"]);
    assert_eq!(
        resolved["hero"],
        json!([
            {"id": "n1", "heroImage": {"url": "launch.jpg", "width": 800}},
            {"id": "n2", "heroImage": {"url": "launch-thumb.jpg"}}
        ])
    );
}

#[tokio::test]
async fn test_caller_limit_is_capped_by_directive() {
    let template = json!({
        "capped": {"_query": "{cms}/list/news?limit=2"},
        "open": {"_query": "{cms}/list/news"},
        "featured": {"_query": "{cms}/featured/news"}
    });
    let mut extra = Params::new();
    extra.insert("limit".to_string(), Some("3".to_string()));
    let resolved = resolver().resolve(&template, Some(&extra)).await.unwrap();
    assert_eq!(ids(&resolved["capped"]), vec!["n1", "n2"]);
    assert_eq!(ids(&resolved["open"]), vec!["n1", "n2", "n3"]);
    assert_eq!(ids(&resolved["featured"]), vec!["n3"]);
}

#[tokio::test]
async fn test_timeline_generator_directive() {
    let template = json!({
        "timeline": {"_query": "{gen}/timeline/months?startDate=2020-05"}
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    assert_eq!(
        resolved["timeline"],
        json!([
            {"date": "2020", "ref": "2020", "type": "year", "current": true},
            {"date": "May 2020", "ref": "2020-05", "type": "month"},
            {"date": "June 2020", "ref": "2020-06", "type": "month"},
            {"date": "July 2020", "ref": "2020-07", "type": "month", "current": true}
        ])
    );
}

#[tokio::test]
async fn test_tree_shape_survives_mixed_failures() {
    let template = json!({
        "site": {"name": {"_data": "Cats"}, "year": 2020},
        "missing": {"_query": "{cms}/get/nope", "_default": {"title": "Fallback"}},
        "unknown_module": {"_query": "{db}/get/x"},
        "random": {"_query": "{cms}/random/news?limit=2"},
        "nested": {"deeper": {"latest": {"_query": "{cms}/list/news?limit=1", "_process": "FirstItem"}}}
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();

    assert_eq!(resolved["site"], json!({"name": "Cats", "year": 2020}));
    assert_eq!(resolved["missing"], json!({"title": "Fallback"}));
    assert_eq!(resolved["unknown_module"], Value::Null);
    assert_eq!(resolved["random"].as_array().unwrap().len(), 2);
    assert_eq!(resolved["nested"]["deeper"]["latest"]["id"], json!("n1"));
    let keys: Vec<&String> = resolved.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["site", "missing", "unknown_module", "random", "nested"]);
}

/// Store whose every operation fails, counting calls
#[derive(Default)]
struct DownStore {
    calls: parking_lot::Mutex<usize>,
}

impl DownStore {
    fn fail(&self) -> Result<Value, StoreError> {
        *self.calls.lock() += 1;
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

#[async_trait]
impl ContentStore for DownStore {
    async fn get(&self, _: &str, _: &Params) -> Result<Value, StoreError> {
        self.fail()
    }
    async fn list_by_type(&self, _: &str, _: &Params) -> Result<Value, StoreError> {
        self.fail()
    }
    async fn featured_by_type(&self, _: &str, _: &Params) -> Result<Value, StoreError> {
        self.fail()
    }
    async fn highlighted_list(&self, _: &str, _: &Params) -> Result<Value, StoreError> {
        self.fail()
    }
    async fn random_list(&self, _: &str, _: &Params) -> Result<Value, StoreError> {
        self.fail()
    }
}

#[tokio::test]
async fn test_backend_outage_resolves_to_defaults() {
    let store = Arc::new(DownStore::default());
    let template = json!({
        "a": {"_query": "{cms}/list/news", "_default": [1, 2]},
        "b": {"_query": "{cms}/get/about"},
        "c": {"_query": "{gen}/timeline/years?startDate=2020"}
    });
    let resolved = resolver_for(store.clone())
        .resolve(&template, None)
        .await
        .unwrap();
    assert_eq!(resolved["a"], json!([1, 2]));
    assert_eq!(resolved["b"], Value::Null);
    assert_eq!(
        resolved["c"],
        json!([{"date": "2020", "ref": "2020", "type": "year", "current": true}])
    );
    assert_eq!(*store.calls.lock(), 2);
}

#[tokio::test]
async fn test_malformed_process_only_affects_its_node() {
    let template = json!({
        "a": {"_query": "{cms}/list/news?limit=1", "_process": 5, "_default": "fallback"},
        "b": {"_query": "{cms}/get/about", "_process": ["ArticleDate", true]},
        "c": {"_data": "ok"}
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    assert_eq!(resolved, json!({"a": "fallback", "b": null, "c": "ok"}));
}

#[tokio::test]
async fn test_out_of_range_dates_stay_local_to_their_node() {
    let template = json!({
        "t": {"_query": "{gen}/timeline/years?endDate=+4000000000 days", "_default": ["unused"]},
        "days": {
            "_query": "{cms}/list/news",
            "_process": {"action": "TimeAgoInDays", "hoursOffset": 1000000000000i64},
            "_default": "fallback"
        },
        "b": {"_data": "ok"}
    });
    let resolved = resolver().resolve(&template, None).await.unwrap();
    assert_eq!(resolved, json!({"t": [], "days": "fallback", "b": "ok"}));
}

#[tokio::test]
async fn test_structural_error_prevents_any_backend_call() {
    let store = Arc::new(DownStore::default());
    let deep = (0..200).fold(json!({"_query": "{cms}/get/about"}), |inner, _| json!({ "x": inner }));
    let template = json!({
        "a": {"_query": "{cms}/list/news"},
        "deep": deep
    });
    let result = resolver_for(store.clone()).resolve(&template, None).await;
    assert!(matches!(result, Err(ResolveError::InvalidTemplate { path, .. }) if path.starts_with("$.deep.x.x")));
    assert_eq!(*store.calls.lock(), 0);
}
