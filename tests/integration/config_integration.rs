//! Integration tests for the configuration system driving real commands

use super::test_utils::isolate_env;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use trellis::cli::{Commands, RunContext};
use trellis::config::{ConfigLoader, TrellisConfig};
use trellis::ApiError;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A site with its own config, a content fixture and one page template
fn site(root: &Path) {
    write(
        &root.join("config/config.toml"),
        r#"
context_dir = "templates"

[urls]
static_url = "https://cdn.example.com"
base_url = "https://example.com"
php_url = "."

[store]
fixture = "content/items.json"

[resolver]
directive_timeout_ms = 5000
"#,
    );
    write(
        &root.join("content/items.json"),
        r#"{"items": [
            {"id": "welcome", "type": "page", "Data": {"title": "Welcome"}},
            {"id": "a1", "type": "article", "TS": 3, "Data": {"title": "Third"}},
            {"id": "a2", "type": "article", "TS": 2, "Data": {"title": "Second"}},
            {"id": "a3", "type": "article", "TS": 1, "Data": {"title": "First"}}
        ]}"#,
    );
    write(
        &root.join("templates/global.json"),
        r#"{"welcome": {"_query": "{cms}/get/welcome"}}"#,
    );
    write(
        &root.join("templates/pages/articles.json"),
        r#"{"articles": {"_query": "{cms}/list/article?limit=2", "_default": []}}"#,
    );
}

#[tokio::test]
async fn test_workspace_config_drives_page_command() {
    let temp_dir = TempDir::new().unwrap();
    let _env = isolate_env(&temp_dir.path().join("xdg"));
    let root = temp_dir.path().join("site");
    site(&root);

    let ctx = RunContext::new(root.clone(), None).unwrap();
    assert_eq!(ctx.config().context_path(&root), root.join("templates"));

    let output = ctx
        .execute(&Commands::Page {
            name: "articles".to_string(),
            store: None,
            params: vec![("limit".to_string(), Some("5".to_string()))],
        })
        .await
        .unwrap();
    let context: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(context["STATIC"], json!("https://cdn.example.com"));
    assert_eq!(context["BASE"], json!("https://example.com"));
    assert_eq!(context["PHP"], json!("."));
    assert_eq!(context["query"], json!({"limit": "5"}));
    assert_eq!(context["global"], json!({"welcome": {"title": "Welcome"}}));
    assert_eq!(
        context["page"],
        json!({"articles": [{"title": "Third"}, {"title": "Second"}]})
    );
}

#[tokio::test]
async fn test_environment_overrides_workspace_urls() {
    let temp_dir = TempDir::new().unwrap();
    let _env = isolate_env(&temp_dir.path().join("xdg"));
    let root = temp_dir.path().join("site");
    site(&root);
    std::env::set_var("TRELLIS__URLS__BASE_URL", "https://staging.example.com");

    let output = RunContext::new(root, None)
        .unwrap()
        .execute(&Commands::Page {
            name: "articles".to_string(),
            store: None,
            params: vec![],
        })
        .await
        .unwrap();
    let context: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(context["BASE"], json!("https://staging.example.com"));
    assert_eq!(context["query"], Value::Null);
}

#[test]
fn test_global_file_is_lowest_file_layer() {
    let temp_dir = TempDir::new().unwrap();
    let xdg = temp_dir.path().join("xdg");
    let _env = isolate_env(&xdg);
    write(
        &xdg.join("trellis/config.toml"),
        r#"
[urls]
base_url = "https://global.example.com"

[dates]
utc_offset_minutes = 60

[logging]
level = "debug"
"#,
    );
    let root = temp_dir.path().join("site");
    site(&root);

    let config = ConfigLoader::load(&root).unwrap();
    assert_eq!(config.dates.utc_offset_minutes, 60);
    assert_eq!(config.urls.base_url, "https://example.com");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.output, "stderr");
}

#[tokio::test]
async fn test_explicit_config_file_and_config_command() {
    let temp_dir = TempDir::new().unwrap();
    let _env = isolate_env(&temp_dir.path().join("xdg"));
    let root = temp_dir.path().join("site");
    site(&root);
    let explicit = temp_dir.path().join("other.toml");
    write(
        &explicit,
        r#"
[dates]
utc_offset_minutes = 120
"#,
    );

    let ctx = RunContext::new(root.clone(), Some(explicit)).unwrap();
    assert_eq!(ctx.config().urls.base_url, "");
    assert_eq!(ctx.config().store.fixture, None);

    let rendered = ctx.execute(&Commands::Config).await.unwrap();
    let round_trip: TrellisConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(round_trip.dates.utc_offset_minutes, 120);
    assert_eq!(&round_trip, ctx.config());

    let missing = RunContext::new(root, Some(temp_dir.path().join("absent.toml")));
    assert!(matches!(missing, Err(ApiError::ConfigError(_))));
}

#[test]
fn test_invalid_workspace_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let _env = isolate_env(&temp_dir.path().join("xdg"));
    let root = temp_dir.path().join("site");
    write(
        &root.join("config/config.toml"),
        r#"
[urls]
base_url = "https://example.com/"

[dates]
utc_offset_minutes = 5000
"#,
    );

    match ConfigLoader::load(&root) {
        Err(ApiError::ConfigError(message)) => {
            assert!(message.contains("base_url"), "{}", message);
            assert!(message.contains("utc_offset_minutes"), "{}", message);
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}
