//! Image normalization: derive `heroImage`, `heroLink` and `thumbImage` from
//! whichever of the known image layouts a record uses.

use super::NormalizeImagesParams;
use crate::value::{get_path, is_truthy};
use serde_json::{Map, Value};

/// A candidate source: where the url lives, and the node carrying its dimensions
type Candidate = (&'static str, Option<&'static str>);

const HERO_IMAGE: &[Candidate] = &[
    ("image.url", Some("image")),
    ("images.hero.full.url", Some("images.hero.full")),
    ("images.hero.url", Some("images.hero")),
    ("image", None),
];

const HERO_LINK: &[Candidate] = &[
    ("image.link", Some("image")),
    ("images.hero.link", Some("images.hero")),
    ("image-link", None),
];

const THUMB_IMAGE: &[Candidate] = &[
    ("image.url", Some("image")),
    ("images.hero.thumb.url", Some("images.hero.thumb")),
    ("thumb", None),
    ("image", None),
    ("images.hero.url", Some("images.hero")),
    ("images.hero.full.url", Some("images.hero.full")),
];

fn check_node(record: &Value, (url_path, node_path): Candidate) -> Option<Map<String, Value>> {
    let url = get_path(record, url_path)
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())?;

    let mut node = Map::new();
    node.insert("url".to_string(), Value::String(url.to_string()));
    if let Some(source) = node_path.and_then(|path| get_path(record, path)) {
        for dimension in ["width", "height"] {
            if is_truthy(source.get(dimension)) {
                node.insert(dimension.to_string(), source[dimension].clone());
            }
        }
    }
    Some(node)
}

fn first_match(record: &Value, candidates: &[Candidate]) -> Option<Map<String, Value>> {
    candidates.iter().find_map(|c| check_node(record, *c))
}

fn normalize_record(record: &mut Value, fields: &[String]) {
    for field in fields {
        if !record.is_object() || is_truthy(record.get(field.as_str())) {
            continue;
        }
        let derived = match field.as_str() {
            "heroImage" => first_match(record, HERO_IMAGE).map(Value::Object),
            "thumbImage" => first_match(record, THUMB_IMAGE).map(Value::Object),
            "heroLink" => first_match(record, HERO_LINK).and_then(|mut node| node.remove("url")),
            _ => None,
        };
        if let (Some(value), Value::Object(map)) = (derived, &mut *record) {
            map.insert(field.clone(), value);
        }
    }
}

/// Add the requested derived image fields to one record or each record of a
/// sequence. Existing truthy fields are left alone.
pub fn normalize_images(mut input: Value, params: &NormalizeImagesParams) -> Value {
    match &mut input {
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize_record(item, &params.fields);
            }
        }
        record => normalize_record(record, &params.fields),
    }
    input
}
