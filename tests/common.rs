// tests/common.rs
#![allow(dead_code)]

use serde_json::json;
use tariff_post_classifier::{MediaRef, RawPost};

pub fn analysis_json(related: bool, rate: Option<&str>, published: &str) -> String {
    json!({
        "tariffs_related": related,
        "affected_country": null,
        "affected_region": null,
        "products": ["steel", "aluminum"],
        "published_time": published,
        "tariff_rate": rate,
        "classification": if related { "official" } else { "unknown" },
        "media_analysis": null
    })
    .to_string()
}

pub fn raw_post(i: usize) -> RawPost {
    RawPost {
        created_at: "2025-04-02T20:00:00Z".parse().unwrap(),
        content: format!("post-{i}"),
        media: vec![],
    }
}

pub fn raw_post_with_image(i: usize, url: &str) -> RawPost {
    RawPost {
        media: vec![MediaRef::image(url)],
        ..raw_post(i)
    }
}
