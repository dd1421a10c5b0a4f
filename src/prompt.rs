// src/prompt.rs
//! Prompt composition for the tariff classifier. Pure string building.

use chrono::SecondsFormat;

use crate::source::RawPost;

/// System instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are a tariff analysis assistant tasked with reviewing Donald Trump's posts on TruthSocial. \
Your objective is to identify and analyze Trump's positions, announcements, or intended actions regarding tariffs. \
Analyze both textual statements and visual content included in his posts. If Trump references news articles, \
only consider them if he explicitly supports or announces something based on the article's content. \
Ignore announcements or claims made solely by other individuals unless officially endorsed or mentioned explicitly by Trump himself.\
\n\nRespond strictly with JSON matching the provided schema.";

const TASK_HEADER: &str = r#"Analyze the following post and provide a JSON object with the following keys:
- "tariffs_related": true or false
- "affected_country": string or null
- "affected_region": string or null
- "products": a list of strings (empty list if none)
- "published_time": string (should match the post's created_at)
- "tariff_rate": string (e.g. "50%", or null if not mentioned)
- "classification": string ("threat" or "official" or "unknown")
- "media_analysis": string (a brief analysis of the media if present, or null)"#;

/// Timestamp rendering shared by prompts and CSV rows.
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Build the user prompt for one post. `media_fragments` are the inliner
/// outputs for `post.media`, in the same order.
pub fn build_prompt(post: &RawPost, media_fragments: &[String]) -> String {
    let media_json = serde_json::to_string(&post.media).unwrap_or_else(|_| "[]".to_string());
    let mut out = String::with_capacity(
        TASK_HEADER.len()
            + post.content.len()
            + media_json.len()
            + media_fragments.iter().map(String::len).sum::<usize>()
            + 128,
    );
    out.push('\n');
    out.push_str(TASK_HEADER);
    out.push_str("\n\nPost details:\n");
    out.push_str(&format!("Published time: {}\n", format_timestamp(&post.created_at)));
    out.push_str(&format!("Content: {}\n", post.content));
    out.push_str(&format!("Media URLs: {media_json}\n"));
    for frag in media_fragments {
        out.push_str(frag);
    }
    out.push('\n');
    out
}
