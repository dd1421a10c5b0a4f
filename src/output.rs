// src/output.rs
//! Tier writers: pretty JSON documents and flat CSV tables.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::partition::{Tier, Tiers};
use crate::pipeline::EnrichedPost;
use crate::prompt::format_timestamp;

pub const CSV_COLUMNS: [&str; 11] = [
    "created_at",
    "content",
    "media",
    "tariffs_related",
    "affected_country",
    "affected_region",
    "products",
    "published_time",
    "tariff_rate",
    "classification",
    "media_analysis",
];

pub struct OutputSink {
    dir: PathBuf,
}

impl OutputSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write both formats for every tier. A failing file does not stop the
    /// others; all failures are reported together at the end.
    pub fn write_tiers(&self, tiers: &Tiers<'_>) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating output dir {}", self.dir.display()))?;

        let mut written = Vec::with_capacity(Tier::ALL.len() * 2);
        let mut failures = Vec::new();
        for tier in Tier::ALL {
            let posts = tiers.get(tier);
            let json_path = self.dir.join(format!("{}.json", tier.file_stem()));
            let csv_path = self.dir.join(format!("{}.csv", tier.file_stem()));

            for (path, res) in [
                (&json_path, write_json(&json_path, posts)),
                (&csv_path, write_csv(&csv_path, posts)),
            ] {
                match res {
                    Ok(()) => {
                        tracing::info!(tier = ?tier, rows = posts.len(), path = %path.display(), "wrote tier");
                        written.push(path.clone());
                    }
                    Err(e) => {
                        tracing::warn!(tier = ?tier, path = %path.display(), error = ?e, "tier write failed");
                        failures.push(format!("{}: {e:#}", path.display()));
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(written)
        } else {
            Err(anyhow!("failed to write {} file(s): {}", failures.len(), failures.join("; ")))
        }
    }
}

/// Write to a sibling temp file, then rename into place.
fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> Result<()>,
{
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let file = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let mut w = BufWriter::new(file);
    fill(&mut w)?;
    w.flush()?;
    drop(w);
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

pub fn write_json(path: &Path, posts: &[&EnrichedPost]) -> Result<()> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, posts).context("serializing tier json")?;
        w.write_all(b"\n")?;
        Ok(())
    })
}

pub fn write_csv(path: &Path, posts: &[&EnrichedPost]) -> Result<()> {
    write_atomic(path, |w| {
        let mut csv = csv::Writer::from_writer(w);
        csv.write_record(CSV_COLUMNS)?;
        for post in posts {
            csv.write_record(csv_row(post))?;
        }
        csv.flush()?;
        Ok(())
    })
}

/// One CSV row. Error-results leave every classification column empty.
pub fn csv_row(post: &EnrichedPost) -> [String; 11] {
    let media = serde_json::to_string(&post.post.media).unwrap_or_else(|_| "[]".to_string());
    let mut row: [String; 11] = Default::default();
    row[0] = format_timestamp(&post.post.created_at);
    row[1] = post.post.content.clone();
    row[2] = media;

    if let Some(a) = post.classification.analysis() {
        row[3] = a.tariffs_related.to_string();
        row[4] = a.affected_country.clone().unwrap_or_default();
        row[5] = a.affected_region.clone().unwrap_or_default();
        row[6] = a.products.join(", ");
        row[7] = a.published_time.clone();
        row[8] = a.tariff_rate.clone().unwrap_or_default();
        row[9] = a.classification.as_str().to_string();
        row[10] = a.media_analysis.clone().unwrap_or_default();
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassificationResult, Stance, TariffAnalysis};
    use crate::source::{MediaRef, RawPost};

    fn enriched(c: ClassificationResult) -> EnrichedPost {
        EnrichedPost {
            post: RawPost {
                created_at: "2025-04-02T20:00:00Z".parse().unwrap(),
                content: "Liberation Day, \"reciprocal\" tariffs".into(),
                media: vec![MediaRef::image("https://x.test/a.jpg")],
            },
            classification: c,
        }
    }

    #[test]
    fn products_are_comma_joined() {
        let p = enriched(ClassificationResult::Analysis(TariffAnalysis {
            tariffs_related: true,
            affected_country: Some("Canada".into()),
            affected_region: None,
            products: vec!["steel".into(), "aluminum".into()],
            published_time: "2025-04-02T20:00:00Z".into(),
            tariff_rate: Some("25%".into()),
            classification: Stance::Official,
            media_analysis: None,
        }));
        let row = csv_row(&p);
        assert_eq!(row[3], "true");
        assert_eq!(row[4], "Canada");
        assert_eq!(row[5], "");
        assert_eq!(row[6], "steel, aluminum");
        assert_eq!(row[9], "official");
    }

    #[test]
    fn error_result_renders_empty_classification_columns() {
        let row = csv_row(&enriched(ClassificationResult::error("timeout")));
        assert_eq!(row[0], "2025-04-02T20:00:00Z");
        assert_eq!(row[2], r#"[{"type":"image","url":"https://x.test/a.jpg"}]"#);
        assert!(row[3..].iter().all(String::is_empty));
    }
}
