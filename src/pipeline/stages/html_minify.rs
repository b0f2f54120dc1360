// src/pipeline/stages/html_minify.rs

use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{map_each, ready, Stage, StageContext, StageFuture, StageResult};

/// Elements whose content is whitespace-sensitive.
const RAW_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

/// Removes indentation and blank lines from HTML.
///
/// Lines inside `<pre>`, `<textarea>`, `<script>` and `<style>` are kept
/// verbatim.
#[derive(Debug, Default)]
pub struct HtmlMinifyStage;

impl HtmlMinifyStage {
    pub fn new() -> Self {
        Self
    }

    fn process(&self, mut asset: Asset) -> StageResult<Asset> {
        let html = minify_html(asset.text()?);
        asset.set_text(html);
        Ok(asset)
    }
}

pub fn minify_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut raw_depth: usize = 0;

    for line in html.lines() {
        if raw_depth > 0 {
            out.push_str(line);
            out.push('\n');
        } else {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push('\n');
            }
        }

        let lower = line.to_ascii_lowercase();
        for tag in RAW_ELEMENTS {
            let opens = count_tags(&lower, &format!("<{tag}"));
            let closes = count_tags(&lower, &format!("</{tag}"));
            raw_depth = (raw_depth + opens).saturating_sub(closes);
        }
    }

    out
}

/// Count `needle` occurrences followed by `>` or whitespace.
fn count_tags(line: &str, needle: &str) -> usize {
    line.match_indices(needle)
        .filter(|(idx, _)| {
            line[idx + needle.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c.is_whitespace())
        })
        .count()
}

impl Stage for HtmlMinifyStage {
    fn name(&self) -> &'static str {
        "html_minify"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, _ctx: &'a StageContext) -> StageFuture<'a> {
        ready(map_each(assets, |asset| self.process(asset)))
    }
}
