// src/pipeline/stages/sourcemap.rs

use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;

use crate::pipeline::asset::Asset;
use crate::pipeline::source::slash_path;
use crate::pipeline::stage::{ready, Stage, StageContext, StageError, StageFuture, StageResult};

/// Source map v3 document.
///
/// Assets carrying a [`SourceMapping`](crate::pipeline::SourceMapping) get
/// its single source and position mappings. Others list every origin with
/// its original text and no positions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub source_root: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn for_asset(asset: &Asset) -> Self {
        if let Some(mapping) = &asset.mapping {
            return Self {
                version: 3,
                file: file_name(&asset.path),
                source_root: "/source/".to_string(),
                sources: vec![slash_path(&mapping.source)],
                sources_content: vec![Some(mapping.content.clone())],
                names: Vec::new(),
                mappings: mapping.mappings.clone(),
            };
        }
        Self {
            version: 3,
            file: file_name(&asset.path),
            source_root: "/source/".to_string(),
            sources: asset.origins.iter().map(|o| slash_path(&o.path)).collect(),
            sources_content: asset.origins.iter().map(|o| o.contents.clone()).collect(),
            names: Vec::new(),
            mappings: String::new(),
        }
    }
}

/// Writes an external `.map` next to every CSS and JS asset and links it
/// with a `sourceMappingURL` comment. Other assets pass through.
#[derive(Debug, Default)]
pub struct SourcemapStage;

impl SourcemapStage {
    pub fn new() -> Self {
        Self
    }

    fn attach(&self, assets: Vec<Asset>) -> StageResult<Vec<Asset>> {
        let mut out = Vec::with_capacity(assets.len() * 2);

        for mut asset in assets {
            let comment = match asset.extension() {
                Some("css") => "/*# sourceMappingURL={} */",
                Some("js") => "//# sourceMappingURL={}",
                _ => {
                    out.push(asset);
                    continue;
                }
            };

            let map = SourceMap::for_asset(&asset);
            let json = serde_json::to_string(&map).map_err(|e| {
                StageError::for_file(asset.display_path(), format!("cannot encode source map: {e}"))
            })?;

            let map_path = map_path(&asset.path);
            let link = comment.replace("{}", &file_name(&map_path));

            let mut text = asset.text()?.to_owned();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&link);
            text.push('\n');
            asset.set_text(text);

            out.push(asset);
            out.push(Asset::new(map_path, json));
        }

        Ok(out)
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `css/main.css` → `css/main.css.map`.
fn map_path(path: &std::path::Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".map");
    PathBuf::from(name)
}

impl Stage for SourcemapStage {
    fn name(&self) -> &'static str {
        "sourcemap"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, _ctx: &'a StageContext) -> StageFuture<'a> {
        ready(self.attach(assets))
    }
}
