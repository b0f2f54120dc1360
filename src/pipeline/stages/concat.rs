// src/pipeline/stages/concat.rs

use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{ready, Stage, StageContext, StageFuture, StageResult};

/// Joins every asset into a single `output` file, in collection order.
#[derive(Debug)]
pub struct ConcatStage {
    output: String,
    separator: String,
}

impl ConcatStage {
    pub fn new(output: String, separator: Option<String>) -> Self {
        Self {
            output,
            separator: separator.unwrap_or_else(|| "\n".to_string()),
        }
    }

    fn join(&self, assets: Vec<Asset>) -> StageResult<Vec<Asset>> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }

        let mut contents = Vec::new();
        let mut merged = Asset::new(self.output.clone(), Vec::new());
        for (idx, asset) in assets.into_iter().enumerate() {
            if idx > 0 {
                contents.extend_from_slice(self.separator.as_bytes());
            }
            contents.extend_from_slice(&asset.contents);
            for origin in asset.origins {
                merged.add_origin(origin);
            }
        }
        merged.contents = contents;

        Ok(vec![merged])
    }
}

impl Stage for ConcatStage {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, _ctx: &'a StageContext) -> StageFuture<'a> {
        ready(self.join(assets))
    }
}
