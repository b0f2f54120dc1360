// src/pipeline/stages/include.rs

use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::pipeline::asset::{Asset, Origin};
use crate::pipeline::stage::{map_each, ready, Stage, StageContext, StageError, StageFuture, StageResult};

/// Nesting limit; also stops include loops spelled through different paths.
const MAX_DEPTH: usize = 32;

/// Expands `@@include("path")` directives.
///
/// Paths are relative to the file containing the directive. Included files
/// are expanded recursively and recorded as origins of the asset.
#[derive(Debug)]
pub struct IncludeStage {
    directive: Regex,
}

impl IncludeStage {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r#"{}include\(\s*["']([^"']+)["']\s*\)"#,
            regex::escape(prefix)
        );
        Ok(Self {
            directive: Regex::new(&pattern)?,
        })
    }

    fn expand_asset(&self, mut asset: Asset, ctx: &StageContext) -> StageResult<Asset> {
        let text = asset.text()?.to_owned();
        if !self.directive.is_match(&text) {
            return Ok(asset);
        }

        let file = ctx.source_path(&asset);
        let mut stack = vec![file.clone()];
        let mut origins = Vec::new();
        let expanded = self.expand(&text, &file, ctx, &mut stack, &mut origins)?;

        asset.set_text(expanded);
        for origin in origins {
            asset.add_origin(origin);
        }
        Ok(asset)
    }

    fn expand(
        &self,
        text: &str,
        file: &Path,
        ctx: &StageContext,
        stack: &mut Vec<PathBuf>,
        origins: &mut Vec<Origin>,
    ) -> StageResult<String> {
        let rel_file = relative_to(file, &ctx.source_root);
        let dir = file.parent().unwrap_or(Path::new(""));

        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.directive.captures_iter(text) {
            let (Some(whole), Some(arg)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            let target = normalize(&dir.join(arg.as_str()));
            if stack.contains(&target) || stack.len() >= MAX_DEPTH {
                return Err(StageError::for_file(
                    rel_file,
                    format!("include cycle through '{}'", arg.as_str()),
                ));
            }

            let included = ctx.fs.read_to_string(&target).map_err(|e| {
                StageError::for_file(
                    rel_file.clone(),
                    format!("cannot include '{}': {e:#}", arg.as_str()),
                )
            })?;

            stack.push(target.clone());
            let nested = self.expand(&included, &target, ctx, stack, origins)?;
            stack.pop();

            origins.push(Origin::new(relative_to(&target, &ctx.source_root), Some(included)));
            out.push_str(&nested);
        }

        out.push_str(&text[last..]);
        Ok(out)
    }
}

/// Resolve `.` and `..` without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

impl Stage for IncludeStage {
    fn name(&self) -> &'static str {
        "include"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, ctx: &'a StageContext) -> StageFuture<'a> {
        ready(map_each(assets, |asset| self.expand_asset(asset, ctx)))
    }
}
