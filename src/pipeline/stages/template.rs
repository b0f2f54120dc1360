// src/pipeline/stages/template.rs

use std::error::Error as _;
use std::sync::Arc;

use minijinja::{context, Environment, ErrorKind, UndefinedBehavior};

use crate::pipeline::asset::Asset;
use crate::pipeline::source::slash_path;
use crate::pipeline::stage::{map_each, ready, Stage, StageContext, StageError, StageFuture, StageResult};
use crate::types::BuildEnv;

/// Renders page templates with MiniJinja.
///
/// `{% include %}` and `{% extends %}` names resolve against the task's base
/// directory. Pages see two variables: `env` ("development"/"production")
/// and `page` (the page's output path).
#[derive(Debug)]
pub struct TemplateStage {
    extension: String,
    strict: bool,
    env: BuildEnv,
}

impl TemplateStage {
    pub fn new(extension: Option<String>, strict: Option<bool>, env: BuildEnv) -> Self {
        Self {
            extension: extension.unwrap_or_else(|| "html".to_string()),
            strict: strict.unwrap_or(true),
            env,
        }
    }

    fn environment(&self, ctx: &StageContext) -> Environment<'static> {
        let mut jinja = Environment::new();
        jinja.set_keep_trailing_newline(true);
        if self.strict {
            jinja.set_undefined_behavior(UndefinedBehavior::Strict);
        }

        let fs = Arc::clone(&ctx.fs);
        let base = ctx.base_dir.clone();
        jinja.set_loader(move |name: &str| {
            let path = base.join(name);
            if !fs.is_file(&path) {
                return Ok(None);
            }
            fs.read_to_string(&path).map(Some).map_err(|e| {
                minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("cannot load template '{name}': {e:#}"),
                )
            })
        });

        jinja
    }

    fn render(&self, jinja: &Environment<'static>, mut asset: Asset) -> StageResult<Asset> {
        asset.set_extension(&self.extension);
        let name = slash_path(&asset.path);
        let source = asset.text()?.to_owned();

        let html = jinja
            .render_named_str(&name, &source, context! { env => self.env.as_str(), page => name.clone() })
            .map_err(|e| StageError::for_file(asset.display_path(), describe(&e)))?;

        asset.set_text(html);
        Ok(asset)
    }
}

/// MiniJinja errors chain included-template failures through `source()`.
fn describe(err: &minijinja::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "template"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, ctx: &'a StageContext) -> StageFuture<'a> {
        let jinja = self.environment(ctx);
        ready(map_each(assets, |asset| self.render(&jinja, asset)))
    }
}
