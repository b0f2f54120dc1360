// src/pipeline/stages/mod.rs

//! Built-in stages and the factory that builds them from configuration.

pub mod autoprefix;
pub mod command;
pub mod concat;
pub mod html_minify;
pub mod include;
pub mod sass;
pub mod script;
pub mod sourcemap;
pub mod svg_sprite;
pub mod template;

use anyhow::Context;

use crate::config::{StageConfig, StageKind};
use crate::pipeline::stage::Stage;
use crate::types::BuildEnv;

pub use autoprefix::AutoprefixStage;
pub use command::CommandStage;
pub use concat::ConcatStage;
pub use html_minify::HtmlMinifyStage;
pub use include::IncludeStage;
pub use sass::SassStage;
pub use script::ScriptStage;
pub use sourcemap::SourcemapStage;
pub use svg_sprite::SvgSpriteStage;
pub use template::TemplateStage;

/// Build a stage for `env` from its configuration.
pub fn build_stage(config: &StageConfig, env: BuildEnv) -> anyhow::Result<Box<dyn Stage>> {
    let stage: Box<dyn Stage> = match &config.kind {
        StageKind::Include { prefix } => Box::new(
            IncludeStage::new(prefix)
                .with_context(|| format!("invalid include prefix '{prefix}'"))?,
        ),
        StageKind::Template { extension, strict } => {
            Box::new(TemplateStage::new(extension.clone(), *strict, env))
        }
        StageKind::Sass { style, load_paths } => {
            Box::new(SassStage::new(*style, load_paths.clone(), env))
        }
        StageKind::Autoprefix {} => Box::new(AutoprefixStage::new()?),
        StageKind::Script { minify, target } => {
            Box::new(ScriptStage::new(*minify, target.unwrap_or_default(), env))
        }
        StageKind::HtmlMinify {} => Box::new(HtmlMinifyStage::new()),
        StageKind::SvgSprite {
            output,
            remove_style,
        } => Box::new(SvgSpriteStage::new(output.clone(), *remove_style)?),
        StageKind::Concat { output, separator } => {
            Box::new(ConcatStage::new(output.clone(), separator.clone()))
        }
        StageKind::Sourcemap {} => Box::new(SourcemapStage::new()),
        StageKind::Command { cmd, extension } => {
            Box::new(CommandStage::new(cmd.clone(), extension.clone()))
        }
    };
    Ok(stage)
}
