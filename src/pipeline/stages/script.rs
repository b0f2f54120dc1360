// src/pipeline/stages/script.rs

use std::path::PathBuf;

use swc_common::comments::{Comments, SingleThreadedComments};
use swc_common::source_map::SourceMapGenConfig;
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, GLOBALS, Globals, LineCol, Mark, SourceMap, Spanned};
use swc_ecma_ast::{EsVersion, Pass, Program};
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::{Config as CodegenConfig, Emitter};
use swc_ecma_parser::{Syntax, parse_file_as_program};
use swc_ecma_transforms_base::fixer::fixer;
use swc_ecma_transforms_base::helpers::{HELPERS, Helpers, inject_helpers};
use swc_ecma_transforms_base::hygiene::hygiene;
use swc_ecma_transforms_base::resolver;
use swc_ecma_transforms_compat::{es2015, es2016, es2017, es2018, es2019, es2020, es2021, es2022};

use crate::config::ScriptTarget;
use crate::pipeline::asset::{Asset, SourceMapping};
use crate::pipeline::source::slash_path;
use crate::pipeline::stage::{map_each, ready, Stage, StageContext, StageError, StageFuture, StageResult};
use crate::types::BuildEnv;

/// Parses JavaScript with swc, lowers it to `target` and prints it back.
///
/// Syntax errors fail the task. With `minify`, whitespace and comments are
/// dropped from the output; otherwise comments survive. The printed code
/// carries position mappings for the `sourcemap` stage.
#[derive(Debug)]
pub struct ScriptStage {
    minify: bool,
    target: ScriptTarget,
}

/// Printed code plus its VLQ mappings back to the parsed text.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub code: String,
    pub mappings: String,
}

impl ScriptStage {
    pub fn new(minify: Option<bool>, target: ScriptTarget, env: BuildEnv) -> Self {
        Self {
            minify: minify.unwrap_or(env.is_production()),
            target,
        }
    }

    fn process(&self, mut asset: Asset) -> StageResult<Asset> {
        let file = asset.display_path();
        let input = asset.text()?.to_owned();
        let out = transform_script(&slash_path(&file), &input, self.target, self.minify)
            .map_err(|message| StageError::for_file(file, message))?;

        let source = match asset.origins.as_slice() {
            [only] if only.contents.as_deref() == Some(input.as_str()) => only.path.clone(),
            _ => PathBuf::from(&asset.path),
        };
        let mapping = SourceMapping {
            source,
            content: input,
            mappings: out.mappings,
        };
        asset.set_mapped_text(out.code, mapping);
        Ok(asset)
    }
}

impl ScriptTarget {
    fn es_version(self) -> EsVersion {
        match self {
            ScriptTarget::Es5 => EsVersion::Es5,
            ScriptTarget::Es2015 => EsVersion::Es2015,
            ScriptTarget::Es2016 => EsVersion::Es2016,
            ScriptTarget::Es2017 => EsVersion::Es2017,
            ScriptTarget::Es2018 => EsVersion::Es2018,
            ScriptTarget::Es2019 => EsVersion::Es2019,
            ScriptTarget::Es2020 => EsVersion::Es2020,
            ScriptTarget::Es2021 => EsVersion::Es2021,
            ScriptTarget::Es2022 => EsVersion::Es2022,
        }
    }
}

/// Compat passes for every edition newer than `target`, newest first.
fn downlevel(target: ScriptTarget, unresolved_mark: Mark, comments: SingleThreadedComments) -> impl Pass {
    let below = |edition: ScriptTarget| target < edition;
    (
        below(ScriptTarget::Es2022).then(|| es2022(Default::default(), unresolved_mark)),
        below(ScriptTarget::Es2021).then(es2021),
        below(ScriptTarget::Es2020).then(|| es2020(Default::default(), unresolved_mark)),
        below(ScriptTarget::Es2019).then(es2019),
        below(ScriptTarget::Es2018).then(|| es2018(Default::default())),
        below(ScriptTarget::Es2017).then(|| es2017(Default::default(), unresolved_mark)),
        below(ScriptTarget::Es2016).then(es2016),
        below(ScriptTarget::Es2015)
            .then(|| es2015(unresolved_mark, Some(comments), Default::default())),
    )
}

struct MapConfig;

impl SourceMapGenConfig for MapConfig {
    fn file_name_to_source(&self, f: &FileName) -> String {
        f.to_string()
    }

    fn inline_sources_content(&self, _: &FileName) -> bool {
        false
    }
}

/// Parse `code` as an ES2022 script or module, lower it to `target` and
/// re-emit it.
///
/// Errors carry the line number and the parser's own message.
pub fn transform_script(
    name: &str,
    code: &str,
    target: ScriptTarget,
    minify: bool,
) -> Result<ScriptOutput, String> {
    let cm: Lrc<SourceMap> = Lrc::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Custom(name.to_owned())), code.to_owned());
    let comments = SingleThreadedComments::default();

    let mut recovered = Vec::new();
    let program = parse_file_as_program(
        &fm,
        Syntax::Es(Default::default()),
        EsVersion::Es2022,
        Some(&comments as &dyn Comments),
        &mut recovered,
    );

    let describe = |err: &swc_ecma_parser::error::Error| {
        let line = cm.lookup_char_pos(err.span().lo).line;
        format!("line {line}: {}", err.kind().msg())
    };

    let program = program.map_err(|err| describe(&err))?;
    if let Some(err) = recovered.first() {
        return Err(describe(err));
    }

    let program = GLOBALS.set(&Globals::default(), || lower(program, target, &comments));

    let mut buf = Vec::new();
    let mut positions: Vec<(BytePos, LineCol)> = Vec::new();
    {
        let writer = JsWriter::new(Lrc::clone(&cm), "\n", &mut buf, Some(&mut positions));
        let mut emitter = Emitter {
            cfg: CodegenConfig::default()
                .with_minify(minify)
                .with_target(target.es_version()),
            cm: Lrc::clone(&cm),
            comments: if minify { None } else { Some(&comments as &dyn Comments) },
            wr: writer,
        };
        emitter
            .emit_program(&program)
            .map_err(|e| format!("failed to print script: {e}"))?;
    }

    let code = String::from_utf8(buf).map_err(|e| format!("printed script is not UTF-8: {e}"))?;
    let mappings = encode_mappings(&cm, &positions)?;
    Ok(ScriptOutput { code, mappings })
}

fn lower(program: Program, target: ScriptTarget, comments: &SingleThreadedComments) -> Program {
    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();

    HELPERS.set(&Helpers::new(false), || {
        program
            .apply(resolver(unresolved_mark, top_level_mark, false))
            .apply(downlevel(target, unresolved_mark, comments.clone()))
            .apply(inject_helpers(unresolved_mark))
            .apply(hygiene())
            .apply(fixer(Some(comments as &dyn Comments)))
    })
}

/// Extract the VLQ `mappings` field from the map swc builds for `positions`.
fn encode_mappings(cm: &Lrc<SourceMap>, positions: &[(BytePos, LineCol)]) -> Result<String, String> {
    let map = cm.build_source_map(positions, None, MapConfig);
    let mut json = Vec::new();
    map.to_writer(&mut json)
        .map_err(|e| format!("cannot encode source map: {e}"))?;

    let value: serde_json::Value =
        serde_json::from_slice(&json).map_err(|e| format!("cannot read source map: {e}"))?;
    Ok(value["mappings"].as_str().unwrap_or_default().to_owned())
}

impl Stage for ScriptStage {
    fn name(&self) -> &'static str {
        "script"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, _ctx: &'a StageContext) -> StageFuture<'a> {
        ready(map_each(assets, |asset| self.process(asset)))
    }
}
