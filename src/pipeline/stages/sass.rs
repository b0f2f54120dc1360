// src/pipeline/stages/sass.rs

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};

use grass::{Options, OutputStyle};

use crate::config::SassStyle;
use crate::fs::FileSystem;
use crate::pipeline::asset::{Asset, Origin};
use crate::pipeline::stage::{map_each, ready, Stage, StageContext, StageError, StageFuture, StageResult};
use crate::types::BuildEnv;

use super::include::normalize;

/// Compiles SCSS to CSS with `grass`.
///
/// `@use`/`@import` resolve relative to the file, then against each
/// configured load path (relative to the source root). Imported files are
/// read through the task's filesystem and recorded as origins.
#[derive(Debug)]
pub struct SassStage {
    style: SassStyle,
    load_paths: Vec<String>,
}

impl SassStage {
    pub fn new(style: Option<SassStyle>, load_paths: Vec<String>, env: BuildEnv) -> Self {
        let style = style.unwrap_or(if env.is_production() {
            SassStyle::Compressed
        } else {
            SassStyle::Expanded
        });
        Self { style, load_paths }
    }

    fn compile(&self, mut asset: Asset, ctx: &StageContext) -> StageResult<Asset> {
        let file = ctx.source_path(&asset);
        let mut paths: Vec<PathBuf> = Vec::with_capacity(self.load_paths.len() + 1);
        if let Some(dir) = file.parent() {
            paths.push(dir.to_path_buf());
        }
        paths.extend(self.load_paths.iter().map(|p| ctx.source_root.join(p)));

        let output_style = match self.style {
            SassStyle::Expanded => OutputStyle::Expanded,
            SassStyle::Compressed => OutputStyle::Compressed,
        };
        let imports = ImportTracker::new(ctx.fs.as_ref());
        let css = {
            let options = Options::default()
                .style(output_style)
                .load_paths(&paths)
                .fs(&imports);
            grass::from_string(asset.text()?.to_owned(), &options)
                .map_err(|e| StageError::for_file(asset.display_path(), e.to_string()))?
        };

        for path in imports.into_read() {
            let rel = normalize(&path);
            let rel = rel.strip_prefix(&ctx.source_root).unwrap_or(&rel).to_path_buf();
            let contents = ctx.fs.read_to_string(&path).ok();
            asset.add_origin(Origin::new(rel, contents));
        }

        asset.set_text(css);
        asset.set_extension("css");
        Ok(asset)
    }
}

/// `grass::Fs` over the task filesystem that remembers every file read.
#[derive(Debug)]
struct ImportTracker<'a> {
    fs: &'a dyn FileSystem,
    read: RefCell<Vec<PathBuf>>,
}

impl<'a> ImportTracker<'a> {
    fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            read: RefCell::new(Vec::new()),
        }
    }

    fn into_read(self) -> Vec<PathBuf> {
        self.read.into_inner()
    }
}

impl grass::Fs for ImportTracker<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.fs.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let bytes = self
            .fs
            .read(path)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("{e:#}")))?;
        self.read.borrow_mut().push(path.to_path_buf());
        Ok(bytes)
    }
}

impl Stage for SassStage {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, ctx: &'a StageContext) -> StageFuture<'a> {
        ready(map_each(assets, |asset| self.compile(asset, ctx)))
    }
}
