// src/pipeline/stages/svg_sprite.rs

//! Merge SVG icons into one `<symbol>` sprite.
//!
//! Each icon becomes `<symbol id="<file stem>" viewBox="...">`, so pages
//! reference it as `<use href="sprite.svg#<stem>"/>`. Ids inside an icon are
//! prefixed with the stem to keep them unique across the sprite.

use std::collections::BTreeSet;

use regex::{Captures, Regex};

use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{ready, Stage, StageContext, StageError, StageFuture, StageResult};

#[derive(Debug)]
pub struct SvgSpriteStage {
    output: String,
    remove_style: bool,
    patterns: Patterns,
}

#[derive(Debug)]
struct Patterns {
    prolog: Regex,
    comment: Regex,
    style: Regex,
    root: Regex,
    view_box: Regex,
    id_attr: Regex,
    url_ref: Regex,
    href_ref: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            prolog: Regex::new(r"(?s)<\?xml.*?\?>|<!DOCTYPE[^>]*>")?,
            comment: Regex::new(r"(?s)<!--.*?-->")?,
            style: Regex::new(r"(?s)<style[^>]*>.*?</style>")?,
            root: Regex::new(r"(?s)<svg\b(?P<attrs>[^>]*)>(?P<body>.*)</svg>")?,
            view_box: Regex::new(r#"viewBox\s*=\s*["']([^"']*)["']"#)?,
            id_attr: Regex::new(r#"\bid\s*=\s*(?P<q>["'])(?P<id>[^"']+)["']"#)?,
            url_ref: Regex::new(r"url\(\s*#(?P<id>[^)\s]+)\s*\)")?,
            href_ref: Regex::new(r#"(?P<attr>(?:xlink:)?href)\s*=\s*(?P<q>["'])#(?P<id>[^"']+)["']"#)?,
        })
    }
}

impl SvgSpriteStage {
    pub fn new(output: Option<String>, remove_style: Option<bool>) -> Result<Self, regex::Error> {
        Ok(Self {
            output: output.unwrap_or_else(|| "sprite.svg".to_string()),
            remove_style: remove_style.unwrap_or(true),
            patterns: Patterns::new()?,
        })
    }

    fn symbol(&self, asset: &Asset) -> StageResult<(String, String)> {
        let stem = asset
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StageError::for_file(asset.display_path(), "icon has no file name"))?
            .to_string();

        let p = &self.patterns;
        let svg = asset.text()?;
        let svg = p.prolog.replace_all(svg, "");
        let mut svg = p.comment.replace_all(&svg, "").into_owned();
        if self.remove_style {
            svg = p.style.replace_all(&svg, "").into_owned();
        }

        let caps = p.root.captures(&svg).ok_or_else(|| {
            StageError::for_file(asset.display_path(), "no <svg> root element found")
        })?;
        let view_box = p
            .view_box
            .captures(&caps["attrs"])
            .map(|c| c[1].to_string());
        let body = self.prefix_ids(&stem, caps["body"].trim());

        let mut symbol = format!("<symbol id=\"{stem}\"");
        if let Some(view_box) = view_box {
            symbol.push_str(&format!(" viewBox=\"{view_box}\""));
        }
        symbol.push('>');
        symbol.push_str(&body);
        symbol.push_str("</symbol>");

        Ok((stem, symbol))
    }

    fn prefix_ids(&self, stem: &str, body: &str) -> String {
        let p = &self.patterns;
        let ids: BTreeSet<String> = p
            .id_attr
            .captures_iter(body)
            .map(|c| c["id"].to_string())
            .collect();
        if ids.is_empty() {
            return body.to_string();
        }

        let body = p.id_attr.replace_all(body, |c: &Captures<'_>| {
            format!("id={q}{stem}-{id}{q}", q = &c["q"], id = &c["id"])
        });
        let body = p.url_ref.replace_all(&body, |c: &Captures<'_>| {
            let id = &c["id"];
            if ids.contains(id) {
                format!("url(#{stem}-{id})")
            } else {
                c[0].to_string()
            }
        });
        p.href_ref
            .replace_all(&body, |c: &Captures<'_>| {
                let id = &c["id"];
                if ids.contains(id) {
                    format!("{attr}={q}#{stem}-{id}{q}", attr = &c["attr"], q = &c["q"])
                } else {
                    c[0].to_string()
                }
            })
            .into_owned()
    }

    fn build(&self, assets: Vec<Asset>) -> StageResult<Vec<Asset>> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = BTreeSet::new();
        let mut symbols = Vec::with_capacity(assets.len());
        for asset in &assets {
            let (stem, symbol) = self.symbol(asset)?;
            if !seen.insert(stem.clone()) {
                return Err(StageError::for_file(
                    asset.display_path(),
                    format!("duplicate icon id '{stem}'"),
                ));
            }
            symbols.push(symbol);
        }

        let mut sprite = String::from(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">",
        );
        for symbol in symbols {
            sprite.push_str(&symbol);
        }
        sprite.push_str("</svg>\n");

        let mut merged = Asset::new(self.output.clone(), sprite);
        for asset in assets {
            for origin in asset.origins {
                merged.add_origin(origin);
            }
        }
        Ok(vec![merged])
    }
}

impl Stage for SvgSpriteStage {
    fn name(&self) -> &'static str {
        "svg_sprite"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, _ctx: &'a StageContext) -> StageFuture<'a> {
        ready(self.build(assets))
    }
}
