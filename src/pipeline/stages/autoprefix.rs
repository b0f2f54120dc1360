// src/pipeline/stages/autoprefix.rs

use regex::{Captures, Regex};

use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{map_each, ready, Stage, StageContext, StageFuture, StageResult};

/// Properties that still need vendor-prefixed copies in current browsers.
const PREFIXED: &[(&str, &[&str])] = &[
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("text-size-adjust", &["-webkit-", "-moz-", "-ms-"]),
    ("hyphens", &["-webkit-", "-ms-"]),
    ("mask-image", &["-webkit-"]),
    ("clip-path", &["-webkit-"]),
    ("box-decoration-break", &["-webkit-"]),
];

/// Inserts vendor-prefixed declarations before their standard form.
///
/// Works on plain CSS text, so it belongs after `sass`. Declarations that
/// are already written with a prefix are not touched.
#[derive(Debug)]
pub struct AutoprefixStage {
    declaration: Regex,
    sticky: Regex,
}

impl AutoprefixStage {
    pub fn new() -> Result<Self, regex::Error> {
        let props = PREFIXED
            .iter()
            .map(|(prop, _)| regex::escape(prop))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            declaration: Regex::new(&format!(
                r"(?P<lead>[{{;]\s*)(?P<prop>{props})(?P<sep>\s*:\s*)(?P<val>[^;{{}}]*)"
            ))?,
            sticky: Regex::new(r"(?P<lead>[{;]\s*)(?P<decl>position\s*:\s*)sticky")?,
        })
    }

    /// Add prefixed copies of known declarations to a stylesheet.
    pub fn prefix_css(&self, css: &str) -> String {
        let css = self.declaration.replace_all(css, |caps: &Captures<'_>| {
            let lead = &caps["lead"];
            let prop = &caps["prop"];
            let sep = &caps["sep"];
            let val = &caps["val"];
            // whitespace after `{`/`;` also separates the inserted copies
            let indent = &lead[1..];

            let prefixes = PREFIXED
                .iter()
                .find(|(p, _)| *p == prop)
                .map(|(_, prefixes)| *prefixes)
                .unwrap_or(&[]);

            let mut out = String::from(lead);
            for prefix in prefixes {
                out.push_str(&format!("{prefix}{prop}{sep}{val};{indent}"));
            }
            out.push_str(&format!("{prop}{sep}{val}"));
            out
        });

        self.sticky
            .replace_all(&css, |caps: &Captures<'_>| {
                let lead = &caps["lead"];
                let decl = &caps["decl"];
                let indent = &lead[1..];
                format!("{lead}{decl}-webkit-sticky;{indent}{decl}sticky")
            })
            .into_owned()
    }

    fn prefix(&self, mut asset: Asset) -> StageResult<Asset> {
        let prefixed = self.prefix_css(asset.text()?);
        asset.set_text(prefixed);
        Ok(asset)
    }
}

impl Stage for AutoprefixStage {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, _ctx: &'a StageContext) -> StageFuture<'a> {
        ready(map_each(assets, |asset| self.prefix(asset)))
    }
}
