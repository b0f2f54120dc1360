// tests/stages.rs

use std::path::PathBuf;
use std::sync::Arc;

use sitepipe::config::ScriptTarget;
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::fs::FileSystem;
use sitepipe::pipeline::stages::html_minify::minify_html;
use sitepipe::pipeline::stages::script::transform_script;
use sitepipe::pipeline::stages::{
    AutoprefixStage, CommandStage, ConcatStage, HtmlMinifyStage, IncludeStage, SassStage,
    ScriptStage, SourcemapStage, SvgSpriteStage, TemplateStage,
};
use sitepipe::pipeline::{Asset, Stage, StageContext};
use sitepipe::types::BuildEnv;

fn context(fs: MockFileSystem, env: BuildEnv, base: &str) -> StageContext {
    let fs: Arc<dyn FileSystem> = Arc::new(fs);
    StageContext {
        task: "test".to_string(),
        env,
        fs,
        source_root: PathBuf::from("/dev"),
        base_dir: PathBuf::from("/dev").join(base),
    }
}

fn text(asset: &Asset) -> &str {
    std::str::from_utf8(&asset.contents).unwrap()
}

fn source_asset(out: &str, source: &str, contents: &str) -> Asset {
    Asset::from_source(out, source, contents.as_bytes().to_vec())
}

// ---------------------------------------------------------------- include

#[tokio::test]
async fn test_include_expands_nested_files_and_records_origins() {
    let fs = MockFileSystem::new();
    fs.add_file("/dev/partials/header.html", "<header>@@include('nav.html')</header>");
    fs.add_file("/dev/partials/nav.html", "<nav>menu</nav>");
    let ctx = context(fs, BuildEnv::Development, "templates");

    let stage = IncludeStage::new("@@").unwrap();
    let page = source_asset(
        "index.page",
        "templates/index.page",
        "<body>@@include(\"../partials/header.html\")</body>",
    );

    let out = stage.apply(vec![page], &ctx).await.unwrap();
    assert_eq!(text(&out[0]), "<body><header><nav>menu</nav></header></body>");

    let origins: Vec<PathBuf> = out[0].origins.iter().map(|o| o.path.clone()).collect();
    assert_eq!(origins[0], PathBuf::from("templates/index.page"));
    assert!(origins.contains(&PathBuf::from("partials/header.html")));
    assert!(origins.contains(&PathBuf::from("partials/nav.html")));
}

#[tokio::test]
async fn test_include_cycle_is_an_error() {
    let fs = MockFileSystem::new();
    fs.add_file("/dev/templates/a.html", "@@include('b.html')");
    fs.add_file("/dev/templates/b.html", "@@include('a.html')");
    let ctx = context(fs, BuildEnv::Development, "templates");

    let stage = IncludeStage::new("@@").unwrap();
    let page = source_asset("a.html", "templates/a.html", "@@include('b.html')");

    let err = stage.apply(vec![page], &ctx).await.unwrap_err();
    assert!(err.message.contains("include cycle"), "{}", err.message);
}

#[tokio::test]
async fn test_include_of_missing_file_names_the_including_file() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "templates");
    let stage = IncludeStage::new("@@").unwrap();
    let page = source_asset("index.page", "templates/index.page", "@@include('nope.html')");

    let err = stage.apply(vec![page], &ctx).await.unwrap_err();
    assert_eq!(err.file, Some(PathBuf::from("templates/index.page")));
    assert!(err.message.contains("nope.html"));
}

// --------------------------------------------------------------- template

#[tokio::test]
async fn test_template_renders_context_and_renames_extension() {
    let fs = MockFileSystem::new();
    fs.add_file("/dev/templates/layout.html", "<title>{% block title %}{% endblock %}</title>");
    let ctx = context(fs, BuildEnv::Production, "templates");

    let stage = TemplateStage::new(None, None, BuildEnv::Production);
    let page = source_asset(
        "about.page",
        "templates/about.page",
        "{% extends \"layout.html\" %}{% block title %}{{ page }} ({{ env }}){% endblock %}",
    );

    let out = stage.apply(vec![page], &ctx).await.unwrap();
    assert_eq!(out[0].path, PathBuf::from("about.html"));
    assert_eq!(text(&out[0]), "<title>about.html (production)</title>");
}

#[tokio::test]
async fn test_template_undefined_variable_fails_in_strict_mode() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "templates");
    let stage = TemplateStage::new(None, None, BuildEnv::Development);
    let page = source_asset("index.page", "templates/index.page", "{{ missing.value }}");

    let err = stage.apply(vec![page], &ctx).await.unwrap_err();
    assert_eq!(err.file, Some(PathBuf::from("templates/index.page")));
}

// ------------------------------------------------------------------- sass

#[tokio::test]
async fn test_sass_style_follows_environment() {
    let scss = "$c: red;\n.a {\n  .b { color: $c; }\n}\n";

    let dev = SassStage::new(None, vec![], BuildEnv::Development);
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "styles");
    let out = dev
        .apply(vec![source_asset("main.scss", "styles/main.scss", scss)], &ctx)
        .await
        .unwrap();
    assert_eq!(out[0].path, PathBuf::from("main.css"));
    assert!(text(&out[0]).contains(".a .b {\n  color: red;\n}"));

    let prod = SassStage::new(None, vec![], BuildEnv::Production);
    let out = prod
        .apply(vec![source_asset("main.scss", "styles/main.scss", scss)], &ctx)
        .await
        .unwrap();
    assert!(text(&out[0]).starts_with(".a .b{color:red}"));
}

#[tokio::test]
async fn test_sass_records_imported_partials_as_origins() {
    let fs = MockFileSystem::new();
    fs.add_file("/dev/styles/_vars.scss", "$accent: #ff6600;\n");
    fs.add_file("/dev/shared/_mixins.scss", "@mixin flat { border: 0; }\n");
    let ctx = context(fs, BuildEnv::Development, "styles");

    let scss = "@use 'vars';\n@import 'mixins';\n.a { color: vars.$accent; @include flat; }\n";
    let stage = SassStage::new(None, vec!["shared".to_string()], BuildEnv::Development);
    let out = stage
        .apply(vec![source_asset("main.scss", "styles/main.scss", scss)], &ctx)
        .await
        .unwrap();

    assert!(text(&out[0]).contains("color: #ff6600;"));
    assert!(text(&out[0]).contains("border: 0;"));

    let origins: Vec<PathBuf> = out[0].origins.iter().map(|o| o.path.clone()).collect();
    assert_eq!(
        origins,
        [
            PathBuf::from("styles/main.scss"),
            PathBuf::from("styles/_vars.scss"),
            PathBuf::from("shared/_mixins.scss"),
        ]
    );
    assert_eq!(out[0].origins[1].contents.as_deref(), Some("$accent: #ff6600;\n"));
}

#[tokio::test]
async fn test_sass_syntax_error_reports_file() {
    let stage = SassStage::new(None, vec![], BuildEnv::Development);
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "styles");

    let err = stage
        .apply(vec![source_asset("bad.scss", "styles/bad.scss", ".a { color: ")], &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.file, Some(PathBuf::from("styles/bad.scss")));
    assert!(!err.message.is_empty());
}

// ------------------------------------------------------------- autoprefix

#[test]
fn test_autoprefix_adds_vendor_copies_before_standard_declaration() {
    let stage = AutoprefixStage::new().unwrap();
    let css = stage.prefix_css(".a {\n  user-select: none;\n  color: red;\n}\n");

    assert_eq!(
        css,
        ".a {\n  -webkit-user-select: none;\n  -moz-user-select: none;\n  -ms-user-select: none;\n  user-select: none;\n  color: red;\n}\n"
    );
}

#[test]
fn test_autoprefix_handles_compressed_css_and_sticky() {
    let stage = AutoprefixStage::new().unwrap();
    let css = stage.prefix_css(".a{appearance:none}.b{position:sticky}");

    assert_eq!(
        css,
        ".a{-webkit-appearance:none;-moz-appearance:none;appearance:none}.b{position:-webkit-sticky;position:sticky}"
    );
}

#[test]
fn test_autoprefix_leaves_unrelated_properties_alone() {
    let stage = AutoprefixStage::new().unwrap();
    let css = ".a{color:red;margin:0}";
    assert_eq!(stage.prefix_css(css), css);
}

// ----------------------------------------------------------------- script

#[test]
fn test_script_syntax_error_reports_line() {
    let err = transform_script("app.js", "let a = 1;\nlet = ;\n", ScriptTarget::Es2022, false).unwrap_err();
    assert!(err.starts_with("line 2:"), "{err}");
}

#[test]
fn test_script_minify_is_smaller_and_drops_comments() {
    let code = "// greeting helper\nfunction greet(name) {\n    return 'hi ' + name;\n}\ngreet('x');\n";

    let pretty = transform_script("app.js", code, ScriptTarget::Es2022, false).unwrap().code;
    let minified = transform_script("app.js", code, ScriptTarget::Es2022, true).unwrap().code;

    assert!(pretty.contains("greeting helper"));
    assert!(!minified.contains("greeting helper"));
    assert!(minified.len() < pretty.len());
}

#[tokio::test]
async fn test_script_stage_minifies_by_default_in_production() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Production, "scripts");
    let stage = ScriptStage::new(None, ScriptTarget::Es5, BuildEnv::Production);
    let src = "var  answer   =   42;\n\n\n";

    let out = stage
        .apply(vec![source_asset("app.js", "scripts/app.js", src)], &ctx)
        .await
        .unwrap();
    assert!(text(&out[0]).len() < src.len());
    assert!(text(&out[0]).contains("42"));
}

#[test]
fn test_script_lowers_spread_and_arrows_for_es5() {
    let code = "const pick = (a) => ({ ...a, ok: true });\nconst { x, ...rest } = pick({ x: 1, y: 2 });\n";

    let es5 = transform_script("app.js", code, ScriptTarget::Es5, false).unwrap().code;
    assert!(!es5.contains("=>"), "{es5}");
    assert!(!es5.contains("..."), "{es5}");
    assert!(!es5.contains("const "), "{es5}");

    let modern = transform_script("app.js", code, ScriptTarget::Es2022, false).unwrap().code;
    assert!(modern.contains("=>"));
    assert!(modern.contains("...rest"));
}

#[test]
fn test_script_es2017_target_keeps_arrows_but_lowers_object_spread() {
    let code = "const f = (a) => ({ ...a });\n";
    let out = transform_script("app.js", code, ScriptTarget::Es2017, false).unwrap().code;
    assert!(out.contains("=>"), "{out}");
    assert!(!out.contains("..."), "{out}");
}

#[test]
fn test_script_output_carries_position_mappings() {
    let out = transform_script("app.js", "let a = 1;\nfunction f() {\n  return a;\n}\n", ScriptTarget::Es2022, false)
        .unwrap();
    assert!(!out.mappings.is_empty());
    // second generated line starts a new group
    assert!(out.mappings.contains(';'), "{}", out.mappings);
}

#[tokio::test]
async fn test_script_stage_maps_back_to_the_source_file() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "scripts");
    let src = "const add = (a, b) => a + b;\nadd(1, 2);\n";

    let scripts = ScriptStage::new(Some(false), ScriptTarget::Es5, BuildEnv::Development)
        .apply(vec![source_asset("app.js", "scripts/app.js", src)], &ctx)
        .await
        .unwrap();
    let mapping = scripts[0].mapping.clone().unwrap();
    assert_eq!(mapping.source, PathBuf::from("scripts/app.js"));
    assert_eq!(mapping.content, src);

    let out = SourcemapStage::new().apply(scripts, &ctx).await.unwrap();
    let map: serde_json::Value = serde_json::from_slice(&out[1].contents).unwrap();
    assert_eq!(map["sources"][0], "scripts/app.js");
    assert_eq!(map["sourcesContent"][0], src);
    assert!(!map["mappings"].as_str().unwrap().is_empty());
    // the appended comment is not part of the mapped text
    assert!(out[0].mapping.is_none());
}

// ------------------------------------------------------------ html_minify

#[test]
fn test_html_minify_keeps_preformatted_blocks() {
    let html = "<html>\n    <body>\n\n        <p>hi</p>\n        <pre>\n  keep\n    this\n</pre>\n    </body>\n</html>\n";
    let out = minify_html(html);

    assert_eq!(
        out,
        "<html>\n<body>\n<p>hi</p>\n<pre>\n  keep\n    this\n</pre>\n</body>\n</html>\n"
    );
}

#[tokio::test]
async fn test_html_minify_stage_rewrites_each_asset() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Production, "");
    let stage = HtmlMinifyStage::new();
    let out = stage
        .apply(vec![Asset::new("a.html", "  <p>x</p>\n\n")], &ctx)
        .await
        .unwrap();
    assert_eq!(text(&out[0]), "<p>x</p>\n");
}

// ------------------------------------------------------------- svg_sprite

#[tokio::test]
async fn test_svg_sprite_merges_icons_into_symbols() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "icons");
    let stage = SvgSpriteStage::new(None, None).unwrap();

    let star = source_asset(
        "star.svg",
        "icons/star.svg",
        "<?xml version=\"1.0\"?>\n<!-- star -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\"><style>.x{fill:red}</style><defs><linearGradient id=\"g\"/></defs><path fill=\"url(#g)\" d=\"M0 0\"/></svg>",
    );
    let home = source_asset(
        "nav/home.svg",
        "icons/nav/home.svg",
        "<svg viewBox=\"0 0 16 16\"><use href=\"#other\"/></svg>",
    );

    let out = stage.apply(vec![star, home], &ctx).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].path, PathBuf::from("sprite.svg"));
    assert_eq!(out[0].origins.len(), 2);

    let sprite = text(&out[0]);
    assert!(sprite.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(sprite.contains("<symbol id=\"star\" viewBox=\"0 0 24 24\">"));
    assert!(sprite.contains("<symbol id=\"home\" viewBox=\"0 0 16 16\">"));
    assert!(sprite.contains("id=\"star-g\""));
    assert!(sprite.contains("url(#star-g)"));
    // references to ids the icon does not define stay untouched
    assert!(sprite.contains("href=\"#other\""));
    assert!(!sprite.contains("<style"));
    assert!(!sprite.contains("<?xml"));
    assert!(!sprite.contains("<!--"));
}

#[tokio::test]
async fn test_svg_sprite_rejects_duplicate_ids_and_skips_empty_input() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "icons");
    let stage = SvgSpriteStage::new(Some("icons.svg".to_string()), None).unwrap();

    assert!(stage.apply(vec![], &ctx).await.unwrap().is_empty());

    let a = source_asset("a/x.svg", "icons/a/x.svg", "<svg></svg>");
    let b = source_asset("b/x.svg", "icons/b/x.svg", "<svg></svg>");
    let err = stage.apply(vec![a, b], &ctx).await.unwrap_err();
    assert!(err.message.contains("duplicate icon id 'x'"));
}

// ----------------------------------------------------------------- concat

#[tokio::test]
async fn test_concat_joins_in_order_with_separator() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "");
    let stage = ConcatStage::new("bundle.js".to_string(), Some(";\n".to_string()));

    let out = stage
        .apply(
            vec![
                source_asset("a.js", "a.js", "a()"),
                source_asset("b.js", "b.js", "b()"),
            ],
            &ctx,
        )
        .await
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].path, PathBuf::from("bundle.js"));
    assert_eq!(text(&out[0]), "a();\nb()");
    assert_eq!(out[0].origins.len(), 2);
}

// -------------------------------------------------------------- sourcemap

#[tokio::test]
async fn test_sourcemap_writes_external_map_for_css_and_js_only() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "");
    let stage = SourcemapStage::new();

    let mut css = source_asset("main.scss", "styles/main.scss", ".a{b:c}");
    css.path = PathBuf::from("main.css");
    let font = Asset::new("font.woff2", vec![0u8, 1, 2]);

    let out = stage.apply(vec![css, font], &ctx).await.unwrap();
    assert_eq!(out.len(), 3);

    assert!(text(&out[0]).ends_with("/*# sourceMappingURL=main.css.map */\n"));
    assert_eq!(out[1].path, PathBuf::from("main.css.map"));
    assert_eq!(out[2].path, PathBuf::from("font.woff2"));

    let map: serde_json::Value = serde_json::from_slice(&out[1].contents).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "main.css");
    assert_eq!(map["sources"][0], "styles/main.scss");
    assert_eq!(map["sourcesContent"][0], ".a{b:c}");
}

#[tokio::test]
async fn test_sourcemap_uses_line_comment_for_js() {
    let ctx = context(MockFileSystem::new(), BuildEnv::Development, "");
    let out = SourcemapStage::new()
        .apply(vec![source_asset("app.js", "scripts/app.js", "a();")], &ctx)
        .await
        .unwrap();
    assert_eq!(text(&out[0]), "a();\n//# sourceMappingURL=app.js.map\n");
}

// ---------------------------------------------------------------- command

#[cfg(unix)]
#[tokio::test]
async fn test_command_pipes_contents_and_renames() {
    let dir = tempfile::tempdir().unwrap();
    let fs: Arc<dyn FileSystem> = Arc::new(sitepipe::fs::RealFileSystem);
    let ctx = StageContext {
        task: "test".to_string(),
        env: BuildEnv::Production,
        fs,
        source_root: dir.path().to_path_buf(),
        base_dir: dir.path().to_path_buf(),
    };

    let stage = CommandStage::new(
        "tr a-z A-Z; printf ' %s %s' \"$SITEPIPE_FILE\" \"$SITEPIPE_ENV\"".to_string(),
        Some("txt".to_string()),
    );
    let out = stage
        .apply(vec![source_asset("note.md", "docs/note.md", "hello")], &ctx)
        .await
        .unwrap();

    assert_eq!(out[0].path, PathBuf::from("note.txt"));
    assert_eq!(text(&out[0]), "HELLO docs/note.md production");
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_failure_surfaces_stderr_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let fs: Arc<dyn FileSystem> = Arc::new(sitepipe::fs::RealFileSystem);
    let ctx = StageContext {
        task: "test".to_string(),
        env: BuildEnv::Development,
        fs,
        source_root: dir.path().to_path_buf(),
        base_dir: dir.path().to_path_buf(),
    };

    let stage = CommandStage::new("echo 'optimizer exploded' >&2; exit 3".to_string(), None);
    let err = stage
        .apply(vec![source_asset("a.png", "images/a.png", "x")], &ctx)
        .await
        .unwrap_err();

    assert_eq!(err.message, "optimizer exploded\n");
    assert_eq!(err.file, Some(PathBuf::from("images/a.png")));
}
