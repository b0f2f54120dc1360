//! On-disk site fixtures.

use std::fs;
use std::path::Path;

/// Write `files` (path relative to `root`, contents) below `root`.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
    }
}

/// A small site in the layout the built-in preset expects, under
/// `root/dev`.
pub fn write_preset_site(root: &Path) {
    write_files(
        root,
        &[
            (
                "dev/templates/index.page",
                "<html>\n  <body>\n    @@include(\"../partials/header.html\")\n    <main>{{ page }}</main>\n  </body>\n</html>\n",
            ),
            ("dev/partials/header.html", "<header>Site header</header>"),
            (
                "dev/styles/main.scss",
                "@use 'vars';\n\n.button {\n  color: vars.$accent;\n  user-select: none;\n}\n\n.panel {\n  appearance: none;\n}\n",
            ),
            ("dev/styles/_vars.scss", "$accent: #ff6600;\n"),
            (
                "dev/scripts/app.js",
                "// application entry\nfunction greet(name) {\n  return 'hello ' + name;\n}\nconsole.log(greet('world'));\n",
            ),
            (
                "dev/scripts/libs.js",
                "@@include(\"vendor/tiny.js\")\n",
            ),
            (
                "dev/scripts/vendor/tiny.js",
                "var tiny = { version: 1 };\n",
            ),
            (
                "dev/icons/star.svg",
                "<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\"><path d=\"M12 2l3 7h7l-6 4 2 7-6-4-6 4 2-7-6-4h7z\"/></svg>\n",
            ),
            ("dev/images/logo.png", "not really a png"),
            ("dev/fonts/body.woff2", "font bytes"),
        ],
    );
}
