//! Cross-referenced HTML output.
//!
//! A pure consumer of the finished analyzer: the [`styler`] walks each
//! module tree adding lexical styles, the [`linker`] turns bindings and
//! references into anchors and hyperlinks, and [`html`] merges the style
//! runs into escaped source pages.

pub mod html;
pub mod linker;
pub mod style;
pub mod styler;

use std::fs;
use std::io;
use std::path::Path;

use sift_analysis::Analyzer;
use tracing::info;

use crate::linker::Linker;
use crate::styler::Styler;

/// Generate one HTML page per analyzed file under `out_dir`, mirroring the
/// layout below `root`. Returns the number of pages written.
pub fn generate(az: &Analyzer, root: &Path, out_dir: &Path) -> io::Result<usize> {
    fs::create_dir_all(out_dir)?;
    // The analyzer stores canonical paths; match them.
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let root = root.as_path();
    let mut linker = Linker::new(root);
    linker.find_links(az);

    let mut pages = 0;
    for file in az.loaded_files() {
        let path = Path::new(&file.path);
        if !path.exists() {
            // Synthesized modules (the builtins table) have no source.
            continue;
        }
        let source = fs::read_to_string(path)?;
        let mut styles = Styler::new().add_styles(&file.ast, &source);
        styles.extend_from_slice(linker.styles_for(&file.path));

        let rel = path.strip_prefix(root).unwrap_or(path);
        let title = rel.to_string_lossy();
        let page = html::render_page(&title, &source, styles);

        let out_path = out_dir.join(format!("{}.html", rel.to_string_lossy()));
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, page)?;
        pages += 1;
    }
    info!(pages, out = %out_dir.display(), "wrote cross-referenced html");
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_analysis::AnalyzerOptions;

    #[test]
    fn generates_a_page_per_module() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("util.py"), "helper = 1\n").unwrap();
        fs::write(
            dir.path().join("main.py"),
            "import util\nz = util.helper\n",
        )
        .unwrap();

        let mut az = Analyzer::new(AnalyzerOptions::default());
        az.analyze(dir.path()).unwrap();
        az.finish();

        let out = dir.path().join("html");
        let pages = generate(&az, dir.path(), &out).unwrap();
        assert_eq!(pages, 2);

        let main_page = fs::read_to_string(out.join("main.py.html")).unwrap();
        // The use of `helper` links to the sibling page's anchor.
        assert!(main_page.contains("util.py.html#util.helper"), "{main_page}");
        let util_page = fs::read_to_string(out.join("util.py.html")).unwrap();
        assert!(util_page.contains("id=\"util.helper\""), "{util_page}");
    }
}
