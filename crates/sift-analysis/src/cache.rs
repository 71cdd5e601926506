//! AST cache: in-memory memoization with an optional on-disk layer.
//!
//! The memory map lives for the process and caches failures too -- a null
//! sentinel hit returns immediately without re-parsing. The disk layer is
//! keyed by the SHA-1 of the source bytes, so files with identical content
//! share one serialized tree; a deserialized tree is re-stamped with the
//! requesting path before use.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use sift_common::sha1_hex;
use sift_parser::{parse_module, ModuleAst, ParseError};
use tracing::{debug, warn};

pub struct AstCache {
    memory: FxHashMap<String, Option<Rc<ModuleAst>>>,
    cache_dir: Option<PathBuf>,
}

impl AstCache {
    /// A cache with an optional disk directory, created on first use.
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        AstCache {
            memory: FxHashMap::default(),
            cache_dir,
        }
    }

    /// The syntax tree for `path`.
    ///
    /// `Err(Some(error))` reports the first failure for a path (unreadable
    /// file or hard parse error); later requests for the same path answer
    /// from the null sentinel as `Err(None)`.
    pub fn get(&mut self, path: &str) -> Result<Rc<ModuleAst>, Option<ParseError>> {
        if let Some(hit) = self.memory.get(path) {
            return hit.clone().ok_or(None);
        }

        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(err) => {
                warn!(path, %err, "failed to read source");
                self.memory.insert(path.to_string(), None);
                return Err(Some(ParseError::new(
                    format!("failed to read file: {err}"),
                    sift_common::Span::new(0, 0),
                )));
            }
        };
        let sha = sha1_hex(source.as_bytes());

        if let Some(ast) = self.load_from_disk(path, &sha) {
            debug!(path, "reusing serialized tree");
            let rc = Rc::new(ast);
            self.memory.insert(path.to_string(), Some(rc.clone()));
            return Ok(rc);
        }

        debug!(path, "parsing");
        match parse_module(&source) {
            Ok(mut ast) => {
                ast.set_file(path, &sha);
                let rc = Rc::new(ast);
                self.memory.insert(path.to_string(), Some(rc.clone()));
                self.store_to_disk(&rc);
                Ok(rc)
            }
            Err(err) => {
                self.memory.insert(path.to_string(), None);
                Err(Some(err))
            }
        }
    }

    /// Serialized tree name: `<basename><sha1>.ast`. The basename is only
    /// there to ease debugging; the digest is the key.
    fn disk_path(&self, source_path: &str, sha: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let base = Path::new(source_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(dir.join(format!("{base}{sha}.ast")))
    }

    fn load_from_disk(&self, source_path: &str, sha: &str) -> Option<ModuleAst> {
        let cache_path = self.disk_path(source_path, sha)?;
        let bytes = fs::read(&cache_path).ok()?;
        match serde_json::from_slice::<ModuleAst>(&bytes) {
            Ok(mut ast) => {
                // Files in different directories may share contents.
                ast.set_file(source_path, sha);
                Some(ast)
            }
            Err(err) => {
                debug!(path = %cache_path.display(), %err, "stale cache entry ignored");
                None
            }
        }
    }

    fn store_to_disk(&self, ast: &ModuleAst) {
        let Some(cache_path) = self.disk_path(ast.file(), ast.sha1()) else {
            return;
        };
        if let Some(dir) = self.cache_dir.as_ref() {
            if let Err(err) = fs::create_dir_all(dir) {
                warn!(dir = %dir.display(), %err, "cannot create cache dir");
                return;
            }
        }
        match serde_json::to_vec(ast) {
            Ok(bytes) => {
                if let Err(err) = fs::write(&cache_path, bytes) {
                    warn!(path = %cache_path.display(), %err, "failed to serialize");
                }
            }
            Err(err) => warn!(%err, "failed to serialize"),
        }
    }

    /// Drop the in-memory map, keeping the disk layer.
    pub fn clear(&mut self) {
        self.memory.clear();
    }

    /// Remove every serialized tree from the disk layer.
    pub fn clear_disk_cache(&mut self) -> bool {
        match self.cache_dir.as_ref() {
            Some(dir) if dir.exists() => match fs::remove_dir_all(dir) {
                Ok(()) => true,
                Err(err) => {
                    warn!(dir = %dir.display(), %err, "failed to clear disk cache");
                    false
                }
            },
            _ => true,
        }
    }

    /// Shut down, clearing the disk cache. Callers that want the cache to
    /// persist across runs simply never call this.
    pub fn close(&mut self) {
        self.clear_disk_cache();
    }
}
