//! Entry point detection
//!
//! Only a free function named `main` counts. A method named `main` on some
//! type does not.

use std::path::{Path, PathBuf};

use log::debug;

use crate::domain::{PeepError, Result};
use crate::syntax::{inspect, parse_file, Decl, FuncDecl, Node, SourceFile};

/// Locates the entry point inside a [`SourceFile`] by declaration index.
///
/// An index rather than a borrow, so the reference stays valid while the
/// tree is mutated: instrumentation only prepends statements to the body and
/// never reorders declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPointRef {
    pub decl: usize,
}

impl EntryPointRef {
    pub fn get<'a>(&self, file: &'a SourceFile) -> Option<&'a FuncDecl> {
        match file.decls.get(self.decl)? {
            Decl::Func(func) if func.is_entry_point() => Some(func),
            _ => None,
        }
    }

    pub fn get_mut<'a>(&self, file: &'a mut SourceFile) -> Option<&'a mut FuncDecl> {
        match file.decls.get_mut(self.decl)? {
            Decl::Func(func) if func.is_entry_point() => Some(func),
            _ => None,
        }
    }
}

/// True iff `file` declares `func main()` without a receiver.
pub fn has_entry_point(file: &SourceFile) -> bool {
    let mut found = false;
    inspect(file, &mut |node| {
        if found {
            return false;
        }
        if let Node::Decl(Decl::Func(func)) = node {
            if func.is_entry_point() {
                found = true;
            }
        }
        // Declarations are all that matter here.
        false
    });
    found
}

pub fn find_entry_point(file: &SourceFile) -> Option<EntryPointRef> {
    file.decls
        .iter()
        .position(|decl| matches!(decl, Decl::Func(func) if func.is_entry_point()))
        .map(|decl| EntryPointRef { decl })
}

/// Pick the single file among `paths` that defines the entry point.
///
/// Files that fail to parse are skipped here; the chosen file is parsed again
/// for instrumentation.
///
/// # Errors
/// - [`PeepError::NoEntryFile`] when no file qualifies
/// - [`PeepError::AmbiguousEntry`] naming every file when more than one does
pub fn find_entry_file<P: AsRef<Path>>(paths: &[P]) -> Result<PathBuf> {
    let mut matches: Vec<PathBuf> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let file = match parse_file(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("Skipping {}: {e}", path.display());
                continue;
            }
        };
        if has_entry_point(&file) {
            matches.push(path.to_path_buf());
        }
    }

    match matches.len() {
        0 => Err(PeepError::NoEntryFile),
        1 => Ok(matches.remove(0)),
        _ => Err(PeepError::AmbiguousEntry(matches)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    #[test]
    fn test_detects_free_main() {
        let file = parse_source(
            "main.go",
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello, World!\")\n}\n",
        )
        .unwrap();
        assert!(has_entry_point(&file));
        assert_eq!(find_entry_point(&file), Some(EntryPointRef { decl: 0 }));
    }

    #[test]
    fn test_method_named_main_does_not_count() {
        let file = parse_source(
            "main.go",
            "package main\n\ntype T struct{}\n\nfunc (t T) main() {}\n\nfunc helper() {}\n",
        )
        .unwrap();
        assert!(!has_entry_point(&file));
        assert_eq!(find_entry_point(&file), None);
    }

    #[test]
    fn test_entry_point_after_other_decls() {
        let file = parse_source(
            "main.go",
            "package main\n\nvar x = 1\n\nfunc (T) main() {}\n\nfunc main() {}\n",
        )
        .unwrap();
        let entry = find_entry_point(&file).unwrap();
        assert_eq!(entry.decl, 2);
        assert_eq!(entry.get(&file).map(|f| f.name.as_str()), Some("main"));
    }

    #[test]
    fn test_find_entry_file_skips_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.go");
        let good = dir.path().join("good.go");
        std::fs::write(&broken, "package main\n\nfunc main() {\n").unwrap();
        std::fs::write(&good, "package main\n\nfunc main() {}\n").unwrap();

        assert_eq!(find_entry_file(&[broken, good.clone()]).unwrap(), good);
    }

    #[test]
    fn test_find_entry_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.go");
        let b = dir.path().join("b.go");
        let lib = dir.path().join("lib.go");
        std::fs::write(&a, "package main\n\nfunc main() {}\n").unwrap();
        std::fs::write(&b, "package main\n\nfunc main() {}\n").unwrap();
        std::fs::write(&lib, "package main\n\nfunc helper() {}\n").unwrap();

        assert!(matches!(find_entry_file(&[lib.clone()]), Err(PeepError::NoEntryFile)));
        match find_entry_file(&[a.clone(), lib, b.clone()]) {
            Err(PeepError::AmbiguousEntry(paths)) => assert_eq!(paths, vec![a, b]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
