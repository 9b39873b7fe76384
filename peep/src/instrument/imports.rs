//! Import resolution
//!
//! Makes sure a file imports every package the injected code refers to.
//! Matching is by exact import path; an existing alias still counts, with a
//! warning when it hides the package name the injected code uses.

use log::{debug, warn};

use crate::syntax::ast::{ImportDecl, ImportLayout, ImportSpec, SourceFile};

/// Add `path` to the imports of `file` unless it is already there.
///
/// The new import goes into the first parenthesized import group. Within
/// that group's first blank-line separated run of specs, it lands at its
/// sorted position when the run is sorted and at the end of the run
/// otherwise. A file with only single-line imports has its first one widened
/// into a group; a file without imports gets a new declaration after the
/// package clause.
///
/// Returns whether the file changed.
pub fn ensure_import(file: &mut SourceFile, path: &str) -> bool {
    if file.import_paths().any(|p| p == path) {
        if let Some(alias) = conflicting_alias(file, path) {
            warn!(
                "{} imports {path:?} as {alias}; injected code refers to it as {}",
                file.path.display(),
                package_name(path)
            );
        }
        return false;
    }

    let target = file
        .imports
        .iter()
        .position(|decl| matches!(decl.layout, ImportLayout::Group { .. }))
        .or(if file.imports.is_empty() { None } else { Some(0) });

    match target {
        Some(index) => insert_spec(&mut file.imports[index], &file.src, path),
        None => file.imports.push(ImportDecl {
            specs: vec![ImportSpec::new(path)],
            layout: ImportLayout::Synthesized,
        }),
    }
    debug!("Added import {path:?} to {}", file.path.display());
    true
}

/// The alias `path` is imported under, when it differs from the package name.
pub fn conflicting_alias<'a>(file: &'a SourceFile, path: &str) -> Option<&'a str> {
    file.imports
        .iter()
        .flat_map(|decl| &decl.specs)
        .filter(|spec| spec.path == path)
        .find_map(|spec| spec.name.as_deref())
        .filter(|name| *name != package_name(path))
}

/// Last path element, the name Go code uses for an unaliased import.
fn package_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn insert_spec(decl: &mut ImportDecl, src: &str, path: &str) {
    let run_end = first_run_end(&decl.specs, src);
    let run = &decl.specs[..run_end];
    let sorted = run.windows(2).all(|pair| pair[0].path <= pair[1].path);
    let at = if sorted {
        run.partition_point(|spec| spec.path.as_str() < path)
    } else {
        run_end
    };
    decl.specs.insert(at, ImportSpec::new(path));
}

/// Index of the first spec preceded by a blank line, or the spec count.
fn first_run_end(specs: &[ImportSpec], src: &str) -> usize {
    specs
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, spec)| {
            spec.origin.is_some_and(|origin| {
                let gap = &src[origin.chunk.start..origin.text.start];
                let lines: Vec<&str> = gap.split('\n').collect();
                lines.len() > 2 && lines[1..lines.len() - 1].iter().any(|l| l.trim().is_empty())
            })
        })
        .map_or(specs.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse_source, print};

    fn ensure_all(src: &str, paths: &[&str]) -> String {
        let mut file = parse_source("main.go", src).unwrap();
        for path in paths {
            ensure_import(&mut file, path);
        }
        let out = print(&file);
        // Whatever we print must parse again.
        parse_source("main.go", out.as_str()).unwrap();
        out
    }

    #[test]
    fn test_idempotent() {
        let mut file =
            parse_source("main.go", "package main\n\nimport \"fmt\"\n\nfunc main() {}\n").unwrap();
        assert!(ensure_import(&mut file, "os"));
        let once: Vec<String> = file.import_paths().map(String::from).collect();
        assert!(!ensure_import(&mut file, "os"));
        assert!(!ensure_import(&mut file, "fmt"));
        let twice: Vec<String> = file.import_paths().map(String::from).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sorted_group_keeps_order() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n\t\"strings\" // text\n)\n\nfunc main() {}\n";
        let out = ensure_all(src, &["os", "log", "runtime/pprof"]);
        assert!(out.contains(
            "import (\n\t\"fmt\"\n\t\"log\"\n\t\"os\"\n\t\"runtime/pprof\"\n\t\"strings\" // text\n)"
        ));
    }

    #[test]
    fn test_unsorted_group_appends() {
        let src = "package main\n\nimport (\n\t\"strings\"\n\t\"fmt\"\n)\n\nfunc main() {}\n";
        let out = ensure_all(src, &["os"]);
        assert!(out.contains("import (\n\t\"strings\"\n\t\"fmt\"\n\t\"os\"\n)"));
    }

    #[test]
    fn test_single_import_becomes_group() {
        let src = "package main\n\nimport f \"fmt\"\n\nfunc main() { f.Println() }\n";
        let out = ensure_all(src, &["os"]);
        assert!(out.contains("import (\n\tf \"fmt\"\n\t\"os\"\n)"));
    }

    #[test]
    fn test_std_run_before_third_party_block() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n\t\"time\"\n\n\
                   \t\"github.com/acme/lib\"\n)\n\nfunc main() {}\n";
        let out = ensure_all(src, &["os", "log", "runtime/pprof"]);
        assert!(
            out.contains(
                "import (\n\t\"fmt\"\n\t\"log\"\n\t\"os\"\n\t\"runtime/pprof\"\n\t\"time\"\n\n\
                 \t\"github.com/acme/lib\"\n)"
            ),
            "{out}"
        );
    }

    #[test]
    fn test_comment_line_does_not_split_run() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n\t// timing\n\t\"time\"\n)\n\nfunc main() {}\n";
        let out = ensure_all(src, &["os"]);
        assert!(out.contains("\t\"fmt\"\n\t\"os\"\n\t// timing\n\t\"time\"\n)"), "{out}");
    }

    #[test]
    fn test_unsorted_first_run_appends_before_blank_line() {
        let src = "package main\n\nimport (\n\t\"time\"\n\t\"fmt\"\n\n\t\"github.com/acme/lib\"\n)\n\n\
                   func main() {}\n";
        let out = ensure_all(src, &["os"]);
        assert!(out.contains("\t\"fmt\"\n\t\"os\"\n\n\t\"github.com/acme/lib\""), "{out}");
    }

    #[test]
    fn test_file_without_imports() {
        let src = "package main\n\nfunc main() {}\n";
        assert_eq!(
            ensure_all(src, &["os"]),
            "package main\n\nimport \"os\"\n\nfunc main() {}\n"
        );
        assert_eq!(
            ensure_all(src, &["os", "log"]),
            "package main\n\nimport (\n\t\"log\"\n\t\"os\"\n)\n\nfunc main() {}\n"
        );
    }

    #[test]
    fn test_existing_alias_counts_as_present() {
        let src = "package main\n\nimport _ \"os\"\n\nfunc main() {}\n";
        let mut file = parse_source("main.go", src).unwrap();
        assert!(!ensure_import(&mut file, "os"));
        assert_eq!(print(&file), src);
        assert_eq!(conflicting_alias(&file, "os"), Some("_"));
    }

    #[test]
    fn test_conflicting_alias() {
        let src = "package main\n\nimport (\n\tpprof \"runtime/pprof\"\n\tgo_log \"log\"\n\t\"os\"\n)\n\n\
                   func main() {}\n";
        let file = parse_source("main.go", src).unwrap();
        assert_eq!(conflicting_alias(&file, "runtime/pprof"), None);
        assert_eq!(conflicting_alias(&file, "log"), Some("go_log"));
        assert_eq!(conflicting_alias(&file, "os"), None);
        assert_eq!(conflicting_alias(&file, "time"), None);
    }
}
