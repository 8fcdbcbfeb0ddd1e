//! Lexical rename kernel.
//!
//! Std-only: the replay generator embeds this file verbatim into the
//! programs it writes, so a replayed plan and the engine share one matching
//! rule. Nothing in here may reference the rest of the crate.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Result of applying one rename to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Content changed. `replacements` counts whole-word occurrences replaced.
    Rewritten { replacements: usize },
    /// File read, nothing to replace.
    Unchanged,
    /// Target is not an existing regular file.
    Missing,
    /// Target climbs out of the root and the run does not allow that.
    OutsideRoot,
    /// Target exists but could not be read as text or written back.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelOptions {
    /// Write changed content back. `false` computes the step only.
    pub write: bool,
    pub allow_outside_root: bool,
}

/// Strip one leading path separator, nothing more.
///
/// Remote suggestions often come back as `/src/utils.py`; the rest of the path
/// is left untouched (no `..` folding, no symlink resolution).
pub fn normalize_path(file_path: &str) -> &str {
    let mut chars = file_path.chars();
    match chars.next() {
        Some(c) if std::path::is_separator(c) => chars.as_str(),
        _ => file_path,
    }
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns true when `relative` is absolute or its `..` segments climb above
/// the directory it is joined to.
pub fn escapes_root(relative: &Path) -> bool {
    let mut depth: usize = 0;
    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return true,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
            Component::Normal(_) => depth += 1,
        }
    }
    false
}

/// Replace every whole-word occurrence of `old` with `new` in one left-to-right
/// pass and return the new content with the number of replacements.
///
/// `old` is a literal token. A candidate counts only when the characters on
/// both sides of it are not identifier characters (or are string boundaries),
/// so renaming `x` never touches `max`. An empty `old` never matches.
pub fn replace_whole_word(content: &str, old: &str, new: &str) -> (String, usize) {
    if old.is_empty() {
        return (content.to_string(), 0);
    }

    let mut output = String::with_capacity(content.len());
    let mut replacements = 0;
    let mut copied = 0;
    let mut search = 0;

    while let Some(offset) = content[search..].find(old) {
        let start = search + offset;
        let end = start + old.len();

        let left_clear = content[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_identifier_char(c));
        let right_clear = content[end..]
            .chars()
            .next()
            .is_none_or(|c| !is_identifier_char(c));

        if left_clear && right_clear {
            output.push_str(&content[copied..start]);
            output.push_str(new);
            copied = end;
            search = end;
            replacements += 1;
        } else {
            // Retry from the next character; an overlapping candidate may still qualify.
            let step = content[start..].chars().next().map_or(1, char::len_utf8);
            search = start + step;
        }
    }

    output.push_str(&content[copied..]);
    (output, replacements)
}

/// Replace `path`'s content in one step: write a hidden sibling, then rename it
/// over `path`, keeping its permissions.
///
/// A symlink is written through: the swap happens next to the file it points
/// to and the link itself is left in place.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let resolved;
    let path = if fs::symlink_metadata(path)?.file_type().is_symlink() {
        resolved = fs::canonicalize(path)?;
        resolved.as_path()
    } else {
        path
    };

    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target path has no file name")
    })?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".namefix-tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Err(err) = write_then_swap(&temp_path, path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}

fn write_then_swap(temp_path: &Path, path: &Path, content: &str) -> io::Result<()> {
    let permissions = fs::metadata(path)?.permissions();
    let mut file = fs::File::create(temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::set_permissions(temp_path, permissions)?;
    fs::rename(temp_path, path)
}

/// Resolve a directive path against `root`, or `None` when it is not allowed
/// to leave the root and does.
pub fn resolve(root: &Path, file_path: &str, allow_outside_root: bool) -> Option<PathBuf> {
    let relative = Path::new(normalize_path(file_path));
    if !allow_outside_root && escapes_root(relative) {
        return None;
    }
    Some(root.join(relative))
}

/// One read-modify-write cycle for a single directive.
///
/// The file is read fully and closed before anything is written, and it is
/// only written when the substitution actually changed its content.
pub fn rename_in_file(
    root: &Path,
    old_name: &str,
    new_name: &str,
    file_path: &str,
    options: KernelOptions,
) -> Step {
    let Some(path) = resolve(root, file_path, options.allow_outside_root) else {
        return Step::OutsideRoot;
    };
    if !path.is_file() {
        return Step::Missing;
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => return Step::Failed(format!("read failed: {}", err)),
    };

    let (updated, replacements) = replace_whole_word(&content, old_name, new_name);
    if updated == content {
        return Step::Unchanged;
    }

    if options.write {
        if let Err(err) = write_atomic(&path, &updated) {
            return Step::Failed(format!("write failed: {}", err));
        }
    }
    Step::Rewritten { replacements }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_one_leading_separator() {
        assert_eq!(normalize_path("/utils.py"), "utils.py");
        assert_eq!(normalize_path("utils.py"), "utils.py");
        assert_eq!(normalize_path("//etc/passwd"), "/etc/passwd");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_whole_word_leaves_longer_identifiers_alone() {
        let (out, count) = replace_whole_word("x + max(x, 1)", "x", "n");
        assert_eq!(out, "n + max(n, 1)");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_underscore_and_digits_are_identifier_chars() {
        let (out, count) = replace_whole_word("a _a a_ a1 1a (a)", "a", "b");
        assert_eq!(out, "b _a a_ a1 1a (b)");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_overlapping_candidates_are_retried() {
        // First candidate at 0 is glued to the next `a`; the last one is clear.
        let (out, count) = replace_whole_word("aaa aa", "aa", "z");
        assert_eq!(out, "aaa z");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let (out, count) = replace_whole_word("a.b a+b", "a.b", "ab");
        assert_eq!(out, "ab a+b");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replacement_is_inserted_literally() {
        let (out, _) = replace_whole_word("x = 1", "x", "$0\\1");
        assert_eq!(out, "$0\\1 = 1");
    }

    #[test]
    fn test_unicode_neighbours_block_match() {
        let (out, count) = replace_whole_word("éx x", "x", "y");
        assert_eq!(out, "éx y");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_empty_old_name_never_matches() {
        let (out, count) = replace_whole_word("abc", "", "z");
        assert_eq!(out, "abc");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_same_name_counts_but_content_identical() {
        let (out, count) = replace_whole_word("x = x", "x", "x");
        assert_eq!(out, "x = x");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_escapes_root() {
        assert!(!escapes_root(Path::new("src/utils.py")));
        assert!(!escapes_root(Path::new("src/../utils.py")));
        assert!(!escapes_root(Path::new("./utils.py")));
        assert!(escapes_root(Path::new("../utils.py")));
        assert!(escapes_root(Path::new("src/../../utils.py")));
        assert!(escapes_root(Path::new("/etc/passwd")));
    }

    #[test]
    fn test_resolve_respects_root_confinement() {
        let root = Path::new("/work");
        assert_eq!(
            resolve(root, "/src/a.py", false),
            Some(PathBuf::from("/work/src/a.py"))
        );
        assert_eq!(resolve(root, "../../etc/passwd", false), None);
        assert_eq!(resolve(root, "//etc/passwd", false), None);
        assert!(resolve(root, "../../etc/passwd", true).is_some());
    }
}
