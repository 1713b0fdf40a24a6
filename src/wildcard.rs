//! `*` / `?` matching and directory-based expansion of argument words.

use std::io;
use std::path::Path;

/// Source of directory entries for glob expansion.
pub trait DirLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// Lists directories through the real filesystem.
pub struct FsLister;

impl DirLister for FsLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            // Names that are not valid UTF-8 cannot be matched against a &str pattern
            if let Ok(name) = entry?.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }
}

pub fn has_wildcards(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Glob match with a single backtrack point: the most recent `*`.
pub fn match_pattern(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut s) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while s < text.len() {
        match pattern.get(p) {
            Some(&c) if c == '?' || c == text[s] => {
                p += 1;
                s += 1;
            }
            Some('*') => {
                star = Some((p, s));
                p += 1;
            }
            _ => match star {
                // Let the last star swallow one more character
                Some((star_p, star_s)) => {
                    p = star_p + 1;
                    s = star_s + 1;
                    star = Some((star_p, star_s + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

pub fn expand_glob(pattern: &str) -> Vec<String> {
    expand_glob_with(pattern, &FsLister)
}

/// Expands the last path component of `pattern`.
///
/// Results are sorted; when the directory cannot be read or nothing
/// matches, the pattern itself is returned unchanged.
pub fn expand_glob_with(pattern: &str, lister: &dyn DirLister) -> Vec<String> {
    let (dir, file_pattern) = match pattern.rfind('/') {
        Some(idx) => (&pattern[..=idx], &pattern[idx + 1..]),
        None => (".", pattern),
    };

    let entries = match lister.list(Path::new(dir)) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("glob: cannot list {}: {}", dir, e);
            return vec![pattern.to_string()];
        }
    };

    let show_hidden = file_pattern.starts_with('.');
    let mut results: Vec<String> = entries
        .into_iter()
        .filter(|name| name != "." && name != "..")
        .filter(|name| show_hidden || !name.starts_with('.'))
        .filter(|name| match_pattern(file_pattern, name))
        .map(|name| if dir == "." { name } else { format!("{}{}", dir, name) })
        .collect();

    if results.is_empty() {
        return vec![pattern.to_string()];
    }
    results.sort();
    results
}
