use std::path::Path;

use crate::UploadError;

// Glob-style matcher over a single file name: '*', '?', '[set]' and '[!set]'
// (ranges like 'a-z' allowed inside a set). Case-sensitive.
pub fn wildcard_match(pat: &str, text: &str) -> bool {
    let p: Vec<char> = pat.chars().collect();
    let t: Vec<char> = text.chars().collect();

    // Returns (matched, pattern length consumed) for a '[...]' class at p[0].
    // An unterminated class is treated as a literal '['.
    fn class(p: &[char], c: char) -> Option<(bool, usize)> {
        let mut i = 1;
        // only '!' negates; '^' is an ordinary member
        let negate = p.get(i) == Some(&'!');
        if negate {
            i += 1;
        }
        let mut hit = false;
        let mut first = true;
        while i < p.len() {
            if p[i] == ']' && !first {
                return Some((hit != negate, i + 1));
            }
            if i + 2 < p.len() && p[i + 1] == '-' && p[i + 2] != ']' {
                if p[i] <= c && c <= p[i + 2] {
                    hit = true;
                }
                i += 3;
            } else {
                if p[i] == c {
                    hit = true;
                }
                i += 1;
            }
            first = false;
        }
        None
    }

    fn helper(p: &[char], t: &[char]) -> bool {
        if p.is_empty() {
            return t.is_empty();
        }
        match p[0] {
            '*' => {
                // Try to match '*' with any number of chars
                if helper(&p[1..], t) {
                    return true;
                }
                !t.is_empty() && helper(p, &t[1..])
            }
            '?' => !t.is_empty() && helper(&p[1..], &t[1..]),
            '[' if !t.is_empty() => match class(p, t[0]) {
                Some((true, used)) => helper(&p[used..], &t[1..]),
                Some((false, _)) => false,
                None => t[0] == '[' && helper(&p[1..], &t[1..]),
            },
            c => !t.is_empty() && c == t[0] && helper(&p[1..], &t[1..]),
        }
    }
    helper(&p, &t)
}

/// Final path component as used for ledger entries and remote names.
///
/// Names that are not valid UTF-8 are rejected rather than converted, since a
/// lossy conversion could make two distinct files share one ledger entry.
pub fn base_name(path: &Path) -> Result<String, UploadError> {
    let name = path.file_name().ok_or_else(|| UploadError::local_io(path, "path has no file name"))?;
    name.to_str()
        .map(str::to_string)
        .ok_or_else(|| UploadError::local_io(path, "file name is not valid UTF-8"))
}

/// Join a remote directory and a file name with forward slashes.
pub fn remote_path(remote_dir: &str, name: &str) -> String {
    let dir = normalize_path(remote_dir, false);
    if dir.is_empty() || dir == "." {
        name.to_string()
    } else if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

// Lightweight path display wrapper that renders with forward slashes.
// Avoids allocating strings until actually formatted for logs.
pub(crate) struct DisplayPath<'a>(pub(crate) &'a Path);

impl std::fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.0.to_string_lossy();
        f.write_str(&normalize_path(&s, true))
    }
}

pub(crate) fn display_path(p: &Path) -> DisplayPath<'_> {
    DisplayPath(p)
}

/// Normalize a path-like string:
/// - converts backslashes to forward slashes
/// - collapses repeated slashes
/// - optionally preserves a trailing slash
pub fn normalize_path(p: &str, preserve_trailing_slash: bool) -> String {
    if p.is_empty() {
        return String::new();
    }
    let mut s = p.replace('\\', "/");
    while s.contains("//") {
        s = s.replace("//", "/");
    }
    if !preserve_trailing_slash {
        // Strip trailing slashes, but keep root "/"
        while s.len() > 1 && s.ends_with('/') {
            s.pop();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_mask() {
        assert!(wildcard_match("L*.BIN", "L1.BIN"));
        assert!(wildcard_match("L*.BIN", "L.BIN"));
        assert!(wildcard_match("L*.BIN", "L20240101.BIN"));
        assert!(!wildcard_match("L*.BIN", "notes.txt"));
        assert!(!wildcard_match("L*.BIN", "l1.bin"));
        assert!(!wildcard_match("L*.BIN", "XL1.BIN"));
    }

    #[test]
    fn question_mark_and_sets() {
        assert!(wildcard_match("data-??.bin", "data-01.bin"));
        assert!(!wildcard_match("data-??.bin", "data-1.bin"));
        assert!(wildcard_match("L[0-9].BIN", "L7.BIN"));
        assert!(!wildcard_match("L[0-9].BIN", "LA.BIN"));
        assert!(wildcard_match("L[!0-9].BIN", "LA.BIN"));
        assert!(wildcard_match("[]]x", "]x"));
        // '^' is a literal member, not a negation marker
        assert!(wildcard_match("L[^0-9].BIN", "L^.BIN"));
        assert!(wildcard_match("L[^0-9].BIN", "L5.BIN"));
        assert!(!wildcard_match("L[^0-9].BIN", "LA.BIN"));
        // unterminated class matches a literal '['
        assert!(wildcard_match("a[b", "a[b"));
    }

    #[test]
    fn base_name_of_nested_file() {
        assert_eq!(base_name(Path::new("/home/rsync/log/2024/L1.BIN")).unwrap(), "L1.BIN");
        assert!(base_name(Path::new("/")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn base_name_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/home/rsync/log").join(OsStr::from_bytes(b"L\xff.BIN"));
        let err = base_name(&path).unwrap_err();
        assert!(matches!(err, UploadError::LocalIo(_, _)));
    }

    #[test]
    fn remote_path_joins() {
        assert_eq!(remote_path(".", "L1.BIN"), "L1.BIN");
        assert_eq!(remote_path("", "L1.BIN"), "L1.BIN");
        assert_eq!(remote_path("/", "L1.BIN"), "/L1.BIN");
        assert_eq!(remote_path("/in//billing/", "L1.BIN"), "/in/billing/L1.BIN");
        assert_eq!(remote_path("upload\\box", "L1.BIN"), "upload/box/L1.BIN");
    }

    #[test]
    fn normalize_collapses_and_strips() {
        assert_eq!(normalize_path("//a///b//c", false), "/a/b/c");
        assert_eq!(normalize_path("/a/b/", true), "/a/b/");
        assert_eq!(normalize_path("/", false), "/");
    }

    #[test]
    fn display_path_uses_normalize() {
        let p = Path::new("C:\\some\\path\\");
        assert_eq!(format!("{}", display_path(p)), "C:/some/path/");
    }
}
