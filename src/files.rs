//! Path discovery: turn the CLI path argument into an ordered image list.

use std::path::Path;

use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Collect the viewable collection for a path argument.
///
/// A file argument yields that file alone (if it is an image); a directory
/// yields its direct children, no recursion. Paths come back canonical and
/// alphabetically sorted.
pub fn collect_image_paths(arg: &Path, reverse: bool) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();

    if arg.is_file() {
        if is_image(arg) {
            if let Ok(abs) = arg.canonicalize() {
                paths.push(abs.to_string_lossy().to_string());
            }
        }
    } else if arg.is_dir() {
        for entry in WalkDir::new(arg)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() || !is_image(entry.path()) {
                continue;
            }
            let abs = match entry.path().canonicalize() {
                Ok(p) => p,
                Err(_) => continue,
            };
            paths.push(abs.to_string_lossy().to_string());
        }
    }

    paths.sort();
    if reverse {
        paths.reverse();
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    // ── extension filtering ─────────────────────────────────────────────

    #[test]
    fn image_extensions_accepted() {
        for name in [
            "a.jpg", "a.JPEG", "a.png", "a.GIF", "a.bmp", "a.tiff", "a.tif", "a.webp",
        ] {
            assert!(is_image(Path::new(name)), "{} should be an image", name);
        }
    }

    #[test]
    fn non_image_extensions_rejected() {
        for name in ["a.txt", "a.mp4", "a.rs", "noext", ".hidden", "a."] {
            assert!(!is_image(Path::new(name)), "{} should not match", name);
        }
    }

    // ── directory listing ───────────────────────────────────────────────

    #[test]
    fn directory_yields_sorted_images_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.png");
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "c.webp");

        let paths = collect_image_paths(dir.path(), false);
        let names: Vec<&str> = paths
            .iter()
            .map(|p| p.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.webp"]);
    }

    #[test]
    fn reverse_flips_the_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.jpg");

        let paths = collect_image_paths(dir.path(), true);
        let names: Vec<&str> = paths
            .iter()
            .map(|p| p.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn subdirectories_are_not_descended() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "top.png");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "deep.png");

        let paths = collect_image_paths(dir.path(), false);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("top.png"));
    }

    // ── single-file argument ────────────────────────────────────────────

    #[test]
    fn file_argument_yields_itself() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "only.jpg");

        let paths = collect_image_paths(&dir.path().join("only.jpg"), false);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("only.jpg"));
    }

    #[test]
    fn non_image_file_argument_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");
        assert!(collect_image_paths(&dir.path().join("readme.md"), false).is_empty());
    }

    #[test]
    fn missing_path_yields_nothing() {
        assert!(collect_image_paths(Path::new("/no/such/place"), false).is_empty());
    }
}
