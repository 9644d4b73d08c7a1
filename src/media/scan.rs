use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::config::LibrarySettings;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .and_then(|p| p.to_str())
        .map(str::to_string)
}

/// Audio files under `root`, as sorted paths relative to it.
pub(crate) fn audio_files(root: &Path, settings: &LibrarySettings) -> Vec<String> {
    let ignored_folder = |entry: &DirEntry| {
        entry.file_type().is_dir()
            && relative(root, entry.path())
                .map(|rel| settings.ignored_folders.iter().any(|f| f.trim_matches('/') == rel))
                .unwrap_or(false)
    };

    let mut files: Vec<String> = WalkDir::new(root)
        .follow_links(settings.follow_links)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || ((settings.include_hidden || !is_hidden(e)) && !ignored_folder(e))
        })
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            !settings.ignored_files.iter().any(|f| f.as_str() == name)
        })
        .filter(|e| is_audio_file(e.path(), settings))
        .filter_map(|e| relative(root, e.path()))
        .collect();

    files.sort();
    files
}
