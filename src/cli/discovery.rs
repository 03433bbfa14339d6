//! Finds function files and derives their resource names.

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

pub const FUNCTION_EXTENSION: &str = "mcfunction";

/// Expands `paths` into function files. Directories are searched
/// recursively; explicitly named files are kept whatever their extension.
///
/// The returned list is sorted so builds are deterministic.
pub fn discover_function_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file() && is_function_file(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

pub fn is_function_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FUNCTION_EXTENSION)
}

/// `data/<namespace>/function(s)/<path>.mcfunction` becomes `<namespace>:<path>`.
pub fn resource_name(path: &Path) -> Option<String> {
    let stem = path.with_extension("");
    let parts: Vec<&str> = stem
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let data = parts.iter().rposition(|part| *part == "data")?;
    match &parts[data + 1..] {
        [namespace, folder, rest @ ..]
            if !rest.is_empty() && (*folder == "function" || *folder == "functions") =>
        {
            Some(format!("{}:{}", namespace, rest.join("/")))
        }
        _ => None,
    }
}
