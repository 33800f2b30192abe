// Output — cache snapshots, the rendering payload, and terminal summaries.
//
// Nothing here is written until a pass over the corpus has finished, and
// every file goes through a temp-file rename so an interrupted run never
// leaves half an artifact behind.

pub mod render;
pub mod snapshot;
pub mod terminal;

use std::path::Path;

use anyhow::{Context, Result};

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so long skip reasons quoting
/// non-ASCII document names never panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Write a file in one step: write a sibling temp file, then rename over
/// the destination.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, contents)
        .with_context(|| format!("writing {}", Path::new(&tmp).display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("replacing {}", path.display()));
    }
    Ok(())
}
