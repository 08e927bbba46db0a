//! Output file handling for delivered results.
//!
//! One candidate per line, each followed by `\n`, no header or footer. Files
//! live in the configured temp dir under a per-job unique name and are removed
//! as soon as the handle is dropped.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{extract::Candidate, Result};

static OUTPUT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Render candidates in the delivered file format.
pub fn render(candidates: &[Candidate]) -> String {
    let mut out = String::with_capacity(candidates.len() * 11);
    for c in candidates {
        out.push_str(c.as_str());
        out.push('\n');
    }
    out
}

/// A written output file. Removed from disk on drop.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    file_name: String,
}

impl OutputFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the recipient should see (e.g. `found_data.txt`).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to remove output file: {e}");
            }
        }
    }
}

/// Write `candidates` into `dir` under a unique on-disk name.
pub async fn write_output_file(
    dir: &Path,
    file_name: &str,
    candidates: &[Candidate],
) -> Result<OutputFile> {
    tokio::fs::create_dir_all(dir).await?;

    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let n = OUTPUT_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = dir.join(format!("{}-{ts}-{n}-{file_name}", std::process::id()));

    tokio::fs::write(&path, render(candidates)).await?;

    Ok(OutputFile {
        path,
        file_name: file_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_candidates;

    fn tmp_dir(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{prefix}-{}", std::process::id()))
    }

    #[test]
    fn renders_one_candidate_per_line_with_trailing_newline() {
        let cands = extract_candidates("9876543210 8123456789 9876543210");
        assert_eq!(render(&cands), "9876543210\n8123456789\n9876543210\n");
        assert_eq!(render(&[]), "");
    }

    #[tokio::test]
    async fn writes_unique_files_and_removes_them_on_drop() {
        let dir = tmp_dir("numscrape-output");
        let cands = extract_candidates("7012345678 6123456789");

        let a = write_output_file(&dir, "found_data.txt", &cands).await.unwrap();
        let b = write_output_file(&dir, "found_data.txt", &cands).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.file_name(), "found_data.txt");
        assert_eq!(
            std::fs::read_to_string(a.path()).unwrap(),
            "7012345678\n6123456789\n"
        );

        let (pa, pb) = (a.path().to_path_buf(), b.path().to_path_buf());
        drop(a);
        drop(b);
        assert!(!pa.exists());
        assert!(!pb.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
