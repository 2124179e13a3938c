use std::path::Path;

use crate::config::Database;

/// Fetch every survey CSV into `tmp_path`.
pub fn download(database: &Database, tmp_path: &Path) -> Result<(), String> {
    std::fs::create_dir_all(tmp_path)
        .map_err(|e| format!("Failed to create {}: {}", tmp_path.display(), e))?;

    let client = reqwest::blocking::Client::new();
    for (file, url) in database.sources() {
        tracing::info!(%url, file, "downloading");
        let body = client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|e| format!("Failed to fetch {url}: {e}"))?;
        let target = tmp_path.join(file);
        std::fs::write(&target, &body)
            .map_err(|e| format!("Failed to write {}: {}", target.display(), e))?;
    }
    Ok(())
}
