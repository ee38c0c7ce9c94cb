use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Snapshot tree for one run:
///
/// ```text
/// <root>/<run_id>/hostels/hostels.json
/// <root>/<run_id>/hostels/<slug>/<slug>.json
/// <root>/<run_id>/hostels/<slug>/session.json
/// <root>/<run_id>/hostels/<slug>/room_details.json
/// <root>/<run_id>/hostels/<slug>/availability/<room_id>.json
/// ```
#[derive(Debug, Clone)]
pub struct RawStore {
    run_id: String,
    hostels_dir: PathBuf,
}

impl RawStore {
    pub fn new(root: impl AsRef<Path>, run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        let hostels_dir = root.as_ref().join(&run_id).join("hostels");
        Self {
            run_id,
            hostels_dir,
        }
    }

    /// Store named after the current local time
    pub fn for_current_run(root: impl AsRef<Path>) -> Self {
        Self::new(root, Local::now().format(RUN_ID_FORMAT).to_string())
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.hostels_dir.join("hostels.json")
    }

    pub fn detail_path(&self, slug: &str) -> PathBuf {
        self.hostels_dir.join(slug).join(format!("{}.json", slug))
    }

    pub fn session_path(&self, slug: &str) -> PathBuf {
        self.hostels_dir.join(slug).join("session.json")
    }

    pub fn rooms_path(&self, slug: &str) -> PathBuf {
        self.hostels_dir.join(slug).join("room_details.json")
    }

    pub fn availability_path(&self, slug: &str, room_id: &str) -> PathBuf {
        self.hostels_dir
            .join(slug)
            .join("availability")
            .join(format!("{}.json", room_id))
    }

    /// Pretty-print `body` to `path`, creating parent directories
    pub async fn write(&self, path: &Path, body: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(body)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Stored raw response");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_follow_run_layout() {
        let store = RawStore::new("raw", "2024-05-01_10-00-00");

        assert_eq!(
            store.catalog_path(),
            PathBuf::from("raw/2024-05-01_10-00-00/hostels/hostels.json")
        );
        assert_eq!(
            store.detail_path("goa"),
            PathBuf::from("raw/2024-05-01_10-00-00/hostels/goa/goa.json")
        );
        assert_eq!(
            store.session_path("goa"),
            PathBuf::from("raw/2024-05-01_10-00-00/hostels/goa/session.json")
        );
        assert_eq!(
            store.rooms_path("goa"),
            PathBuf::from("raw/2024-05-01_10-00-00/hostels/goa/room_details.json")
        );
        assert_eq!(
            store.availability_path("goa", "r-1"),
            PathBuf::from("raw/2024-05-01_10-00-00/hostels/goa/availability/r-1.json")
        );
    }

    #[test]
    fn run_id_is_a_timestamp() {
        let store = RawStore::for_current_run("raw");
        assert_eq!(store.run_id().len(), "2024-05-01_10-00-00".len());
        assert!(chrono::NaiveDateTime::parse_from_str(store.run_id(), RUN_ID_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn writes_pretty_json_creating_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawStore::new(dir.path(), "run");
        let path = store.availability_path("goa", "r-1");

        store.write(&path, &json!({"data": {"x": 1}})).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), json!({"data": {"x": 1}}));
    }
}
