//! Raw history dumps

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use super::MessageStore;

/// File name for a dump taken now: `conversation-<UTC timestamp>.json` with `:` replaced by `-`
pub fn history_file_name() -> String {
    let timestamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("conversation-{}.json", timestamp)
}

impl MessageStore {
    /// Pretty-printed JSON array of the transcript in wire shape
    pub fn export_json(&self, id: &str) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.get(id))
    }

    /// Write the transcript to a timestamped file under `dir`, creating `dir` if needed
    pub fn save_history(&self, id: &str, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let json = self.export_json(id).map_err(io::Error::other)?;
        let path = dir.join(history_file_name());
        fs::write(&path, json)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use tempfile::tempdir;

    #[test]
    fn test_history_file_name() {
        let name = history_file_name();
        assert!(name.starts_with("conversation-"));
        assert!(name.ends_with("Z.json"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn test_save_history_writes_wire_shape() {
        let store = MessageStore::new();
        store.ensure("c1", "sys");
        store.append("c1", Message::user("hello"));

        let dir = tempdir().unwrap();
        let path = store.save_history("c1", dir.path().join("logs")).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(
            saved,
            serde_json::json!([
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hello"}
            ])
        );
    }
}
