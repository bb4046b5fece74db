use serde::Serialize;
use std::path::Path;

/// Write `value` as pretty-printed JSON, replacing any previous file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    write_text(path, &content)
}

/// Write `content` unchanged, replacing any previous file.
pub fn write_text(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_json_creates_parent_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/out.json");

        write_json(&path, &json!({ "movies": [1] })).unwrap();
        write_json(&path, &json!({ "movies": [] })).unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({ "movies": [] }));
    }

    #[test]
    fn test_write_text_keeps_content_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.json");
        let body = "{\"shows\":[],\"movies\":[]}";

        write_text(&path, body).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
    }
}
