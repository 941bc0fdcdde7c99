use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::parsing::env_optional;

/// Returns the persisted signing key, creating it on first start.
pub(super) fn load_or_create_secret_key() -> String {
    let path = env_optional("SECRET_KEY_FILE").map(PathBuf::from).unwrap_or_else(default_path);
    load_or_create_at(&path)
}

fn load_or_create_at(path: &Path) -> String {
    if let Some(existing) = read_key(path) {
        return existing;
    }

    let new_key = generate_secret_key();

    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(error = %err, path = %parent.display(), "Failed to create secret key directory");
        }
    }

    match write_new_key(path, &new_key) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Generated new secret key");
            new_key
        }
        // Another process won the race; use its key so tokens stay valid.
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            read_key(path).unwrap_or(new_key)
        }
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to persist secret key");
            new_key
        }
    }
}

fn read_key(path: &Path) -> Option<String> {
    let value = fs::read_to_string(path).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn write_new_key(path: &Path, key: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(key.as_bytes())
}

fn generate_secret_key() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn default_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".secret_key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_generated_once_and_reused() {
        let dir = std::env::temp_dir().join(format!("pluralskill-secret-{}", uuid::Uuid::new_v4()));
        let path = dir.join("key");

        let first = load_or_create_at(&path);
        let second = load_or_create_at(&path);

        assert_eq!(first, second);
        assert!(first.len() >= 80);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let _ = fs::remove_dir_all(dir);
    }
}
