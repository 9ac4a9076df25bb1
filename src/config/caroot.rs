use std::env;
use std::path::PathBuf;

/// Resolves the directory holding the CA certificate and key.
///
/// `$CAROOT` wins when set. Otherwise the platform data directory is used:
/// `%LocalAppData%` on Windows, `~/Library/Application Support` on macOS,
/// and `$XDG_DATA_HOME` (falling back to `~/.local/share`) elsewhere,
/// always with an `mkcert` subdirectory.
pub fn resolve_caroot() -> Option<PathBuf> {
    resolve_caroot_for(env::consts::OS, &|key| {
        env::var(key).ok().filter(|v| !v.is_empty())
    })
}

fn resolve_caroot_for(os: &str, get: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(root) = get("CAROOT") {
        return Some(PathBuf::from(root));
    }

    let dir = match os {
        "windows" => PathBuf::from(get("LocalAppData")?),
        "macos" => PathBuf::from(get("HOME")?)
            .join("Library")
            .join("Application Support"),
        _ => match get("XDG_DATA_HOME") {
            Some(data_home) => PathBuf::from(data_home),
            None => PathBuf::from(get("HOME")?).join(".local").join("share"),
        },
    };
    Some(dir.join("mkcert"))
}
