use std::ffi::OsString;
use std::io;
use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::app::config::{ConfigCache, MERGED_CONFIG_KEY};
use crate::domain::AppError;

/// Invalidate the merged app config whenever the plugin config `file` changes.
///
/// The parent directory is watched so the file may be created later. Dropping
/// the returned watcher stops watching.
pub fn watch_plugin_config(
    file: &Path,
    cache: ConfigCache,
) -> Result<RecommendedWatcher, AppError> {
    let file_name = file.file_name().map(OsString::from).ok_or_else(|| {
        AppError::user_input(format!("{} is not a config file", file.display()))
    })?;
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let handler = move |result: notify::Result<Event>| match result {
        Ok(event) if is_relevant(&event, &file_name) => {
            info!("plugin config changed, reloading app.config.json");
            cache.invalidate(MERGED_CONFIG_KEY);
        }
        Ok(_) => {}
        Err(err) => warn!("config watcher error: {}", err),
    };
    let mut watcher = notify::recommended_watcher(handler).map_err(notify_error)?;
    watcher.watch(&dir, RecursiveMode::NonRecursive).map_err(notify_error)?;
    Ok(watcher)
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
        && event.paths.iter().any(|path| path.file_name() == Some(file_name.as_os_str()))
}

fn notify_error(err: notify::Error) -> AppError {
    AppError::Io(io::Error::other(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, ModifyKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn only_changes_to_the_watched_file_count() {
        let name = OsString::from("config.json");
        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/p/config.json"), &name));
        assert!(!is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/p/other.json"), &name));
        assert!(!is_relevant(&event(EventKind::Access(AccessKind::Any), "/p/config.json"), &name));
    }

    #[test]
    fn watching_a_missing_directory_fails() {
        let file = Path::new("/definitely/missing/config.json");
        let err = watch_plugin_config(file, ConfigCache::new()).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
