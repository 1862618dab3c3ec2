use crate::domain::ports::FileResolver;
use crate::utils::error::{Result, TrackerError};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

pub const LOCAL_ORIGIN: &str = "local";

/// Maps job origins to base directories on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileResolver {
    roots: HashMap<String, PathBuf>,
}

impl LocalFileResolver {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        let mut roots = HashMap::new();
        roots.insert(LOCAL_ORIGIN.to_string(), uploads_dir.into());
        Self { roots }
    }

    pub fn with_origin(mut self, origin: &str, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(origin.to_string(), root.into());
        self
    }
}

impl FileResolver for LocalFileResolver {
    fn path_on_disk(&self, origin: &str, path: &str) -> Result<PathBuf> {
        let unresolvable = || TrackerError::UnresolvableFile {
            origin: origin.to_string(),
            path: path.to_string(),
        };

        let root = self.roots.get(origin).ok_or_else(unresolvable)?;

        // 只接受相對路徑，不允許跳出上傳目錄
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(unresolvable());
        }

        Ok(root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_local_origin() {
        let resolver = LocalFileResolver::new("/srv/uploads");
        assert_eq!(
            resolver.path_on_disk("local", "benchy.gcode").unwrap(),
            PathBuf::from("/srv/uploads/benchy.gcode")
        );
        assert_eq!(
            resolver.path_on_disk("local", "/parts/clip.gcode").unwrap(),
            PathBuf::from("/srv/uploads/parts/clip.gcode")
        );
    }

    #[test]
    fn test_unknown_origin_is_unresolvable() {
        let resolver = LocalFileResolver::new("/srv/uploads");
        let err = resolver.path_on_disk("sdcard", "benchy.gco").unwrap_err();
        assert!(matches!(err, TrackerError::UnresolvableFile { .. }));

        let resolver = resolver.with_origin("sdcard", "/mnt/sd");
        assert_eq!(
            resolver.path_on_disk("sdcard", "benchy.gco").unwrap(),
            PathBuf::from("/mnt/sd/benchy.gco")
        );
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let resolver = LocalFileResolver::new("/srv/uploads");
        assert!(resolver.path_on_disk("local", "../etc/passwd").is_err());
        assert!(resolver.path_on_disk("local", "a/../../b.gcode").is_err());
    }
}
