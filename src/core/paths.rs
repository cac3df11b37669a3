use std::path::PathBuf;

/// Filesystem layout of a noteport data directory.
///
/// Everything the app persists lives under one root: the SQLite database,
/// attachment files, exported snapshots, and the protected secrets directory
/// holding the master key.
pub struct AppPaths {
    pub root: PathBuf,
    pub db_file: PathBuf,
    pub attachments: PathBuf,
    pub snapshots: PathBuf,
    pub secrets: PathBuf,
}

impl AppPaths {
    /// Resolve the default data root: `$NOTEPORT_HOME`, else `$HOME/.noteport`.
    pub fn new() -> Self {
        let root = std::env::var_os("NOTEPORT_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".noteport")
            });
        Self::from_root(root)
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            db_file: root.join("app.db"),
            attachments: root.join("attachments"),
            snapshots: root.join("snapshots"),
            secrets: root.join("secrets"),
            root,
        }
    }

    /// Create the directory layout if missing. The secrets directory is
    /// restricted to the owner on unix.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.attachments)?;
        std::fs::create_dir_all(&self.snapshots)?;
        std::fs::create_dir_all(&self.secrets)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&self.secrets, perms)?;
        }

        Ok(())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
