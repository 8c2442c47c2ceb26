use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Context;
use quire_config::{ProjectConfig, CONFIG_FILE};
use quire_content::{
    reload_content_config_observer, ContentConfigState, ContentObservable, DeclaredConfigSource,
};
use quire_loader::FileWatcher;
use quire_store::{DataStore, InMemoryDataStore};
use quire_sync::{data_store_file, ensure_collection_manifest, ContentLayerOptions};
use tracing::warn;

use crate::cli::ProjectArgs;

/// Everything the commands share for one project.
pub struct Project {
    settings: RwLock<Arc<ProjectConfig>>,
    /// `--root`, used when there is no config file.
    default_root: PathBuf,
    pub config_path: PathBuf,
    pub store: InMemoryDataStore,
    pub observer: ContentObservable,
    pub watcher: FileWatcher,
    source: DeclaredConfigSource,
}

impl Project {
    /// Read settings and the previous data store.
    ///
    /// Without a config file the project runs on defaults rooted at `--root`.
    pub async fn open(args: &ProjectArgs) -> anyhow::Result<Self> {
        let config_path = canonical(
            &args
                .config
                .clone()
                .unwrap_or_else(|| args.root.join(CONFIG_FILE)),
        );
        let settings = read_settings(&config_path, &args.root)?;

        let store = InMemoryDataStore::from_file(&data_store_file(&settings, None))
            .await
            .context("failed to read the previous data store")?;

        Ok(Self {
            settings: RwLock::new(Arc::new(settings)),
            default_root: args.root.clone(),
            source: DeclaredConfigSource::new(&config_path),
            config_path,
            store,
            observer: ContentObservable::default(),
            watcher: FileWatcher::new(),
        })
    }

    pub fn settings(&self) -> Arc<ProjectConfig> {
        self.settings.read().expect("settings lock poisoned").clone()
    }

    /// Re-read project settings from the config file.
    ///
    /// Returns `true` if anything other than the declared collections
    /// changed. A layer built from the old settings must then be replaced.
    pub fn reload_settings(&self) -> anyhow::Result<bool> {
        let next = read_settings(&self.config_path, &self.default_root)?;
        let mut current = self.settings.write().expect("settings lock poisoned");
        let changed = !current.same_settings(&next);
        *current = Arc::new(next);
        Ok(changed)
    }

    pub fn layer_options(&self) -> ContentLayerOptions {
        ContentLayerOptions {
            settings: self.settings(),
            store: Arc::new(self.store.clone()),
            observer: self.observer.clone(),
            watcher: Some(self.watcher.clone()),
        }
    }

    /// Re-read the content config into the observer.
    pub async fn reload(&self) -> anyhow::Result<()> {
        reload_content_config_observer(&self.observer, &self.source).await;
        match self.observer.get() {
            ContentConfigState::Error(e) => Err(anyhow::anyhow!("{e}")),
            ContentConfigState::DoesNotExist => {
                warn!(path = %self.config_path.display(), "no content config found");
                Ok(())
            }
            ContentConfigState::Loaded(config) => {
                let settings = self.settings();
                if settings.experimental.content_intellisense {
                    ensure_collection_manifest(&settings, &config).await?;
                }
                Ok(())
            }
            ContentConfigState::Init | ContentConfigState::Loading => Ok(()),
        }
    }

    /// Entry count of every content layer collection, by name.
    pub fn summary(&self) -> Vec<(String, usize)> {
        match self.observer.get() {
            ContentConfigState::Loaded(config) => config
                .content_layer_collections()
                .map(|(name, _)| (name.to_string(), self.store.values(name).len()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Directories the sync itself writes to.
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        let settings = self.settings();
        vec![
            canonical(&settings.cache_dir()),
            canonical(&settings.generated_dir()),
        ]
    }

    /// Directories to watch besides the root: the config file's directory
    /// when `--config` points outside the root.
    pub fn extra_watch_dirs(&self) -> Vec<PathBuf> {
        let root = self.settings().root.clone();
        match self.config_path.parent() {
            Some(dir) if !self.config_path.starts_with(&root) && dir.is_dir() => {
                vec![dir.to_path_buf()]
            }
            _ => Vec::new(),
        }
    }
}

/// Settings from `config_path`, or defaults rooted at `root` when the file
/// does not exist.
fn read_settings(config_path: &Path, root: &Path) -> anyhow::Result<ProjectConfig> {
    let mut settings = if config_path.exists() {
        ProjectConfig::from_path(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    } else {
        warn!(path = %config_path.display(), "no config file, using defaults");
        ProjectConfig {
            root: root.to_path_buf(),
            ..ProjectConfig::default()
        }
    };
    settings.root = canonical(&settings.root);
    Ok(settings)
}

/// Canonical form of `path`. A path that does not exist yet keeps its file
/// name under its canonical parent, or is returned as is.
pub fn canonical(path: &Path) -> PathBuf {
    if let Ok(path) = std::fs::canonicalize(path) {
        return path;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_sync::{ContentLayerHost, SyncOptions};

    const CONFIG: &str = r#"
dev = false

[experimental]
content_layer = true

[collections.posts]
type = "content_layer"
loader = { file = "data/posts.json" }

[collections.posts.schema]
title = "string"
"#;

    fn write_site(root: &Path) {
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join(CONFIG_FILE), CONFIG).unwrap();
        std::fs::write(
            root.join("data/posts.json"),
            r#"[{"id": "p1", "title": "Hello"}]"#,
        )
        .unwrap();
    }

    fn args(root: &Path) -> ProjectArgs {
        ProjectArgs {
            root: root.to_path_buf(),
            config: None,
        }
    }

    #[tokio::test]
    async fn syncs_declared_project() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());

        let project = Project::open(&args(dir.path())).await.unwrap();
        let host = ContentLayerHost::new();
        let layer = host.init(project.layer_options());
        project.reload().await.unwrap();
        layer.sync(SyncOptions::default()).await.unwrap();

        assert_eq!(project.summary(), vec![("posts".to_string(), 1)]);
        assert!(data_store_file(&project.settings(), None).exists());
        assert!(project
            .watcher
            .is_watched(project.settings().root.join("data/posts.json")));

        // A second process picks up the persisted store.
        let reopened = Project::open(&args(dir.path())).await.unwrap();
        assert_eq!(reopened.store.values("posts").len(), 1);
        host.dispose();
    }

    #[tokio::test]
    async fn missing_config_runs_on_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::open(&args(dir.path())).await.unwrap();
        project.reload().await.unwrap();
        assert!(matches!(project.observer.get(), ContentConfigState::DoesNotExist));
        assert!(project.summary().is_empty());
    }

    #[tokio::test]
    async fn broken_collections_surface_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::open(&args(dir.path())).await.unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[collections.posts]\ntype = \"content_layer\"\n")
            .unwrap();
        let err = project.reload().await.unwrap_err();
        assert!(err.to_string().contains("posts"));
    }

    #[tokio::test]
    async fn settings_change_takes_effect_after_reinit() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());
        let config_path = dir.path().join(CONFIG_FILE);
        std::fs::write(&config_path, CONFIG.replace("content_layer = true", "content_layer = false"))
            .unwrap();

        let project = Project::open(&args(dir.path())).await.unwrap();
        let host = ContentLayerHost::new();
        let layer = host.init(project.layer_options());
        project.reload().await.unwrap();
        let err = layer.sync(SyncOptions::default()).await.unwrap_err();
        assert!(matches!(err, quire_sync::SyncError::ContentLayerDisabled { .. }));
        assert!(!project.reload_settings().unwrap());

        std::fs::write(&config_path, CONFIG).unwrap();
        assert!(project.reload_settings().unwrap());
        assert!(project.settings().experimental.content_layer);

        let layer = host.init(project.layer_options());
        project.reload().await.unwrap();
        layer.sync(SyncOptions::default()).await.unwrap();
        assert_eq!(project.summary(), vec![("posts".to_string(), 1)]);
        host.dispose();
    }

    #[tokio::test]
    async fn truncated_store_file_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());
        let project = Project::open(&args(dir.path())).await.unwrap();
        let store_file = data_store_file(&project.settings(), None);
        std::fs::create_dir_all(store_file.parent().unwrap()).unwrap();
        std::fs::write(&store_file, r#"{"collections": {"posts""#).unwrap();

        let project = Project::open(&args(dir.path())).await.unwrap();
        assert!(project.store.values("posts").is_empty());

        let host = ContentLayerHost::new();
        let layer = host.init(project.layer_options());
        project.reload().await.unwrap();
        layer.sync(SyncOptions::default()).await.unwrap();
        assert_eq!(project.summary(), vec![("posts".to_string(), 1)]);
        host.dispose();
    }

    #[tokio::test]
    async fn config_outside_root_is_watched() {
        let site = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let config = elsewhere.path().join(CONFIG_FILE);
        std::fs::write(&config, format!("root = {:?}\n", site.path().display().to_string()))
            .unwrap();

        let project = Project::open(&ProjectArgs {
            root: site.path().to_path_buf(),
            config: Some(config),
        })
        .await
        .unwrap();
        assert_eq!(project.extra_watch_dirs(), vec![canonical(elsewhere.path())]);

        let inside = Project::open(&args(site.path())).await.unwrap();
        assert!(inside.extra_watch_dirs().is_empty());
    }
}
