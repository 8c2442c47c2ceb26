use std::path::PathBuf;

use quire_config::ProjectConfig;
use quire_types::DATA_STORE_FILE;

/// Location of the data store cache file.
///
/// Dev mode keeps it in the generated directory, production in the cache
/// directory. `dev` overrides the project's own setting.
pub fn data_store_file(settings: &ProjectConfig, dev: Option<bool>) -> PathBuf {
    let dev = dev.unwrap_or_else(|| settings.is_dev());
    let dir = if dev {
        settings.generated_dir()
    } else {
        settings.cache_dir()
    };
    dir.join(DATA_STORE_FILE)
}
