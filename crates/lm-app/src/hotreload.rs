use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use lm_core::config::DecoderConfig;
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Lance un thread qui surveille le fichier config et met à jour l'ArcSwap.
///
/// `overrides` is re-applied to every reloaded config so CLI flags keep
/// precedence over the file. Retourne le Watcher (doit rester vivant tant
/// que l'app tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use arc_swap::ArcSwap;
/// use lm_core::config::DecoderConfig;
/// use lm_app::hotreload::spawn_config_watcher;
///
/// let config = Arc::new(ArcSwap::from_pointee(DecoderConfig::default()));
/// let _watcher = spawn_config_watcher(Path::new("config/default.toml"), &config, |_| {});
/// ```
pub fn spawn_config_watcher<F>(
    config_path: &Path,
    config: &Arc<ArcSwap<DecoderConfig>>,
    overrides: F,
) -> Result<impl Watcher + use<F>>
where
    F: Fn(&mut DecoderConfig) + Send + 'static,
{
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_))
        {
            reload(&path, &config, &overrides);
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Recharge `path` dans `config`. Une config invalide laisse l'ancienne en place.
pub fn reload<F>(path: &Path, config: &ArcSwap<DecoderConfig>, overrides: F)
where
    F: Fn(&mut DecoderConfig),
{
    match lm_core::config::load_config(path) {
        Ok(mut new_config) => {
            overrides(&mut new_config);
            config.store(Arc::new(new_config));
            log::info!("Config rechargée depuis {}", path.display());
        }
        Err(e) => {
            log::warn!("Erreur de rechargement config : {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_core::morse::MorseTable;
    use lm_decode::session::decode_ticks;
    use std::io::Write;

    #[test]
    fn reload_publishes_new_thresholds() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\ndash_ratio = 2.5").unwrap();
        let config = ArcSwap::from_pointee(DecoderConfig::default());
        reload(file.path(), &config, |c| c.unit_ticks = 9);
        let current = config.load();
        assert_eq!(current.thresholds.dash_ratio, 2.5);
        assert_eq!(current.unit_ticks, 9);
    }

    #[test]
    fn broken_file_keeps_previous_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds\n").unwrap();
        let config = ArcSwap::from_pointee(DecoderConfig::default());
        let before = config.load_full();
        reload(file.path(), &config, |_| {});
        assert!(Arc::ptr_eq(&before, &config.load_full()));
    }

    #[test]
    fn overlapping_bands_keep_tuned_thresholds() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[thresholds]\ndash_ratio = 2.5\n").unwrap();
        let config = ArcSwap::from_pointee(DecoderConfig::default());
        reload(file.path(), &config, |_| {});
        let tuned = config.load_full();
        assert_eq!(tuned.thresholds.dash_ratio, 2.5);

        std::fs::write(
            file.path(),
            "[thresholds]\ndash_ratio = 2.5\nchar_gap_ratio = 6.0\n",
        )
        .unwrap();
        reload(file.path(), &config, |_| {});
        let current = config.load_full();
        assert!(Arc::ptr_eq(&tuned, &current));

        // 9 ticks at u = 4 stay below 2.5u: still a dot.
        let mut ticks = vec![true; 9];
        ticks.extend([false; 24]);
        let table = Arc::new(MorseTable::standard());
        let decoded = decode_ticks(&current, table, ticks);
        assert_eq!(decoded.message, "E");
    }
}
