use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use clap::Parser;
use lm_app::{cli, control, hotreload, sources};
use lm_core::config::DecoderConfig;
use lm_decode::stream::TickStream;
use lm_render::display::TerminalDisplay;
use lm_render::renderer::MessageRenderer;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);
    let table = Arc::new(config.morse_table().context("Table Morse invalide")?);
    let config = Arc::new(ArcSwap::from_pointee(config));

    // 5. Hot-reload config (thread interne notify)
    let _watcher = if cli.config.exists() {
        let reload_cli = cli.clone();
        Some(hotreload::spawn_config_watcher(
            &cli.config,
            &config,
            move |c: &mut DecoderConfig| reload_cli.apply_overrides(c),
        )?)
    } else {
        None
    };

    // 6. Ctrl+C : arrêt coopératif, le code en attente est quand même vidé
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("Impossible d'installer le handler Ctrl+C")?;
    }

    // 7. Source et sorties
    let current = config.load_full();
    let sensor = sources::open_sensor(&cli, &current, &table)?;
    let stream = if cli.fast {
        TickStream::new(sensor).with_retry_limit(current.sensor_retry_limit)
    } else {
        TickStream::from_config(sensor, &current)
    };
    let mut stream = stream.with_stop(stop);
    if let Some(max) = cli.max_ticks {
        stream = stream.with_max_ticks(max);
    }
    let mut renderer = MessageRenderer::new(TerminalDisplay::stdout(), sources::open_speech(&cli)?);

    // 8. Boucle principale
    let result = control::run(stream, &config, table, &mut renderer);

    // 9. Libérer la ligne du terminal (TOUJOURS, même en cas d'erreur)
    if let Err(e) = renderer.display_mut().finish() {
        log::warn!("Terminal : {e:#}");
    }

    result.map(|message| log::info!("Message décodé : {message:?}"))
}

/// Config file if present, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<DecoderConfig> {
    if cli.config.exists() {
        lm_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(DecoderConfig::default())
    }
}
