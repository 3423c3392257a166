use anyhow::{Context, Result};
use lm_core::config::DecoderConfig;
use lm_core::morse::MorseTable;
use lm_core::traits::{Sensor, Speech};
use lm_render::speech::{CommandSpeech, LogSpeech};
use lm_source::color::{ColorMap, ColorTraceSensor};
use lm_source::pattern::PatternSensor;
use lm_source::synth::{SynthOptions, SynthSensor};

use crate::cli::Cli;

/// Ouvre la source choisie en ligne de commande.
///
/// # Errors
/// Returns an error if the trace cannot be loaded, the message cannot be
/// keyed, or no source was given.
pub fn open_sensor(cli: &Cli, config: &DecoderConfig, table: &MorseTable) -> Result<Box<dyn Sensor>> {
    if let Some(path) = cli.pattern.as_deref() {
        return Ok(Box::new(PatternSensor::from_file(path)?));
    }
    if let Some(path) = cli.colors.as_deref() {
        let map = ColorMap::from_config(config);
        return Ok(Box::new(ColorTraceSensor::from_file(path, map)?));
    }
    if let Some(text) = cli.message.as_deref() {
        let options = SynthOptions {
            unit: config.unit_ticks,
            preamble: cli.preamble,
            flicker_rate: cli.flicker,
            seed: cli.seed,
        };
        let sensor = SynthSensor::new(table, text, &options)
            .with_context(|| format!("Message impossible à coder : {text:?}"))?;
        log::info!("Message synthétisé : {} ticks", sensor.readings().len());
        return Ok(Box::new(sensor));
    }
    anyhow::bail!("Aucune source spécifiée.")
}

/// Sortie vocale : commande externe, ou simple journal avec `--no-speech`.
///
/// # Errors
/// Returns an error if `--speech-cmd` is blank.
pub fn open_speech(cli: &Cli) -> Result<Box<dyn Speech>> {
    if cli.no_speech {
        return Ok(Box::new(LogSpeech));
    }
    Ok(Box::new(CommandSpeech::parse(&cli.speech_cmd)?))
}
