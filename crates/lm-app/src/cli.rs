use std::path::PathBuf;

use clap::Parser;
use lm_core::config::{CalibrationMode, DecoderConfig};

/// lumorse : décodeur Morse pour capteur lumineux ou couleur.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : trace texte, un caractère par tick (`1`/`#` = signal, `0`/`_`/`.` = rien).
    #[arg(long)]
    pub pattern: Option<PathBuf>,

    /// Source : trace de codes couleur (0-7 ou noms : red, white…).
    #[arg(long)]
    pub colors: Option<PathBuf>,

    /// Source : message texte synthétisé en Morse.
    #[arg(long)]
    pub message: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Durée d'une unité Morse, en ticks.
    #[arg(long)]
    pub unit: Option<u32>,

    /// Période d'échantillonnage en millisecondes.
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Calibrer l'unité sur une impulsion de préambule.
    #[arg(long, default_value_t = false)]
    pub preamble: bool,

    /// Taux de parasites injectés dans --message (0.0-1.0).
    #[arg(long, default_value_t = 0.0)]
    pub flicker: f64,

    /// Seed des parasites.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Arrêter après N ticks.
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Décoder sans cadence temps réel (traces enregistrées).
    #[arg(long, default_value_t = false)]
    pub fast: bool,

    /// Programme de synthèse vocale, avec ses arguments.
    #[arg(long, default_value = "espeak")]
    pub speech_cmd: String,

    /// Désactiver la synthèse vocale (journalisée à la place).
    #[arg(long, default_value_t = false)]
    pub no_speech: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one sensor source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or more than one source is specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        let count = usize::from(self.pattern.is_some())
            + usize::from(self.colors.is_some())
            + usize::from(self.message.is_some());

        if count == 0 {
            anyhow::bail!("Aucune source spécifiée. Utilisez --pattern, --colors ou --message.");
        }
        if count > 1 {
            anyhow::bail!(
                "Une seule source à la fois. Spécifiez --pattern, --colors OU --message."
            );
        }
        Ok(())
    }

    /// Appliquer les overrides CLI sur la config chargée.
    pub fn apply_overrides(&self, config: &mut DecoderConfig) {
        if let Some(unit) = self.unit {
            config.unit_ticks = unit;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_period_ms = ms;
        }
        if self.preamble {
            config.calibration_mode = CalibrationMode::Preamble;
        }
        config.clamp_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lumorse").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn exactly_one_source() {
        assert!(parse(&["--message", "SOS"]).validate_source().is_ok());
        assert!(parse(&[]).validate_source().is_err());
        assert!(
            parse(&["--message", "SOS", "--pattern", "trace.txt"])
                .validate_source()
                .is_err()
        );
    }

    #[test]
    fn overrides_reach_the_config() {
        let cli = parse(&["--message", "E", "--unit", "6", "--tick-ms", "20", "--preamble"]);
        let mut config = DecoderConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.unit_ticks, 6);
        assert_eq!(config.tick_period_ms, 20);
        assert_eq!(config.calibration_mode, CalibrationMode::Preamble);
    }

    #[test]
    fn overrides_are_clamped() {
        let cli = parse(&["--message", "E", "--unit", "0"]);
        let mut config = DecoderConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.unit_ticks, 1);
    }

    #[test]
    fn defaults() {
        let cli = parse(&["--pattern", "t.txt"]);
        assert_eq!(cli.speech_cmd, "espeak");
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        assert!(!cli.fast);
    }
}
