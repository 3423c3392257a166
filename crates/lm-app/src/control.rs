use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use lm_core::config::DecoderConfig;
use lm_core::morse::MorseTable;
use lm_core::traits::{Display, Sensor, Speech};
use lm_decode::session::{Session, SessionEvent};
use lm_decode::stream::TickStream;
use lm_render::renderer::MessageRenderer;

/// Boucle de contrôle : un tick lu, un tick décodé, événements rendus avant
/// le tick suivant.
///
/// Le démarrage est annoncé avant le premier tick. Le pointeur de config est relu à chaque tick ; seuls les seuils d'un
/// rechargement s'appliquent à la session en cours. La boucle s'arrête quand
/// le flux se termine (source épuisée, Ctrl+C, `--max-ticks`) ou sur fin de
/// message, puis vide le code en attente et annonce le résumé.
///
/// Returns the decoded message.
///
/// # Errors
/// Returns an error if the sensor became unavailable. The partial message is
/// still flushed and rendered first.
pub fn run<S, D, Sp>(
    stream: TickStream<S>,
    config: &ArcSwap<DecoderConfig>,
    table: Arc<MorseTable>,
    renderer: &mut MessageRenderer<D, Sp>,
) -> Result<String>
where
    S: Sensor,
    D: Display,
    Sp: Speech,
{
    let mut applied = config.load_full();
    let mut session = Session::new(&applied, table);
    let mut events: Vec<SessionEvent> = Vec::new();
    let mut failure = None;

    log::info!(
        "Session démarrée : unité {:?}, période {} ms",
        session.unit(),
        applied.tick_period_ms
    );
    renderer.start();

    for tick in stream {
        let tick = match tick {
            Ok(tick) => tick,
            Err(e) => {
                log::error!("{e}");
                failure = Some(e);
                break;
            }
        };

        let latest = config.load_full();
        if !Arc::ptr_eq(&latest, &applied) {
            match session.set_thresholds(latest.thresholds.clone()) {
                Ok(()) => log::info!("Seuils mis à jour : {:?}", latest.thresholds),
                Err(e) => log::warn!("Seuils rechargés refusés : {e}"),
            }
            applied = latest;
        }

        session.push(tick.active, &mut events);
        for event in events.drain(..) {
            renderer.handle(&event);
        }
        if session.is_ended() {
            break;
        }
    }

    session.finish(&mut events);
    for event in events.drain(..) {
        renderer.handle(&event);
    }
    let message = session.message().to_owned();
    renderer.summary(&message);
    log::info!(
        "{} ticks, {} code(s) inconnu(s)",
        session.ticks(),
        session.misses()
    );

    match failure {
        Some(e) => Err(anyhow::Error::new(e).context("Décodage interrompu")),
        None => Ok(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_core::error::CoreError;
    use lm_source::pattern::PatternSensor;
    use lm_source::synth::{SynthOptions, SynthSensor};

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Display for Recorder {
        fn show(&mut self, text: &str) -> anyhow::Result<()> {
            self.0.push(text.to_owned());
            Ok(())
        }
    }

    impl Speech for Recorder {
        fn speak(&mut self, text: &str) -> anyhow::Result<()> {
            self.0.push(text.to_owned());
            Ok(())
        }
    }

    fn renderer() -> MessageRenderer<Recorder, Recorder> {
        MessageRenderer::new(Recorder::default(), Recorder::default())
    }

    fn table() -> Arc<MorseTable> {
        Arc::new(MorseTable::standard())
    }

    #[test]
    fn decodes_a_synthesized_message() {
        let sensor = SynthSensor::new(&table(), "SOS SOS", &SynthOptions::default()).unwrap();
        let config = ArcSwap::from_pointee(DecoderConfig::default());
        let mut out = renderer();
        let message = run(TickStream::new(sensor), &config, table(), &mut out).unwrap();
        assert_eq!(message, "SOS SOS");
        assert_eq!(out.speech().0.first().map(String::as_str), Some("Program starting"));
        assert_eq!(
            out.speech().0.last().map(String::as_str),
            Some("Decoded message: SOS SOS")
        );
        assert!(out.speech().0.iter().any(|s| s == "SOS"));
    }

    #[test]
    fn decodes_the_bundled_trace() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/sos.trace");
        let sensor = PatternSensor::from_file(&path).unwrap();
        let config = ArcSwap::from_pointee(DecoderConfig::default());
        let mut out = renderer();
        let message = run(TickStream::new(sensor), &config, table(), &mut out).unwrap();
        assert_eq!(message, "SOS");
        assert_eq!(
            out.speech().0[out.speech().0.len() - 2],
            "Morse code message: dot dot dot, dash dash dash, dot dot dot"
        );
    }

    #[test]
    fn preamble_and_flicker_are_handled() {
        let options = SynthOptions {
            unit: 5,
            preamble: true,
            flicker_rate: 0.1,
            seed: 7,
        };
        let sensor = SynthSensor::new(&table(), "HELLO WORLD", &options).unwrap();
        let mut config = DecoderConfig::default();
        config.calibration_mode = lm_core::config::CalibrationMode::Preamble;
        let config = ArcSwap::from_pointee(config);
        let mut out = renderer();
        let message = run(TickStream::new(sensor), &config, table(), &mut out).unwrap();
        assert_eq!(message, "HELLO WORLD");
    }

    /// Publishes a new config on its first read, like the file watcher would.
    struct Reloading {
        inner: PatternSensor,
        config: Arc<ArcSwap<DecoderConfig>>,
        next: Option<DecoderConfig>,
    }

    impl Sensor for Reloading {
        fn read(&mut self) -> Result<Option<bool>, CoreError> {
            if let Some(next) = self.next.take() {
                self.config.store(Arc::new(next));
            }
            self.inner.read()
        }
    }

    #[test]
    fn reloaded_thresholds_apply_to_the_running_session() {
        let config = Arc::new(ArcSwap::from_pointee(DecoderConfig::default()));
        let mut next = DecoderConfig::default();
        next.thresholds.dash_ratio = 0.75;
        let trace = format!("{}{}", "1".repeat(4), "0".repeat(24));
        let sensor = Reloading {
            inner: PatternSensor::parse(&trace).unwrap(),
            config: Arc::clone(&config),
            next: Some(next),
        };
        let mut out = renderer();
        let message = run(TickStream::new(sensor), &config, table(), &mut out).unwrap();
        assert_eq!(message, "T");
    }

    #[test]
    fn invalid_reload_keeps_previous_thresholds() {
        let config = Arc::new(ArcSwap::from_pointee(DecoderConfig::default()));
        let mut next = DecoderConfig::default();
        next.thresholds.noise_floor = 3.0;
        let trace = format!("{}{}", "1".repeat(4), "0".repeat(24));
        let sensor = Reloading {
            inner: PatternSensor::parse(&trace).unwrap(),
            config: Arc::clone(&config),
            next: Some(next),
        };
        let mut out = renderer();
        let message = run(TickStream::new(sensor), &config, table(), &mut out).unwrap();
        assert_eq!(message, "E");
    }

    struct Failing {
        good: u32,
    }

    impl Sensor for Failing {
        fn read(&mut self) -> Result<Option<bool>, CoreError> {
            if self.good == 0 {
                return Err(CoreError::Sensor("capteur débranché".into()));
            }
            self.good -= 1;
            Ok(Some(true))
        }
    }

    #[test]
    fn sensor_loss_flushes_then_fails() {
        let config = ArcSwap::from_pointee(DecoderConfig::default());
        let mut out = renderer();
        let stream = TickStream::new(Failing { good: 4 }).with_retry_limit(3);
        let err = run(stream, &config, table(), &mut out).unwrap_err();
        assert!(err.to_string().contains("Décodage interrompu"));
        assert_eq!(
            out.speech().0.last().map(String::as_str),
            Some("Decoded message: E")
        );
    }

    #[test]
    fn end_of_message_stops_before_the_source_ends() {
        let mut config = DecoderConfig::default();
        config.end_of_message_ratio = Some(7.0);
        let config = ArcSwap::from_pointee(config);
        let trace = format!("{}{}{}", "1".repeat(4), "0".repeat(40), "1".repeat(12));
        let sensor = PatternSensor::parse(&trace).unwrap();
        let mut out = renderer();
        let message = run(TickStream::new(sensor), &config, table(), &mut out).unwrap();
        assert_eq!(message, "E");
    }
}
