use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result, bail};
use lm_core::traits::Speech;

/// Text-to-speech through an external program (`espeak`, `say`…).
///
/// Each utterance is a separate process receiving the text as its last
/// argument. `speak` returns as soon as the process is spawned; finished
/// processes are reaped on the next call and the rest are awaited on drop so
/// the final summary is not cut off.
///
/// # Example
/// ```
/// use lm_render::speech::CommandSpeech;
/// let speech = CommandSpeech::parse("espeak -s 140").unwrap();
/// assert_eq!(speech.program(), "espeak");
/// ```
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
    pending: Vec<Child>,
}

impl CommandSpeech {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            pending: Vec::new(),
        }
    }

    /// Découpe une ligne de commande sur les espaces (pas de guillemets).
    ///
    /// # Errors
    /// Returns an error if `command` is blank.
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let Some(program) = parts.next() else {
            bail!("Commande de synthèse vocale vide");
        };
        Ok(Self::new(program, parts.collect()))
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Utterances still playing.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn reap(&mut self) {
        self.pending.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    log::debug!("Synthèse vocale terminée avec {status}");
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::warn!("Synthèse vocale : état illisible : {e}");
                false
            }
        });
    }
}

impl Speech for CommandSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        self.reap();
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Impossible de lancer {}", self.program))?;
        log::debug!("parole ({}) : {text}", self.program);
        self.pending.push(child);
        Ok(())
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        for mut child in self.pending.drain(..) {
            if let Err(e) = child.wait() {
                log::warn!("Synthèse vocale interrompue : {e}");
            }
        }
    }
}

/// Speech sink that only logs, for `--no-speech` and headless runs.
#[derive(Debug, Default)]
pub struct LogSpeech;

impl Speech for LogSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        log::info!("parole : {text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_program_and_args() {
        let speech = CommandSpeech::parse("  espeak -v en  ").unwrap();
        assert_eq!(speech.program(), "espeak");
        assert_eq!(speech.args, vec!["-v".to_owned(), "en".to_owned()]);
    }

    #[test]
    fn blank_command_is_rejected() {
        assert!(CommandSpeech::parse("   ").is_err());
    }

    #[test]
    fn missing_program_is_an_error() {
        let mut speech = CommandSpeech::new("lumorse-no-such-tts-binary", Vec::new());
        assert!(speech.speak("SOS").is_err());
        assert_eq!(speech.pending(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn spawned_utterances_are_tracked() {
        let mut speech = CommandSpeech::new("true", Vec::new());
        speech.speak("E").unwrap();
        assert!(speech.pending() >= 1);
    }

    #[test]
    fn log_speech_never_fails() {
        assert!(LogSpeech.speak("HELLO").is_ok());
    }
}
