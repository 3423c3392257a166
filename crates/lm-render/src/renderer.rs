use lm_core::traits::{Display, Speech};
use lm_decode::session::SessionEvent;

/// Drives a display and a speech sink from session events.
///
/// - [`start`](Self::start): announce that decoding begins;
/// - each character: show the cumulative text, speak the character;
/// - word break: show the text, speak the completed word;
/// - [`summary`](Self::summary): speak the keyed pattern then the decoded message.
///
/// Les échecs d'affichage ou de parole sont journalisés et n'interrompent
/// jamais le décodage.
///
/// # Example
/// ```
/// use lm_core::morse::CodeWord;
/// use lm_core::traits::{Display, Speech};
/// use lm_decode::session::SessionEvent;
/// use lm_render::renderer::MessageRenderer;
///
/// struct Quiet;
/// impl Display for Quiet { fn show(&mut self, _: &str) -> anyhow::Result<()> { Ok(()) } }
/// impl Speech for Quiet { fn speak(&mut self, _: &str) -> anyhow::Result<()> { Ok(()) } }
///
/// let mut renderer = MessageRenderer::new(Quiet, Quiet);
/// renderer.handle(&SessionEvent::Character { ch: 'E', code: ".".parse().unwrap() });
/// assert_eq!(renderer.text(), "E");
/// ```
pub struct MessageRenderer<D, S> {
    display: D,
    speech: S,
    text: String,
    word: String,
    /// Forme parlée des codes, un `Vec` par mot.
    pattern: Vec<Vec<String>>,
}

impl<D: Display, S: Speech> MessageRenderer<D, S> {
    pub fn new(display: D, speech: S) -> Self {
        Self {
            display,
            speech,
            text: String::new(),
            word: String::new(),
            pattern: vec![Vec::new()],
        }
    }

    /// Opening announcement, before the first tick.
    pub fn start(&mut self) {
        log::info!("Décodage démarré");
        self.say("Program starting");
    }

    pub fn handle(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Character { ch, code } => {
                self.text.push(*ch);
                self.word.push(*ch);
                if let Some(current) = self.pattern.last_mut() {
                    current.push(code.spoken());
                }
                self.show();
                self.say(&ch.to_string());
            }
            SessionEvent::WordBreak => {
                if self.word.is_empty() {
                    return;
                }
                self.text.push(' ');
                self.show();
                let word = std::mem::take(&mut self.word);
                self.say(&word);
                self.pattern.push(Vec::new());
            }
            SessionEvent::Calibrated { unit_ticks } => {
                log::info!("Unité calibrée : {unit_ticks} ticks");
            }
            SessionEvent::Recoverable(e) => log::debug!("Événement récupérable : {e}"),
            SessionEvent::EndOfMessage => log::info!("Fin de message détectée"),
        }
    }

    /// Closing announcement: the keyed pattern, then `message`.
    pub fn summary(&mut self, message: &str) {
        let pattern = self.spoken_pattern();
        if !pattern.is_empty() {
            self.say(&format!("Morse code message: {pattern}"));
        }
        self.say(&format!("Decoded message: {message}"));
        if let Err(e) = self.display.show(message) {
            log::warn!("Affichage impossible : {e:#}");
        }
    }

    /// "dot dot dot, dash dash dash word gap dot"
    #[must_use]
    pub fn spoken_pattern(&self) -> String {
        self.pattern
            .iter()
            .filter(|word| !word.is_empty())
            .map(|word| word.join(", "))
            .collect::<Vec<_>>()
            .join(" word gap ")
    }

    /// Texte affiché jusqu'ici.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }

    fn show(&mut self) {
        if let Err(e) = self.display.show(&self.text) {
            log::warn!("Affichage impossible : {e:#}");
        }
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = self.speech.speak(text) {
            log::warn!("Parole impossible : {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_decode::error::DecodeError;

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

    struct Broken;

    impl Display for Broken {
        fn show(&mut self, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("écran débranché")
        }
    }

    impl Speech for Broken {
        fn speak(&mut self, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("pas de haut-parleur")
        }
    }

    fn character(ch: char, code: &str) -> SessionEvent {
        SessionEvent::Character {
            ch,
            code: code.parse().unwrap(),
        }
    }

    fn render(events: &[SessionEvent]) -> MessageRenderer<Recorder, Recorder> {
        let mut renderer = MessageRenderer::new(Recorder::default(), Recorder::default());
        for event in events {
            renderer.handle(event);
        }
        renderer
    }

    #[test]
    fn start_is_spoken_before_any_character() {
        let mut renderer = MessageRenderer::new(Recorder::default(), Recorder::default());
        renderer.start();
        renderer.handle(&character('E', "."));
        assert_eq!(renderer.speech().0, vec!["Program starting", "E"]);
        assert_eq!(renderer.display().0, vec!["E"]);
    }

    #[test]
    fn characters_update_display_and_speech() {
        let renderer = render(&[character('S', "..."), character('O', "---")]);
        assert_eq!(renderer.display().0, vec!["S", "SO"]);
        assert_eq!(renderer.speech().0, vec!["S", "O"]);
    }

    #[test]
    fn word_break_speaks_the_word() {
        let renderer = render(&[
            character('H', "...."),
            character('I', ".."),
            SessionEvent::WordBreak,
            character('E', "."),
        ]);
        assert_eq!(renderer.text(), "HI E");
        assert_eq!(renderer.speech().0, vec!["H", "I", "HI", "E"]);
        assert_eq!(renderer.display().0.last().map(String::as_str), Some("HI E"));
    }

    #[test]
    fn repeated_word_break_is_ignored() {
        let renderer = render(&[
            character('E', "."),
            SessionEvent::WordBreak,
            SessionEvent::WordBreak,
        ]);
        assert_eq!(renderer.text(), "E ");
        assert_eq!(renderer.speech().0, vec!["E", "E"]);
    }

    #[test]
    fn summary_speaks_pattern_then_message() {
        let mut renderer = render(&[
            character('S', "..."),
            character('O', "---"),
            SessionEvent::WordBreak,
            character('E', "."),
        ]);
        renderer.summary("SO E");
        let spoken = &renderer.speech().0;
        assert_eq!(
            spoken[spoken.len() - 2],
            "Morse code message: dot dot dot, dash dash dash word gap dot"
        );
        assert_eq!(spoken[spoken.len() - 1], "Decoded message: SO E");
        assert_eq!(renderer.display().0.last().map(String::as_str), Some("SO E"));
    }

    #[test]
    fn empty_session_summary_skips_pattern() {
        let mut renderer = render(&[]);
        renderer.summary("");
        assert_eq!(renderer.speech().0, vec!["Decoded message: "]);
    }

    #[test]
    fn non_text_events_render_nothing() {
        let renderer = render(&[
            SessionEvent::Calibrated { unit_ticks: 4 },
            SessionEvent::Recoverable(DecodeError::CalibrationTimeout { waited_ticks: 200 }),
            SessionEvent::EndOfMessage,
        ]);
        assert!(renderer.display().0.is_empty());
        assert!(renderer.speech().0.is_empty());
    }

    #[test]
    fn output_failures_do_not_stop_rendering() {
        let mut renderer = MessageRenderer::new(Broken, Broken);
        renderer.handle(&character('T', "-"));
        renderer.handle(&SessionEvent::WordBreak);
        renderer.summary("T");
        assert_eq!(renderer.text(), "T ");
    }
}
