use crate::error::CoreError;

/// Fournit une lecture booléenne par tick.
///
/// Implémenté par : `PatternSensor`, `ColorTraceSensor`, `SynthSensor`.
///
/// # Example
/// ```
/// use lm_core::traits::Sensor;
/// use lm_core::error::CoreError;
///
/// struct Dark;
/// impl Sensor for Dark {
///     fn read(&mut self) -> Result<Option<bool>, CoreError> { Ok(Some(false)) }
/// }
/// assert_eq!(Dark.read().unwrap(), Some(false));
/// ```
pub trait Sensor {
    /// Lit l'état courant du signal.
    ///
    /// Retourne `Ok(None)` quand une source finie est épuisée. Une source live
    /// ne retourne jamais `None`.
    ///
    /// # Errors
    /// Returns [`CoreError::Sensor`] when no reading could be obtained this tick.
    fn read(&mut self) -> Result<Option<bool>, CoreError>;

    /// Nom lisible pour les logs.
    fn name(&self) -> &'static str {
        "sensor"
    }
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    fn read(&mut self) -> Result<Option<bool>, CoreError> {
        (**self).read()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Affiche le texte décodé.
///
/// # Example
/// ```
/// use lm_core::traits::Display;
///
/// struct Null;
/// impl Display for Null {
///     fn show(&mut self, _text: &str) -> anyhow::Result<()> { Ok(()) }
/// }
/// ```
pub trait Display {
    /// Render `text`, the cumulative decoded message.
    ///
    /// # Errors
    /// Returns an error if the output device rejects the write.
    fn show(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Prononce le texte décodé.
pub trait Speech {
    /// Say `text`. Must not block until playback completes.
    ///
    /// # Errors
    /// Returns an error if the speech backend cannot be started.
    fn speak(&mut self, text: &str) -> anyhow::Result<()>;
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn show(&mut self, text: &str) -> anyhow::Result<()> {
        (**self).show(text)
    }
}

impl<S: Speech + ?Sized> Speech for Box<S> {
    fn speak(&mut self, text: &str) -> anyhow::Result<()> {
        (**self).speak(text)
    }
}
