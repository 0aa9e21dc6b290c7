//! Lifecycle state of a scheduling plugin (decoder or encoder).

use std::fmt;

/// Lifecycle of a scheduling plugin.
///
/// ```text
/// Created --start()--> Started --drain()--> Draining --[EOS pulled]--> Drained
/// (any) --stop()--> Stopped
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PluginState {
    #[default]
    Created,
    Started,
    /// End of stream has been submitted; outputs are still being pulled.
    Draining,
    /// The end-of-stream output has been pulled.
    Drained,
    Stopped,
}

impl PluginState {
    /// Whether new input may be submitted in this state.
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::Created | Self::Started)
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Started => "Started",
            Self::Draining => "Draining",
            Self::Drained => "Drained",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}
