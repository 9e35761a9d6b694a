/// Text shown in a display region that currently has nothing to show.
pub const PLACEHOLDER: &str = "-";

/// Visual emphasis for the status region. The DOM view maps these to the
/// page's status colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tone {
    #[default]
    Muted,
    Pending,
    Ok,
    Err,
}

/// Output port for the five page regions plus the connect control.
///
/// The controller rewrites every region on every state transition, so an
/// implementation never has to track which fields are still valid.
pub trait View {
    fn set_status(&mut self, text: &str, tone: Tone);
    fn set_address(&mut self, text: &str);
    fn set_network(&mut self, text: &str);
    fn set_balance(&mut self, text: &str);
    fn set_connect(&mut self, enabled: bool, label: &str);

    /// A blocking notice outside the status region (the "install a wallet"
    /// alert). Not a state transition.
    fn notice(&mut self, text: &str);
}
