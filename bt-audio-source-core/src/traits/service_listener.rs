use crate::models::state::SourceState;

/// Notifications from the Bluetooth audio source service.
pub trait ServiceListener: Send + Sync {
    /// The service came up (`true`) or went away (`false`).
    fn on_operational_state_changed(&self, running: bool);

    /// The remote device changed connection state.
    fn on_state_changed(&self, state: SourceState);
}
