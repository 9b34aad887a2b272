use crate::message::Message;
use crate::packet::Packet;

/// The capability the host (simulator) provides to an endpoint.
/// Endpoints call these methods to interact with the network, the timer
/// facility and the application layer; they never see the simulator itself.
pub trait SystemContext {
    /// Hand a packet to the unreliable channel. The channel may drop or
    /// corrupt it before it reaches the peer.
    fn send_packet(&mut self, packet: Packet);

    /// Arm the endpoint's single one-shot alarm to fire `on_timer` after
    /// `delay` simulated time units. Each endpoint owns at most one pending
    /// alarm; stop the previous one before arming a new one.
    fn start_timer(&mut self, delay: u64);

    /// Cancel the pending alarm. No-op if none is pending; a cancelled
    /// alarm never fires.
    fn stop_timer(&mut self);

    /// Pass a payload up to the application layer. Receiver-only.
    fn deliver_data(&mut self, payload: &str);

    /// Log a message to the simulator's debug output.
    fn log(&mut self, message: &str);

    /// Current simulation time.
    fn now(&self) -> u64;
}

/// Event handlers an endpoint implements. The host invokes them
/// synchronously, one at a time, in nondecreasing simulated-time order;
/// each call runs to completion before the next is dispatched.
pub trait Endpoint {
    /// Called once, before any other handler.
    fn init(&mut self, _ctx: &mut dyn SystemContext) {}

    /// Called when a (possibly corrupted) packet arrives from the channel.
    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet);

    /// Called when the one-shot alarm armed via `start_timer` expires.
    fn on_timer(&mut self, ctx: &mut dyn SystemContext);

    /// Called when the application layer has a message to send reliably.
    /// Sender-only.
    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, message: Message);
}
