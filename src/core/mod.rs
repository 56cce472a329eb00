// Core module - transport abstraction, framing, reconnect policy and session loop
pub mod framer;
pub mod interrupt;
pub mod output;
pub mod reconnect;
pub mod session;
pub mod transport;

pub use framer::LineFramer;
pub use interrupt::{Interrupt, InterruptTrigger};
pub use output::{OutputSink, RenderedLine};
pub use reconnect::{ConnectError, ConnectPhase, LinkState, ReconnectPolicy, Reconnector};
pub use transport::{ReadOutcome, Transport, TransportType};
