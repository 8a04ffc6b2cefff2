//! l2lsd - OpenFlow L2 learning switch controller.
//!
//! The daemon consumes the event stream of connected switches and, per
//! frame, learns where addresses live, installs unicast flows for known
//! destinations and floods unknown ones. Message construction for the two
//! supported protocol versions lives in the `ofp-codec` crate; this crate
//! owns the decision logic, per-device state and delivery plumbing:
//!
//! - [`events`]: the consumed event-stream interface
//! - [`l2ls_mgr`]: packet-in and switch-connect handlers
//! - [`registry`]: address learning table and port admin state
//! - [`sink`]: non-blocking outbound delivery seams
//! - [`dispatcher`]: per-event task fan-out and graceful shutdown
//! - [`config`]: TOML-backed daemon configuration

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod l2ls_mgr;
pub mod registry;
pub mod sink;

pub use config::L2lsConfig;
pub use dispatcher::Dispatcher;
pub use error::{L2lsError, RegistryError, Result, SinkError};
pub use events::{PacketInEvent, SwitchEvent};
pub use l2ls_mgr::L2lsMgr;
pub use registry::{AddressTable, InterfaceState, SwitchRegistry};
pub use sink::{FlowApiSink, OutboundMessage, OutboundSink, QueueSink};
