//! Backend wire protocol: messages, transport and the two send clients.

pub mod clients;
pub mod messages;
pub mod transport;

pub use clients::{ControlSignalClient, ParamSyncClient, DEFAULT_CONTROL_ROUTE, DEFAULT_PARAMS_ROUTE};
pub use messages::{Action, ControlSignal, ParameterMessage};
pub use transport::{HttpTransport, RecordingTransport, Transport};
