pub mod connection;
pub mod connector;
pub mod disconnect;

pub use connection::{Connection, ReportingConnection};
pub use connector::{connect, Connector, ErrorListener};
pub use disconnect::{disconnect, DisconnectOutcome, GracefulClose};
