pub mod client;
pub mod request;
pub mod transport;

pub use client::{HttpClient, SessionExpiredHook};
pub use request::ApiRequest;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
