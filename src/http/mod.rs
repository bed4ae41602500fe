//! Transport layer: request defaults, endpoint templates and the dispatcher
//! that turns one [`CallInput`] into one [`ApiResponse`].

pub mod client;
pub mod endpoint;
pub mod method;
pub mod request;
pub mod response;
pub mod spec;

pub use client::Dispatcher;
pub use endpoint::EndpointTemplate;
pub use method::HttpMethod;
pub use request::{Body, CallInput};
pub use response::ApiResponse;
pub use spec::RequestSpec;
