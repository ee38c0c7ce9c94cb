pub mod error;
pub mod http;
pub mod provider;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use http::HttpTransport;
pub use provider::Provider;
pub use traits::Transport;
