#![allow(unused_imports, dead_code)]

mod mock_transport;
mod test_server;

pub use mock_transport::*;
pub use test_server::*;
