pub use rrqueue_proto::blockscout::health::v1::*;
pub use rrqueue_proto::blockscout::rrqueue::v1::*;
