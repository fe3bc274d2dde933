pub mod sqs;
pub mod traits;

pub use sqs::SqsPublisher;
pub use traits::{PublishError, PublishRequest, SignalPublisher};
