use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("cannot dial broker {url}: {reason}")]
    Dial { url: String, reason: String },

    #[error("broker connection closed")]
    Closed,

    #[error("queue {0} already has a consumer")]
    AlreadyConsumed(String),

    #[error("queue {0} has no consumer left")]
    QueueClosed(String),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
