use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("data corrupt at {key}: {reason}")]
    DataCorrupt { key: String, reason: String },
    #[error("io error: {0}")]
    Io(String),
    #[error("timed out waiting for lock {0}")]
    LockTimeout(String),
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => Self::InvalidArgument(msg),
        }
    }
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self { Self::InvalidArgument(msg.into()) }

    pub fn corrupt(key: &str, reason: impl ToString) -> Self {
        Self::DataCorrupt { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn io(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io(format!("{context}: {err}"))
    }

    /// Short text safe to show a player; the full error belongs in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "操作参数有误，请联系管理员！",
            Self::NotFound(_) => "未找到相关数据！",
            Self::DataCorrupt { .. } => "玩家数据已损坏，请联系管理员！",
            Self::Io(_) => "数据读写失败，请稍后再试！",
            Self::LockTimeout(_) => "操作繁忙，请稍后再试！",
        }
    }
}
