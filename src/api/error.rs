use reqwest::StatusCode;

/// 后端交互错误
///
/// 调用方只区分“出错/没出错”，这里的分型用于生成提示文案和日志。
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("网络错误: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("响应解析失败: {0}")]
    Decode(String),
    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    /// 是否在发请求之前就被本地校验拦下
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
