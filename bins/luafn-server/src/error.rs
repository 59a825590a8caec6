#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("configure: {summary}: {detail}")]
    Configure { summary: String, detail: String },

    #[error("argument {index}: {detail}")]
    Argument { index: usize, detail: String },

    #[error("{0}")]
    Call(#[from] luafn_engine::CallFailure),

    #[error("wire: {0}")]
    Wire(#[from] luafn_wire::WireError),

    #[error("api: {0}")]
    Api(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
