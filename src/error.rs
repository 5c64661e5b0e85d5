use thiserror::Error;

/// Rejections from the user-facing alert operations.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("target price {target} already in range of daily high {high} and low {low}")]
    TargetInDailyRange { target: f64, high: f64, low: f64 },

    #[error("alert #{number} not found")]
    AlertNotFound { number: i32 },

    #[error("invalid target price {target}")]
    InvalidTarget { target: f64 },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
