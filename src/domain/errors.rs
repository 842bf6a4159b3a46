use std::path::PathBuf;
use thiserror::Error;

/// Errors related to market data and connectivity
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("{source_name} returned HTTP {status}: {body}")]
    HttpStatus {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },

    #[error("Insufficient candles for {symbol}: got {got}, need {need}")]
    InsufficientCandles {
        symbol: String,
        got: usize,
        need: usize,
    },
}

/// Errors related to reading and writing snapshot/state files
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to the local credential file
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential file not found: {0:?}")]
    MissingFile(PathBuf),

    #[error("Credential key {key} not present in {path:?}")]
    MissingKey { key: String, path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_error_formatting() {
        let err = MarketDataError::InsufficientCandles {
            symbol: "DOGEUSDT".to_string(),
            got: 12,
            need: 20,
        };

        let msg = err.to_string();
        assert!(msg.contains("DOGEUSDT"));
        assert!(msg.contains("12"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_credential_error_formatting() {
        let err = CredentialError::MissingKey {
            key: "TRADE_BOARD_API_KEY".to_string(),
            path: PathBuf::from("/tmp/.credentials"),
        };

        assert!(err.to_string().contains("TRADE_BOARD_API_KEY"));
    }
}
