use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("missing source path")]
    MissingSource,

    #[error("pattern '{pattern}' must start with '/'")]
    InvalidPattern { pattern: String },

    #[error("'*' is only allowed as the final segment of '{pattern}'")]
    SplatNotFinal { pattern: String },

    #[error("destination placeholder ':{name}' is never captured by the source or params")]
    UnboundPlaceholder { name: String },

    #[error("a rule without a destination only supports status 200, got {status}")]
    ForwardStatus { status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splat_not_final_message() {
        let err = CompileError::SplatNotFinal {
            pattern: "/a/*/b".into(),
        };
        assert_eq!(
            err.to_string(),
            "'*' is only allowed as the final segment of '/a/*/b'"
        );
    }

    #[test]
    fn unbound_placeholder_message() {
        let err = CompileError::UnboundPlaceholder { name: "id".into() };
        assert_eq!(
            err.to_string(),
            "destination placeholder ':id' is never captured by the source or params"
        );
    }

    #[test]
    fn forward_status_message() {
        let err = CompileError::ForwardStatus { status: 301 };
        assert_eq!(
            err.to_string(),
            "a rule without a destination only supports status 200, got 301"
        );
    }
}
