pub type TapestryResult<T> = Result<T, TapestryError>;

#[derive(thiserror::Error, Debug)]
pub enum TapestryError {
    #[error("no data: {0}")]
    NoData(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TapestryError {
    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TapestryError::no_data("x")
                .to_string()
                .contains("no data:")
        );
        assert!(
            TapestryError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            TapestryError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = TapestryError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
