/// The wrapped fetch rejected. Carried inside `anyhow::Error`; use
/// `downcast_ref::<FetchFailure>()` to tell it apart from other errors.
#[derive(Debug)]
pub struct FetchFailure {
    source: anyhow::Error,
}

impl FetchFailure {
    pub fn new(source: anyhow::Error) -> Self {
        Self { source }
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("fetch failed")
    }
}

impl std::error::Error for FetchFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::FetchFailure;

    #[test]
    fn fetch_failure_is_recoverable_from_anyhow() {
        let err: anyhow::Error = FetchFailure::new(anyhow!("upstream 503")).into();

        let failure = err
            .downcast_ref::<FetchFailure>()
            .expect("should downcast to FetchFailure");
        assert_eq!(failure.cause().to_string(), "upstream 503");
        assert_eq!(err.to_string(), "fetch failed");
        assert_eq!(format!("{err:#}"), "fetch failed: upstream 503");
    }
}
