/// A value produced by a step that may have recovered from a local failure.
///
/// Each recovery appends a human-readable warning; the pipeline collects
/// them into the final result instead of logging and forgetting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computed<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Computed<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(
        value: T,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            value,
            warnings: vec![warning.into()],
        }
    }

    pub fn map<U>(
        self,
        f: impl FnOnce(T) -> U,
    ) -> Computed<U> {
        Computed {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Moves the warnings into `sink` and returns the value.
    pub fn collect_into(
        self,
        sink: &mut Vec<String>,
    ) -> T {
        sink.extend(self.warnings);
        self.value
    }
}
