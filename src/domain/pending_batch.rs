/// Text fragments submitted since the last flush, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingBatch {
    fragments: Vec<String>,
}

impl PendingBatch {
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Clears the batch and returns its fragments joined by single spaces,
    /// or `None` when nothing is pending.
    pub fn take_joined(&mut self) -> Option<String> {
        if self.fragments.is_empty() {
            return None;
        }

        Some(std::mem::take(&mut self.fragments).join(" "))
    }
}
