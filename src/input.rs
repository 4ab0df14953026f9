/// Characters entered so far in the running attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputTracker {
    input: String,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn reset(&mut self) {
        self.input.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.input
    }

    pub fn len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.input.contains(c)
    }

    /// True if the input equals the first `len()` characters of `target`
    pub fn matches_prefix_of(&self, target: &str) -> bool {
        self.mismatch_at(target).is_none()
    }

    /// Index of the first input character that disagrees with `target`.
    /// Input running past the end of `target` mismatches at `target`'s length.
    pub fn mismatch_at(&self, target: &str) -> Option<usize> {
        let mut expected = target.chars();
        self.input
            .chars()
            .enumerate()
            .find(|(_, c)| expected.next() != Some(*c))
            .map(|(idx, _)| idx)
    }

    /// True if the input is exactly `target` and `target` is as long as required
    pub fn is_complete(&self, target: &str, required_len: usize) -> bool {
        target.chars().count() == required_len && self.input == target
    }
}
