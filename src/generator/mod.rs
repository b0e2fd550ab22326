pub mod dictionary;
pub mod selection;

/// Static corpus of candidate words for random sessions.
pub trait WordSource: Send + Sync {
    fn list_words(&self) -> Vec<String>;
}

impl WordSource for Vec<String> {
    fn list_words(&self) -> Vec<String> {
        self.clone()
    }
}
