use crate::generator::WordSource;

const WORDS_EN: &str = include_str!("../../assets/words-en.json");

/// The bundled English word list.
pub struct Dictionary {
    words: Vec<String>,
}

impl Dictionary {
    pub fn load() -> Self {
        let words: Vec<String> = serde_json::from_str(WORDS_EN).unwrap_or_default();
        Self::from_words(words)
    }

    /// Keep lowercase ASCII words only.
    pub fn from_words(words: Vec<String>) -> Self {
        let words = words
            .into_iter()
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_lowercase()))
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordSource for Dictionary {
    fn list_words(&self) -> Vec<String> {
        self.words.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_list_is_large_enough_for_default_sample() {
        let dictionary = Dictionary::load();
        assert!(dictionary.len() >= 200);
        assert!(
            dictionary
                .list_words()
                .iter()
                .all(|w| w.chars().all(|c| c.is_ascii_lowercase()))
        );
    }

    #[test]
    fn from_words_drops_non_lowercase() {
        let dictionary = Dictionary::from_words(vec![
            "ok".into(),
            "Caps".into(),
            "".into(),
            "num3".into(),
            "fine".into(),
        ]);
        assert_eq!(dictionary.list_words(), vec!["ok", "fine"]);
    }
}
