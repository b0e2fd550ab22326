use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::CoreError;
use crate::generator::WordSource;

/// Split free text on whitespace runs, dropping empty tokens.
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Produce the word list for a session: the custom text when it has any
/// words, otherwise `sample_size` distinct draws from `source` in random
/// order.
pub fn select_words<R: Rng + ?Sized>(
    source: &dyn WordSource,
    custom_text: Option<&str>,
    sample_size: usize,
    rng: &mut R,
) -> Result<Vec<String>, CoreError> {
    if let Some(text) = custom_text
        && !text.trim().is_empty()
    {
        return Ok(split_words(text));
    }

    let mut pool = source.list_words();
    if pool.len() < sample_size {
        return Err(CoreError::EmptyWordSource {
            requested: sample_size,
            available: pool.len(),
        });
    }
    let (picked, _) = pool.partial_shuffle(rng, sample_size);
    Ok(picked.to_vec())
}
