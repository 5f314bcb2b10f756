//! Estimated minutes-to-read for a post body.

use crate::types::ContentBlock;

/// Fixed reading speed used for the estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Count words by splitting on single spaces.
///
/// No punctuation or locale handling: `"a  b"` is three words. An empty
/// string is zero words so that fields defaulted to `""` do not inflate
/// the total.
pub fn count_words(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.split(' ').count()
}

/// Sum of heading words and body fragment words over every block
pub fn total_words(content: &[ContentBlock]) -> usize {
    content
        .iter()
        .map(|block| {
            count_words(&block.heading)
                + block
                    .body
                    .iter()
                    .map(|fragment| count_words(&fragment.text))
                    .sum::<usize>()
        })
        .sum()
}

/// Estimated reading time in whole minutes, rounded up. Empty content is 0.
pub fn estimate_reading_time(content: &[ContentBlock]) -> u32 {
    minutes_for(total_words(content))
}

/// Saturates at `u32::MAX`
fn minutes_for(words: usize) -> u32 {
    u32::try_from(words.div_ceil(WORDS_PER_MINUTE)).unwrap_or(u32::MAX)
}
