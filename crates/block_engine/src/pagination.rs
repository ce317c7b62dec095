use crate::{BlockSequence, ContentBlock};

pub const DEFAULT_CUT_BUTTON_TEXT: &str = "Читать дальше";

/// Where a "read more" cut goes in a long block list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutPolicy {
    /// Zero-based index of the block the cut follows.
    pub threshold: usize,
    /// The cut is only inserted when the list has more blocks than this.
    pub min_total: usize,
    pub button_text: String,
}

impl Default for CutPolicy {
    fn default() -> Self {
        Self {
            threshold: 2,
            min_total: 3,
            button_text: DEFAULT_CUT_BUTTON_TEXT.to_string(),
        }
    }
}

impl CutPolicy {
    /// Inserts one cut right after `blocks[threshold]` when the list has more
    /// than `min_total` blocks and that index exists. Positions are renumbered
    /// either way.
    pub fn apply(&self, blocks: Vec<ContentBlock>) -> BlockSequence {
        let mut sequence = BlockSequence::new();
        let insert = blocks.len() > self.min_total && self.threshold < blocks.len();
        for (index, block) in blocks.into_iter().enumerate() {
            sequence.push(block);
            if insert && index == self.threshold {
                sequence.push(ContentBlock::cut(&self.button_text));
            }
        }
        sequence
    }
}

/// Entities with an explicit extended text: the cut always separates the two
/// parts when the second one has any blocks, and the threshold is ignored.
pub fn join_with_cut(
    primary: Vec<ContentBlock>,
    secondary: Vec<ContentBlock>,
    policy: &CutPolicy,
) -> BlockSequence {
    let mut sequence = BlockSequence::from_blocks(primary);
    if !secondary.is_empty() {
        sequence.push(ContentBlock::cut(&policy.button_text));
        sequence.extend(secondary);
    }
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockData;

    fn texts(n: usize) -> Vec<ContentBlock> {
        (0..n)
            .filter_map(|i| ContentBlock::text(&format!("block {i}")))
            .collect()
    }

    fn kinds(sequence: &BlockSequence) -> Vec<&'static str> {
        sequence.blocks().iter().map(ContentBlock::kind).collect()
    }

    fn assert_dense(sequence: &BlockSequence) {
        for (i, block) in sequence.blocks().iter().enumerate() {
            assert_eq!(block.position, i);
        }
    }

    #[test]
    fn short_lists_get_no_cut() {
        let sequence = CutPolicy::default().apply(texts(3));
        assert_eq!(sequence.len(), 3);
        assert!(sequence.blocks().iter().all(|b| !b.is_cut()));
        assert_dense(&sequence);
    }

    #[test]
    fn long_lists_get_one_cut_after_threshold() {
        let sequence = CutPolicy::default().apply(texts(5));
        assert_eq!(
            kinds(&sequence),
            vec!["text", "text", "text", "cut", "text", "text"]
        );
        assert_dense(&sequence);
        match &sequence.blocks()[3].data {
            BlockData::Cut { button_text } => assert_eq!(button_text, DEFAULT_CUT_BUTTON_TEXT),
            other => panic!("expected cut, got {other:?}"),
        }
    }

    #[test]
    fn threshold_at_last_block_cuts_at_the_end() {
        let policy = CutPolicy {
            threshold: 4,
            min_total: 3,
            button_text: "More".into(),
        };
        let sequence = policy.apply(texts(5));
        assert_eq!(
            kinds(&sequence),
            vec!["text", "text", "text", "text", "text", "cut"]
        );
        assert_dense(&sequence);
    }

    #[test]
    fn threshold_past_the_end_adds_no_cut() {
        let policy = CutPolicy {
            threshold: 5,
            min_total: 1,
            button_text: "More".into(),
        };
        let sequence = policy.apply(texts(5));
        assert!(sequence.blocks().iter().all(|b| !b.is_cut()));
    }

    #[test]
    fn explicit_split_always_cuts_between_parts() {
        let sequence = join_with_cut(texts(1), texts(2), &CutPolicy::default());
        assert_eq!(kinds(&sequence), vec!["text", "cut", "text", "text"]);
        assert_dense(&sequence);
    }

    #[test]
    fn empty_extended_part_adds_no_cut() {
        let sequence = join_with_cut(texts(2), Vec::new(), &CutPolicy::default());
        assert_eq!(kinds(&sequence), vec!["text", "text"]);
    }
}
