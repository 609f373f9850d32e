//! Main memory: a block-addressed word array shared by every core's bus
//! transactions. Per §1 this is an out-of-scope external collaborator whose
//! only required interface is `read_block`/`write_block`; everything else
//! here (loading from / dumping to a `memin`/`memout` text file) is ambient
//! plumbing for the CLI.

use crate::cache::BLOCK_WORDS;

#[derive(Debug, Default, Clone)]
pub struct MainMemory {
    words: Vec<i32>,
}

impl MainMemory {
    #[must_use]
    pub fn from_words(words: Vec<i32>) -> Self {
        Self { words }
    }

    fn ensure_len(&mut self, len: usize) {
        if self.words.len() < len {
            self.words.resize(len, 0);
        }
    }

    #[must_use]
    pub fn read_word(&self, word_addr: u32) -> i32 {
        self.words.get(word_addr as usize).copied().unwrap_or(0)
    }

    pub fn write_word(&mut self, word_addr: u32, value: i32) {
        self.ensure_len(word_addr as usize + 1);
        self.words[word_addr as usize] = value;
    }

    /// `block_base` must already be 4-word aligned.
    #[must_use]
    pub fn read_block(&self, block_base: u32) -> [i32; BLOCK_WORDS] {
        let mut block = [0; BLOCK_WORDS];
        for (i, word) in block.iter_mut().enumerate() {
            *word = self.read_word(block_base + i as u32);
        }
        block
    }

    pub fn write_block(&mut self, block_base: u32, block: [i32; BLOCK_WORDS]) {
        for (i, word) in block.into_iter().enumerate() {
            self.write_word(block_base + i as u32, word);
        }
    }

    /// `memout.txt`: every word from 0 through the last non-zero word.
    #[must_use]
    pub fn nonzero_prefix(&self) -> &[i32] {
        let last_nonzero = self.words.iter().rposition(|&w| w != 0);
        match last_nonzero {
            Some(idx) => &self.words[..=idx],
            None => &[],
        }
    }
}
