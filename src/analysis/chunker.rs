//! Splits a comment sequence into fixed-size chunks

use crate::video::Comment;
use std::num::NonZeroUsize;

/// A contiguous slice of the comment sequence handled by one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position of this chunk, starting at 0
    pub index: usize,
    pub comments: Vec<Comment>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

/// Split `comments` into chunks of `size`, preserving order.
///
/// The last chunk may be shorter. Empty input yields no chunks.
pub fn chunk_comments(comments: &[Comment], size: NonZeroUsize) -> Vec<Chunk> {
    comments
        .chunks(size.get())
        .enumerate()
        .map(|(index, slice)| Chunk {
            index,
            comments: slice.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments(n: usize) -> Vec<Comment> {
        (0..n)
            .map(|i| Comment {
                id: format!("c{i}"),
                text: format!("comment {i}"),
                ..Default::default()
            })
            .collect()
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_comments(&[], size(100)).is_empty());
    }

    #[test]
    fn last_chunk_holds_the_remainder() {
        let chunks = chunk_comments(&comments(250), size(100));
        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn chunk_count_and_concatenation_hold_for_many_sizes() {
        for n in [0, 1, 7, 99, 100, 101, 300, 317] {
            for k in [1, 3, 50, 100, 1000] {
                let input = comments(n);
                let chunks = chunk_comments(&input, size(k));

                assert_eq!(chunks.len(), n.div_ceil(k), "n={n} k={k}");
                for (i, chunk) in chunks.iter().enumerate() {
                    assert!(!chunk.is_empty());
                    if i + 1 < chunks.len() {
                        assert_eq!(chunk.len(), k);
                    } else {
                        assert!(chunk.len() <= k);
                    }
                }

                let rebuilt: Vec<Comment> =
                    chunks.into_iter().flat_map(|c| c.comments).collect();
                assert_eq!(rebuilt, input);
            }
        }
    }
}
