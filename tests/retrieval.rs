use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use docrag_lib::embeddings::{self, Embedder, EmbeddingError};
use docrag_lib::rag::{Chunk, RagError, RetrievalIndex};

/// Embeds each chunk as a 3-d vector keyed on its first character.
fn letter_embedder(texts: &[&str]) -> embeddings::Result<Vec<Vec<f32>>> {
    Ok(texts
        .iter()
        .map(|t| match t.chars().next() {
            Some('A') => vec![0.0, 0.0, 0.0],
            Some('B') => vec![1.0, 0.0, 0.0],
            Some('C') => vec![10.0, 0.0, 0.0],
            _ => vec![0.0, 0.0, 0.0],
        })
        .collect())
}

fn letter_index() -> RetrievalIndex {
    RetrievalIndex::with_chunk_size(Arc::new(letter_embedder), 4).unwrap()
}

fn ordinals(chunks: &[Chunk]) -> Vec<usize> {
    chunks.iter().map(|c| c.ordinal).collect()
}

#[test]
fn test_nearest_chunks_ranked_by_distance() {
    let index = letter_index();
    index.build("AAAABBBBCCCC").unwrap();

    let results = index.search(&[0.0, 0.0, 0.0], 2).unwrap();
    assert_eq!(results, vec![Chunk::new("AAAA", 0), Chunk::new("BBBB", 1)]);
}

#[test]
fn test_empty_document_reports_no_content() {
    let index = letter_index();
    assert!(matches!(index.build(""), Err(RagError::NoContent)));
    assert!(index.search(&[1.0, 2.0, 3.0], 3).unwrap().is_empty());
}

#[test]
fn test_empty_document_clears_previous_content() {
    let index = letter_index();
    index.build("AAAABBBB").unwrap();
    assert!(index.is_ready());

    assert!(matches!(index.build(""), Err(RagError::NoContent)));
    assert!(!index.is_ready());
    assert!(index.search(&[0.0, 0.0, 0.0], 3).unwrap().is_empty());
}

#[test]
fn test_k_larger_than_index_returns_everything() {
    let index = letter_index();
    index.build("CCCCBBBBAAAA").unwrap();

    let results = index.search(&[0.0, 0.0, 0.0], 50).unwrap();
    assert_eq!(ordinals(&results), vec![2, 1, 0]);
}

#[test]
fn test_ties_go_to_lower_ordinal() {
    // Every chunk embeds to the same point
    let flat = |texts: &[&str]| -> embeddings::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 1.0]).collect())
    };
    let index = RetrievalIndex::with_chunk_size(Arc::new(flat), 2).unwrap();
    index.build("aabbccddee").unwrap();

    let results = index.search(&[0.0, 0.0], 3).unwrap();
    assert_eq!(ordinals(&results), vec![0, 1, 2]);

    // Equidistant on opposite sides of the query
    let mirrored = |texts: &[&str]| -> embeddings::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| if t.starts_with('x') { vec![1.0] } else { vec![-1.0] })
            .collect())
    };
    let index = RetrievalIndex::with_chunk_size(Arc::new(mirrored), 1).unwrap();
    index.build("xyxy").unwrap();
    let results = index.search(&[0.0], 4).unwrap();
    assert_eq!(ordinals(&results), vec![0, 1, 2, 3]);
}

#[test]
fn test_repeated_search_is_deterministic() {
    let index = letter_index();
    index.build("BBBBAAAACCCCAAAABBBB").unwrap();

    let first = index.search(&[0.5, 0.0, 0.0], 5).unwrap();
    for _ in 0..10 {
        assert_eq!(index.search(&[0.5, 0.0, 0.0], 5).unwrap(), first);
    }
    assert_eq!(ordinals(&first), vec![0, 1, 3, 4, 2]);
}

#[test]
fn test_failed_embedding_keeps_previous_index() {
    let fail = Arc::new(AtomicBool::new(false));
    let fail_flag = Arc::clone(&fail);
    let embedder = move |texts: &[&str]| -> embeddings::Result<Vec<Vec<f32>>> {
        if fail_flag.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Unavailable("model server down".to_string()));
        }
        letter_embedder(texts)
    };
    let index = RetrievalIndex::with_chunk_size(Arc::new(embedder), 4).unwrap();
    index.build("AAAABBBBCCCC").unwrap();
    let before = index.search(&[0.0, 0.0, 0.0], 3).unwrap();

    fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        index.build("CCCCCCCC"),
        Err(RagError::EmbeddingFailure(EmbeddingError::Unavailable(_)))
    ));

    assert_eq!(index.search(&[0.0, 0.0, 0.0], 3).unwrap(), before);
    assert_eq!(index.len(), 3);
}

#[test]
fn test_inconsistent_dimensions_keep_previous_index() {
    let index = letter_index();
    index.build("AAAABBBB").unwrap();
    let before = index.search(&[0.0, 0.0, 0.0], 2).unwrap();

    let ragged = |texts: &[&str]| -> embeddings::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| vec![0.0; 2 + i])
            .collect())
    };
    assert!(matches!(
        index.build_with("xxxxyyyy", &ragged),
        Err(RagError::DimensionMismatch { expected: 2, actual: 3 })
    ));

    assert_eq!(index.search(&[0.0, 0.0, 0.0], 2).unwrap(), before);
    assert_eq!(index.dimensions(), Some(3));
}

#[test]
fn test_non_finite_embedding_keeps_previous_index() {
    let index = letter_index();
    index.build("AAAABBBB").unwrap();
    let before = index.search_scored(&[0.0, 0.0, 0.0], 2).unwrap();

    let poisoned = |texts: &[&str]| -> embeddings::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| if t.starts_with('A') { vec![0.0] } else { vec![-f32::NAN] })
            .collect())
    };
    assert!(matches!(
        index.build_with("AAAABBBB", &poisoned),
        Err(RagError::EmbeddingFailure(EmbeddingError::Malformed(_)))
    ));

    assert_eq!(index.search_scored(&[0.0, 0.0, 0.0], 2).unwrap(), before);
    assert_eq!(index.dimensions(), Some(3));
}

#[test]
fn test_non_finite_query_rejected() {
    let index = letter_index();
    index.build("AAAABBBB").unwrap();
    assert!(matches!(
        index.search(&[f32::NAN, 0.0, 0.0], 1),
        Err(RagError::InvalidArgument(_))
    ));
    assert!(matches!(
        index.search(&[f32::NEG_INFINITY, 0.0, 0.0], 1),
        Err(RagError::InvalidArgument(_))
    ));
}

#[test]
fn test_wrong_vector_count_is_embedding_failure() {
    let index = letter_index();
    let short = |_: &[&str]| -> embeddings::Result<Vec<Vec<f32>>> { Ok(vec![vec![1.0]]) };
    assert!(matches!(
        index.build_with("AAAABBBB", &short),
        Err(RagError::EmbeddingFailure(EmbeddingError::Malformed(_)))
    ));
    assert!(!index.is_ready());
}

#[test]
fn test_rebuild_replaces_content() {
    let index = letter_index();
    index.build("AAAABBBBCCCC").unwrap();
    index.build("CCCC").unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(index.chunks(), vec![Chunk::new("CCCC", 0)]);
}

#[test]
fn test_search_text_uses_injected_embedder() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let embedder = move |texts: &[&str]| -> embeddings::Result<Vec<Vec<f32>>> {
        counter.fetch_add(1, Ordering::SeqCst);
        letter_embedder(texts)
    };
    let index = RetrievalIndex::with_chunk_size(Arc::new(embedder), 4).unwrap();

    assert!(index.search_text("Cash", 1).unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    index.build("AAAABBBBCCCC").unwrap();
    let results = index.search_text("Cash", 1).unwrap();
    assert_eq!(results, vec![Chunk::new("CCCC", 2)]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let context = index.retrieve_context("Budget", 2).unwrap();
    assert_eq!(context, "Chunk 2:\nBBBB\n\nChunk 1:\nAAAA");
}

#[test]
fn test_format_context_in_given_order() {
    let chunks = vec![Chunk::new("first part", 0), Chunk::new("second part", 1)];
    assert_eq!(
        RetrievalIndex::format_context(&chunks),
        "Chunk 1:\nfirst part\n\nChunk 2:\nsecond part"
    );
}

/// Embedder that blocks until released, to hold a build open.
struct GatedEmbedder {
    started: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Embedder for GatedEmbedder {
    fn embed(&self, texts: &[&str]) -> embeddings::Result<Vec<Vec<f32>>> {
        if let Some(started) = self.started.lock().unwrap().take() {
            started.send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
        Ok(texts.iter().map(|_| vec![5.0, 5.0, 5.0]).collect())
    }
}

#[test]
fn test_search_sees_old_snapshot_during_build() {
    let index = Arc::new(letter_index());
    index.build("AAAABBBBCCCC").unwrap();
    let before = index.search(&[0.0, 0.0, 0.0], 3).unwrap();

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gated = GatedEmbedder {
        started: Mutex::new(Some(started_tx)),
        release: Mutex::new(release_rx),
    };

    let builder = {
        let index = Arc::clone(&index);
        thread::spawn(move || index.build_with("ZZZZ", &gated))
    };

    started_rx.recv().unwrap();
    // Build is blocked inside the embedder
    assert_eq!(index.search(&[0.0, 0.0, 0.0], 3).unwrap(), before);

    release_tx.send(()).unwrap();
    builder.join().unwrap().unwrap();

    assert_eq!(
        index.search(&[0.0, 0.0, 0.0], 3).unwrap(),
        vec![Chunk::new("ZZZZ", 0)]
    );
}
