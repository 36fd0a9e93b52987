//! Embedding hook for the downstream retrieval application.

/// Placeholder for embedding generation. The retrieval application that
/// queries this store is built elsewhere; the loader only reserves the seam.
// TODO: call the retrieval service's embedding backend once it exists.
pub fn embedding_for(_text: &str) -> Vec<f32> {
  Vec::new()
}
