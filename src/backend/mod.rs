// Scoring backends: trait-based abstraction for swappable strategies.
//
// ScoringBackend is the interface label assignment drives. TfidfBackend
// scores by term weights; Word2VecBackend by similarity of averaged word
// vectors.

pub mod tfidf;
pub mod traits;
pub mod word2vec;
