// Word embeddings: the vector table, its cache format, and training.

pub mod train;
pub mod vectors;
