// weaklabel: weakly-supervised document labeling from seed words
//
// This is the library root. Each module corresponds to a stage of a
// labeling run: load the corpus, score it with a backend, evaluate and log.

pub mod assign;
pub mod backend;
pub mod config;
pub mod data;
pub mod embedding;
pub mod eval;
pub mod hyper;
pub mod output;
pub mod pipeline;
pub mod text;
