pub mod adam;
pub mod config;
pub mod dataset;
pub mod dense;
pub mod embeddings;
pub mod error;
pub mod loss;
pub mod lstm;
pub mod metrics;
pub mod model;
pub mod simple_rnn;
pub mod vectorizer;
pub mod vocab;

// Re-export key structs for easier access
pub use config::{CellKind, RnnConfig};
pub use dataset::{Dataset, Sample};
pub use dense::Dense;
pub use embeddings::Embeddings;
pub use error::{ModelError, Result};
pub use lstm::{Lstm, LstmStep};
pub use metrics::{EpochMetrics, TrainingHistory};
pub use model::{Layer, RecurrentLayer, SentimentRnn};
pub use simple_rnn::SimpleRnn;
pub use vectorizer::Vectorizer;
pub use vocab::Vocab;

// Constants
pub const PAD_ID: usize = 0;
pub const UNK_ID: usize = 1;
pub const VOCAB_SIZE: usize = 10_000;
pub const MAX_SEQ_LEN: usize = 500;
pub const EMBEDDING_DIM: usize = 32;
pub const HIDDEN_DIM: usize = 32;
pub const BATCH_SIZE: usize = 128;
