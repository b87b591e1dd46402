//! Model evaluation and profile inspection.
//!
//! This crate provides:
//! - Evaluator: sampled RMSE of any `RatingPredictor` against the store
//! - ProfileInspector: a user's favourite movies and a cluster's "vibe"
//!
//! Every random draw takes the generator explicitly, so seeding the
//! generator makes a run reproducible.
//!
//! ## Example Usage
//! ```ignore
//! use evaluation::Evaluator;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let outcome = Evaluator::new().with_sample_size(50).evaluate(&model, &store, &mut rng)?;
//! println!("RMSE: {outcome}");
//! ```

pub mod rmse;
pub mod profile;

pub use rmse::{Evaluator, RmseOutcome};
pub use profile::{HistoryEntry, ProfileInspector, TagSummary};
