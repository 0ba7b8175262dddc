pub mod game_scorer;

pub use game_scorer::{min_max_normalize, CompositeScore, GameScorer};
