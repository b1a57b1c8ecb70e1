pub mod normalize;
pub mod parser;
pub mod permutations;
pub mod split;
pub mod types;

pub use normalize::{is_valid_arbitrary_value, normalize, split_utility_modifier};
pub use parser::{expand_variant_group, parse_candidate};
pub use permutations::candidate_permutations;
pub use split::split_at_top_level;
pub use types::{is_arbitrary_value, ParsedCandidate, NOT_ON_DEMAND};
