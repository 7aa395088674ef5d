pub mod parallelism;

pub use parallelism::{fold_recursive_self_parallelism, self_parallelism_of};
