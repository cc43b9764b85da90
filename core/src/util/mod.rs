mod split;

pub use split::{split, SplitError};
