//! The pre-trained model and its on-disk artifact.

pub mod scorer {
    pub use crate::scorer::*;
}

pub mod artifact {
    pub use crate::artifact::*;
}
