// Domain-layer modules and shared errors/models
pub mod features {
    pub use crate::features::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod prediction {
    pub use crate::prediction::*;
}

pub mod errors {
    pub use crate::errors::*;
}
