pub mod bounds;
pub mod case;
pub mod error;
pub mod settings;
pub mod specs;
pub mod vector;

pub use bounds::*;
pub use case::*;
pub use error::*;
pub use settings::*;
pub use specs::*;
pub use vector::*;
