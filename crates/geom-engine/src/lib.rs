pub mod mock_engine;
pub mod primitives;
pub mod traits;
pub mod truck_engine;
pub mod types;

pub use mock_engine::{BevelRecord, Fault, MockEngine};
pub use traits::*;
pub use truck_engine::TruckEngine;
pub use types::*;
