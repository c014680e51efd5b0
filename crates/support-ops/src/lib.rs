pub mod bevel;
pub mod case_bounds;
pub mod features;
pub mod layout;
pub mod scope;
pub mod support;
pub mod types;

pub use bevel::{bevel_pad, bevel_support, select_pad_edges, select_support_edges, SupportEdgeRefs};
pub use case_bounds::{instrument_radii, recompute_case};
pub use features::{build_nut_washer, build_slot};
pub use layout::{flange_dim_z, FastenerSite, FlangeLayout, Placement};
pub use scope::{run_scoped, Scratch};
pub use support::{build_support, separate_parts};
pub use types::*;
