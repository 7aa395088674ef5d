pub mod no_nest;
pub mod plan;
pub mod policy;
pub mod target;

pub use no_nest::NoNestPlanner;
pub use plan::{Plan, PlanRecord};
pub use policy::ExclusionPolicy;
pub use target::Target;
