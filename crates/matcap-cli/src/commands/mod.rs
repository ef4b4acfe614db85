pub mod bottlenecks;
pub mod compare;
pub mod reference;
pub mod solve;
pub mod util;
pub mod validate;
