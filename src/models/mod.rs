pub mod stage;
pub mod task;
pub mod customer;
pub mod order;
pub mod user;
pub mod dashboard;

pub use stage::*;
pub use task::*;
pub use customer::*;
pub use order::*;
pub use user::*;
pub use dashboard::*;
