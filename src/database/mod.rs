pub mod features;
pub mod migrations;
pub mod schema;

pub use features::*;
pub use migrations::*;
pub use schema::*;
