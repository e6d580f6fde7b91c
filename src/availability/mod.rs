pub mod resolver;
pub mod synthetic;

pub use resolver::AvailabilityResolver;
