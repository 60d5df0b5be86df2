pub mod files;
pub mod health;
pub mod metrics;
pub mod photos;
pub mod rsvp;
pub mod site;
