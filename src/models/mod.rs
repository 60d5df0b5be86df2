pub mod event;
pub mod group;
pub mod outfit;
pub mod photo;
pub mod rsvp;
pub mod theme;
