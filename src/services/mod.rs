pub mod calendar;
pub mod catalog;
pub mod countdown;
pub mod metrics;
pub mod outfits;
pub mod photo_mirror;
pub mod photos;
pub mod rsvp;
pub mod storage;
pub mod theme;
