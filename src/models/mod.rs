pub mod booking;
pub mod match_event;
pub mod trip;
pub mod trip_request;
