pub mod id;
pub mod location;

pub use id::{EventId, GroupId, MemberId, VenueId};
pub use location::Location;
