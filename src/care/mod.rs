//! Care-period classification and per-pet completion status.
//!
//! Everything here is pure: given the same clock reading, timezone, pets and
//! activity snapshot it produces the same report, so clients can recompute it
//! locally and agree with the server.

mod banner;
mod labels;
mod period;
mod status;

pub use banner::{Banner, banner};
pub use labels::pets_label;
pub use period::{CarePeriod, CarePhase, Interval, local_day, parse_timezone};
pub use status::{CareReport, CareRequirements, PetStatus, assess, pet_statuses};
