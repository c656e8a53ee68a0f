pub mod daynight;
pub mod model;
pub mod selector;

pub use daynight::{Clock, FixedClock, SystemClock, is_night, is_night_at, local_solar_hour};
pub use model::{PropagationModel, SignalBreakdown};
pub use selector::BestMatch;
