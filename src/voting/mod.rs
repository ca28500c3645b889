// Election lifecycle: phases, ballots, tally and the state machine

pub use ballot::*;
pub use clock::*;
pub use events::*;
pub use phase::*;
pub use state_machine::*;
pub use tally::*;

pub mod ballot;
pub mod clock;
pub mod events;
pub mod phase;
pub mod state_machine;
pub mod tally;
