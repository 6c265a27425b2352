mod advance_queue;
mod time_manager;
mod time_status;

pub(crate) use advance_queue::AdvanceQueue;
pub(crate) use time_manager::TimeManager;
pub(crate) use time_status::{AdvanceMode, TimeStatus, TriState};
