//! Store engine: the per-store actor loop, admission and pending replay.

mod actor;
mod drain;

pub(crate) use actor::StoreActor;
