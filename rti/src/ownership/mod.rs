mod manager;
mod table;

pub(crate) use manager::OwnershipManager;
