mod delivery;

pub use delivery::DeliveryWorker;
