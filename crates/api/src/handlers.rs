pub mod availability;
pub mod bookings;
pub mod profiles;
pub mod slots;
