mod availability_test;
mod bookings_test;
