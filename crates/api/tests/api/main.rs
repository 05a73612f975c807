mod config_test;
mod expiry_test;
mod handlers;
mod test_utils;
