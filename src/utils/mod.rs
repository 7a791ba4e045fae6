pub mod answers;
pub mod clock;
pub mod test_id;
