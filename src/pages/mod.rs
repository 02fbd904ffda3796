pub mod explorer;
pub mod not_found;
mod sample_data;
