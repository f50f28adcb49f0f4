pub mod doctor;
pub mod export;
