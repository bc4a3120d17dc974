pub mod activity;
pub mod voice;
