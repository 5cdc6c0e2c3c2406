pub mod default;
pub mod restricted;
