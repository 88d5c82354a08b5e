pub mod dirs;
pub mod fix;
pub mod metadata;
pub mod series;
pub mod verify;
