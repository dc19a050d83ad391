pub mod controller;
pub mod playback;
pub mod playlist;
pub mod session;
