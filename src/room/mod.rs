pub mod api;
pub mod locks;
pub mod pins;
pub mod presence;
pub mod registry;
pub mod session;
