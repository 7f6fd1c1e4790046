pub mod atlas;
pub mod microstates;
pub mod projection;
pub mod roster;
