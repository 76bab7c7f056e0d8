pub mod agent;
pub mod input;
pub mod render;
pub mod roller;
pub mod tennis;

#[cfg(test)]
mod tests;

use avian3d::prelude::PhysicsPlugins;
use bevy::prelude::{Plugin, debug};

pub const FIXED_TIMESTEP_HZ: f64 = 50.0;

/// Physics for every arena.
pub struct SharedPlugin;
impl Plugin for SharedPlugin {
    fn build(&self, app: &mut bevy::prelude::App) {
        app.add_plugins(PhysicsPlugins::default());
        debug!("✅ Shared plugin initialized with physics");
    }
}
