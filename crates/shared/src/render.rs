use bevy::prelude::{
    Add, Assets, Color, Commands, Component, Cuboid, Entity, Mesh, Mesh3d, MeshMaterial3d, On,
    Query, ResMut, Sphere, StandardMaterial, Without, debug, default,
};

/// Shape and color to draw for an entity when a renderer is present. Headless apps ignore it.
#[derive(Component, Clone, Debug, PartialEq)]
pub enum VisualShape {
    Box { size: bevy::prelude::Vec3, color: Color },
    Ball { radius: f32, color: Color },
}

pub fn color_from_id(id: u64) -> Color {
    let hue = (id as f32 * 137.508) % 360.0;
    Color::hsl(hue, 0.8, 0.6)
}

pub fn add_shape_visuals(
    trigger: On<Add, VisualShape>,
    shapes: Query<&VisualShape, Without<Mesh3d>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut commands: Commands,
) {
    let entity: Entity = trigger.entity;
    let Ok(shape) = shapes.get(entity) else {
        debug!("Failed to get shape for visual addition.");
        return;
    };

    let (mesh, color) = match shape {
        VisualShape::Box { size, color } => {
            (meshes.add(Cuboid::new(size.x, size.y, size.z)), *color)
        }
        VisualShape::Ball { radius, color } => (meshes.add(Sphere::new(*radius)), *color),
    };

    commands.entity(entity).insert((
        Mesh3d(mesh),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: color,
            unlit: false,
            ..default()
        })),
    ));
}
