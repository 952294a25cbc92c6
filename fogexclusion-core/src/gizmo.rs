//! Editor visualization for exclusion volumes.
//!
//! Volumes are drawn as a translucent unit cube with an opaque wireframe, both
//! transformed by the volume's local-to-world matrix. The crate does no drawing
//! itself: it computes what to draw and hands it to a [`GizmoPainter`].

use crate::math::{Mat4, Vec3};
use crate::scene::{ExclusionScene, VolumeId};
use crate::volume::{ExclusionVolume, Rgba};

/// Fill alpha used for the selected volume.
pub const SELECTED_FILL_ALPHA: f32 = 0.6;

/// Everything needed to draw one volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoBox {
    pub volume: VolumeId,
    /// Maps the unit cube centered at the origin into world space.
    pub local_to_world: Mat4,
    pub fill_color: Rgba,
    pub wire_color: Rgba,
    pub selected: bool,
}

impl GizmoBox {
    pub fn new(id: VolumeId, volume: &ExclusionVolume, selected: bool) -> Self {
        let color = volume.gizmo_color;
        Self {
            volume: id,
            local_to_world: volume.local_to_world(),
            fill_color: if selected {
                color.with_alpha(SELECTED_FILL_ALPHA)
            } else {
                color
            },
            wire_color: color.with_alpha(1.0),
            selected,
        }
    }

    pub fn edges(&self) -> [[Vec3; 2]; 12] {
        wire_cube_edges(self.local_to_world)
    }
}

/// Host renderer hook for drawing volume gizmos.
pub trait GizmoPainter {
    /// Draws a filled unit cube transformed by `local_to_world`.
    fn draw_cube(&mut self, local_to_world: Mat4, color: Rgba);

    /// Draws the edges of a unit cube transformed by `local_to_world`.
    fn draw_wire_cube(&mut self, local_to_world: Mat4, color: Rgba) {
        for [start, end] in wire_cube_edges(local_to_world) {
            self.draw_line(start, end, color);
        }
    }

    fn draw_line(&mut self, start: Vec3, end: Vec3, color: Rgba);
}

/// Gizmos for every volume in `scene` that should be visible.
///
/// Volumes with `always_show_gizmo` are drawn unselected; the `selected` volume
/// is always drawn, highlighted. Returned in handle order, selected last.
pub fn collect_gizmos(scene: &ExclusionScene, selected: Option<VolumeId>) -> Vec<GizmoBox> {
    let mut gizmos: Vec<GizmoBox> = scene
        .ids()
        .into_iter()
        .filter_map(|id| scene.get(id).map(|volume| (id, volume)))
        .filter(|(id, volume)| volume.always_show_gizmo && Some(*id) != selected)
        .map(|(id, volume)| GizmoBox::new(id, volume, false))
        .collect();

    if let Some(id) = selected {
        if let Some(volume) = scene.get(id) {
            gizmos.push(GizmoBox::new(id, volume, true));
        }
    }

    gizmos
}

/// Draws all visible gizmos, fill first then wireframe.
pub fn draw_gizmos<P: GizmoPainter + ?Sized>(
    scene: &ExclusionScene,
    selected: Option<VolumeId>,
    painter: &mut P,
) {
    for gizmo in collect_gizmos(scene, selected) {
        painter.draw_cube(gizmo.local_to_world, gizmo.fill_color);
        painter.draw_wire_cube(gizmo.local_to_world, gizmo.wire_color);
    }
}

/// The 12 edges of the unit cube `[-0.5, 0.5]^3` mapped through `matrix`.
pub fn wire_cube_edges(matrix: Mat4) -> [[Vec3; 2]; 12] {
    let corner = |i: usize| {
        matrix.transform_point3(Vec3::new(
            if i & 1 == 0 { -0.5 } else { 0.5 },
            if i & 2 == 0 { -0.5 } else { 0.5 },
            if i & 4 == 0 { -0.5 } else { 0.5 },
        ))
    };

    // Corner pairs differing in exactly one bit.
    const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (2, 3),
        (4, 5),
        (6, 7),
        (0, 2),
        (1, 3),
        (4, 6),
        (5, 7),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];

    EDGES.map(|(a, b)| [corner(a), corner(b)])
}
