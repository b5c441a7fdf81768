use crate::vertex::Vertex;

/// Axis length used by the viewer unless configured otherwise.
pub const DEFAULT_AXES_SIZE: f32 = 5.;

/// Line list of the reference axes at the scene origin: X red, Y green,
/// Z blue, each `size` long.
pub fn axis_lines(size: f32) -> [Vertex; 6] {
    let line = |axis: usize| {
        let mut end = [0.; 3];
        end[axis] = size;
        let mut color = [0.; 3];
        color[axis] = 1.;
        [
            Vertex {
                position: [0.; 3],
                color,
            },
            Vertex {
                position: end,
                color,
            },
        ]
    };
    let [x, y, z] = [line(0), line(1), line(2)];
    [x[0], x[1], y[0], y[1], z[0], z[1]]
}
