use std::rc::Rc;

use crate::{
    color::ColorSpace,
    data_structures::{Matrix, Rectangle},
    error::PdfResult,
    function::TransferFunction,
    geometry::{Path, Point},
    resources::graphics_state_parameters::RenderingIntent,
    shading::{MeshTriangle, Shading, ShadingSubtype},
};

use super::canvas::{Canvas, GradientStop, Paint, Picture, PictureRecorder, Shader};

/// The number of stops sampled from a shading function when turning it
/// into a gradient shader
const GRADIENT_STOPS: usize = 32;

/// The grid resolution used to rasterize function-based shadings into
/// cells
const FUNCTION_GRID: usize = 16;

/// Prepare a shading for painting: either a paint whose shader carries the
/// gradient, or a picture of colored geometry for the mesh types.
///
/// `matrix` maps the shading's own coordinate space into device space (the
/// CTM, possibly composed with a pattern matrix); `bounds` is the device
/// area the shading has to cover
pub fn prepare_shading(
    shading: &Shading,
    matrix: Matrix,
    bounds: Rectangle,
    intent: RenderingIntent,
    transfer: &TransferFunction,
) -> PdfResult<PreparedShading> {
    let sampler = shading.color_space.sampler(intent, transfer);

    let sample_color = |components: &[f32]| -> [f32; 4] {
        sampler.sample(&shading.color_space.normalize(components))
    };

    // the shading's own bbox clips in its target space
    let clip = shading
        .bbox
        .map(|bbox| bbox.transform(matrix).intersection(bounds))
        .unwrap_or(bounds);

    match &shading.subtype {
        ShadingSubtype::Axial(axial) => {
            let stops = gradient_stops(|s| axial.sample(s).map(|c| sample_color(&c)))?;

            Ok(PreparedShading::Gradient {
                shader: Shader::LinearGradient {
                    start: matrix.apply(Point::new(axial.coords[0], axial.coords[1])),
                    end: matrix.apply(Point::new(axial.coords[2], axial.coords[3])),
                    stops,
                    extend: axial.extend,
                },
                clip,
            })
        }
        ShadingSubtype::Radial(radial) => {
            let stops = gradient_stops(|s| radial.sample(s).map(|c| sample_color(&c)))?;

            // radii scale by the matrix's average axis length
            let scale =
                (matrix.apply_vector(Point::new(1.0, 0.0)).euclidean_distance(Point::origin())
                    + matrix
                        .apply_vector(Point::new(0.0, 1.0))
                        .euclidean_distance(Point::origin()))
                    / 2.0;

            Ok(PreparedShading::Gradient {
                shader: Shader::RadialGradient {
                    start_center: matrix.apply(Point::new(radial.coords[0], radial.coords[1])),
                    start_radius: radial.coords[2] * scale,
                    end_center: matrix.apply(Point::new(radial.coords[3], radial.coords[4])),
                    end_radius: radial.coords[5] * scale,
                    stops,
                    extend: radial.extend,
                },
                clip,
            })
        }
        ShadingSubtype::FunctionBased(function_based) => {
            let mut recorder = PictureRecorder::new(clip);

            let [x_min, x_max, y_min, y_max] = function_based.domain;
            let full = function_based.matrix * matrix;

            let cell_w = (x_max - x_min) / FUNCTION_GRID as f32;
            let cell_h = (y_max - y_min) / FUNCTION_GRID as f32;

            for row in 0..FUNCTION_GRID {
                for col in 0..FUNCTION_GRID {
                    let x = x_min + col as f32 * cell_w;
                    let y = y_min + row as f32 * cell_h;

                    let components =
                        function_based.sample(x + cell_w / 2.0, y + cell_h / 2.0)?;
                    let color = sample_color(&components);

                    let mut cell = Path::from_rect(Rectangle::new(
                        x,
                        y,
                        x + cell_w,
                        y + cell_h,
                    ));
                    cell.apply_transform(full);

                    recorder.draw_path(&cell, &Paint::fill(color));
                }
            }

            Ok(PreparedShading::Picture {
                picture: Rc::new(recorder.finish()),
                clip,
            })
        }
        ShadingSubtype::Freeform(mesh) => {
            Ok(triangles_picture(&mesh.triangles()?, matrix, clip, &sample_color))
        }
        ShadingSubtype::Latticeform(mesh) => {
            Ok(triangles_picture(&mesh.triangles()?, matrix, clip, &sample_color))
        }
        ShadingSubtype::CoonsPatchMesh(mesh) | ShadingSubtype::TensorProductPatchMesh(mesh) => {
            Ok(triangles_picture(&mesh.triangles()?, matrix, clip, &sample_color))
        }
    }
}

#[derive(Debug)]
pub enum PreparedShading {
    Gradient { shader: Shader, clip: Rectangle },
    Picture { picture: Rc<Picture>, clip: Rectangle },
}

impl PreparedShading {
    /// Paint into the prepared clip area on the canvas
    pub fn paint(self, canvas: &mut dyn Canvas, base_paint: &Paint) {
        match self {
            PreparedShading::Gradient { shader, clip } => {
                let paint = Paint {
                    shader: Some(shader),
                    ..base_paint.clone()
                };

                canvas.draw_path(&Path::from_rect(clip), &paint);
            }
            PreparedShading::Picture { picture, clip } => {
                canvas.save();
                canvas.clip_rect(clip);
                canvas.draw_picture(picture, base_paint);
                canvas.restore();
            }
        }
    }

    /// The prepared shading as a paint shader, for shading patterns used
    /// as fill or stroke paint
    pub fn into_shader(self) -> Option<Shader> {
        match self {
            PreparedShading::Gradient { shader, .. } => Some(shader),
            PreparedShading::Picture { picture, clip } => Some(Shader::Tile {
                bbox: picture.cull_rect.merge(clip),
                x_step: clip.width().max(1.0),
                y_step: clip.height().max(1.0),
                matrix: Matrix::identity(),
                picture,
            }),
        }
    }
}

fn gradient_stops<F>(mut sample: F) -> PdfResult<Vec<GradientStop>>
where
    F: FnMut(f32) -> PdfResult<[f32; 4]>,
{
    (0..GRADIENT_STOPS)
        .map(|i| {
            let offset = i as f32 / (GRADIENT_STOPS - 1) as f32;

            Ok(GradientStop {
                offset,
                color: sample(offset)?,
            })
        })
        .collect()
}

/// Mesh triangles become flat-colored paths; the flat color is the mean of
/// the vertex colors. Backends with true Gouraud interpolation would take
/// the triangles directly
fn triangles_picture(
    triangles: &[MeshTriangle],
    matrix: Matrix,
    clip: Rectangle,
    sample_color: &dyn Fn(&[f32]) -> [f32; 4],
) -> PreparedShading {
    let mut recorder = PictureRecorder::new(clip);

    for triangle in triangles {
        let mut path = Path::new();
        path.move_to(matrix.apply(triangle.points[0]));
        path.line_to(matrix.apply(triangle.points[1]));
        path.line_to(matrix.apply(triangle.points[2]));
        path.close();

        let corner_colors = [
            sample_color(&triangle.colors[0]),
            sample_color(&triangle.colors[1]),
            sample_color(&triangle.colors[2]),
        ];

        let mut mean = [0.0f32; 4];
        for color in &corner_colors {
            for (acc, channel) in mean.iter_mut().zip(color.iter()) {
                *acc += channel / 3.0;
            }
        }

        recorder.draw_path(&path, &Paint::fill(mean));
    }

    PreparedShading::Picture {
        picture: Rc::new(recorder.finish()),
        clip,
    }
}

/// Bounds covered by an `sh` operator: the current clip in device space
pub fn shading_target_bounds(canvas: &dyn Canvas, ctm: Matrix) -> Rectangle {
    canvas.local_clip_bounds().transform(ctm)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::{Dictionary, Object}, resolve::NoResolve};
    use std::collections::HashMap;

    fn axial_shading() -> Shading {
        let dict = Dictionary::new(
            [
                ("ShadingType".to_owned(), Object::Integer(2)),
                (
                    "ColorSpace".to_owned(),
                    Object::Name(crate::objects::Name("DeviceRGB".to_owned())),
                ),
                (
                    "Coords".to_owned(),
                    Object::Array(
                        [0.0, 0.0, 100.0, 0.0]
                            .iter()
                            .map(|&v| Object::Real(v))
                            .collect(),
                    ),
                ),
                (
                    "Function".to_owned(),
                    Object::Dictionary(Dictionary::new(
                        [
                            ("FunctionType".to_owned(), Object::Integer(2)),
                            (
                                "Domain".to_owned(),
                                Object::Array(vec![Object::Real(0.0), Object::Real(1.0)]),
                            ),
                            (
                                "C0".to_owned(),
                                Object::Array(vec![
                                    Object::Real(1.0),
                                    Object::Real(0.0),
                                    Object::Real(0.0),
                                ]),
                            ),
                            (
                                "C1".to_owned(),
                                Object::Array(vec![
                                    Object::Real(0.0),
                                    Object::Real(0.0),
                                    Object::Real(1.0),
                                ]),
                            ),
                            ("N".to_owned(), Object::Real(1.0)),
                        ]
                        .into_iter()
                        .collect::<HashMap<_, _>>(),
                    )),
                ),
            ]
            .into_iter()
            .collect::<HashMap<_, _>>(),
        );

        Shading::from_obj(Object::Dictionary(dict), &mut NoResolve).unwrap()
    }

    #[test]
    fn axial_shading_becomes_linear_gradient() {
        let shading = axial_shading();

        let prepared = prepare_shading(
            &shading,
            Matrix::identity(),
            Rectangle::new(0.0, 0.0, 100.0, 100.0),
            RenderingIntent::RelativeColorimetric,
            &TransferFunction::Identity,
        )
        .unwrap();

        match prepared {
            PreparedShading::Gradient {
                shader: Shader::LinearGradient { start, end, stops, .. },
                ..
            } => {
                assert_eq!(start, Point::new(0.0, 0.0));
                assert_eq!(end, Point::new(100.0, 0.0));
                assert_eq!(stops.len(), GRADIENT_STOPS);
                // red at the start, blue at the end
                assert!(stops[0].color[0] > 0.99);
                assert!(stops.last().unwrap().color[2] > 0.99);
            }
            other => panic!("expected linear gradient, got {:?}", other),
        }
    }
}
