use std::rc::Rc;

use crate::data::DataObject;
use crate::foundation::core::{Bounds, Rect, Rgb, Vec3, cross3, dot3, normalize3, sub3};
use crate::foundation::error::{VizError, VizResult};
use crate::render::cpu::raster::{self, ScreenTriangle};
use crate::render::resources::ResourceKey;
use crate::scene::camera::Camera;
use crate::scene::mapper::{MappedGeometry, Mapper};
use crate::scene::object::{SceneObject, SceneRef, downcast_scene};
use crate::scene::prop::{Actor2D, Prop};
use crate::scene::renderer::Renderer;
use crate::scene_graph::frame::{DrawStyle, FrameContext, PropState, RendererState};
use crate::scene_graph::view_node::{NodeCore, Operation, Traversal, ViewNodeImpl};

fn downcast_or_err<T: SceneObject>(
    obj: &SceneRef,
    role: &str,
) -> VizResult<Rc<T>> {
    downcast_scene::<T>(obj).ok_or_else(|| {
        VizError::validation(format!(
            "{} cannot be drawn as a {role} on the cpu backend",
            obj.class_name()
        ))
    })
}

/// Window root. The frame target is set up by the view before any pass runs.
#[derive(Debug, Default)]
pub struct WindowNode;

impl ViewNodeImpl for WindowNode {}

pub fn window_node(_: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(WindowNode))
}

/// Publishes the renderer's viewport and camera to its props and clears the background.
pub struct RendererNode {
    renderer: Rc<Renderer>,
}

pub fn renderer_node(obj: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(RendererNode {
        renderer: downcast_or_err::<Renderer>(obj, "renderer")?,
    }))
}

impl ViewNodeImpl for RendererNode {
    fn apply(
        &mut self,
        op: Operation,
        prepass: bool,
        _core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        if matches!(op, Operation::Build | Operation::Release) {
            return Ok(());
        }
        if !prepass {
            frame.renderer = None;
            return Ok(());
        }
        let viewport_px = frame.canvas.viewport_px(self.renderer.viewport());
        frame.renderer = Some(RendererState {
            renderer: Rc::clone(&self.renderer),
            viewport_px,
        });
        if op == Operation::Opaque {
            let bg = self.renderer.background().to_rgba8(1.0);
            if let Some(target) = frame.target_mut() {
                raster::clear_rect(target, viewport_px, bg);
            }
        }
        Ok(())
    }
}

/// Cameras are read through their renderer; the node only anchors them in the tree.
#[derive(Debug, Default)]
pub struct CameraNode;

impl ViewNodeImpl for CameraNode {}

pub fn camera_node(obj: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    downcast_or_err::<Camera>(obj, "camera")?;
    Ok(Box::new(CameraNode))
}

fn prop_of(core: &NodeCore) -> VizResult<&dyn Prop> {
    let obj = core.renderable();
    obj.as_prop().ok_or_else(|| {
        VizError::validation(format!("{} is not a prop", obj.class_name()))
    })
}

fn enter_prop(
    core: &NodeCore,
    op: Operation,
    style: DrawStyle,
    frame: &mut FrameContext<'_>,
) -> VizResult<()> {
    let prop = prop_of(core)?;
    let property = prop.property();
    let pick_id = if op == Operation::Pick && frame.pick.is_some() {
        frame.register_pick_object(core.renderable().object_id())
    } else {
        0
    };
    frame.prop = Some(PropState {
        prop: core.renderable().object_id(),
        color: property.color(),
        opacity: property.opacity(),
        style,
        pick_id,
    });
    Ok(())
}

/// Surface props: drawn in the opaque or translucent pass depending on their opacity.
#[derive(Debug, Default)]
pub struct SurfacePropNode;

pub fn surface_prop_node(obj: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    if obj.as_prop().is_none() {
        return Err(VizError::validation(format!(
            "{} is not a prop",
            obj.class_name()
        )));
    }
    Ok(Box::new(SurfacePropNode))
}

impl ViewNodeImpl for SurfacePropNode {
    fn traverse(
        &mut self,
        op: Operation,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<Traversal> {
        let prop = prop_of(core)?;
        let visible = prop.visibility();
        let take_part = match op {
            Operation::Build | Operation::Release => true,
            Operation::Query => {
                if visible {
                    if prop.is_opaque() {
                        frame.counts.opaque += 1;
                    } else {
                        frame.counts.translucent += 1;
                    }
                }
                false
            }
            Operation::Opaque => visible && prop.is_opaque(),
            Operation::Translucent => visible && !prop.is_opaque(),
            Operation::Pick => visible && prop.pickable(),
            Operation::Volume | Operation::Overlay => false,
        };
        Ok(if take_part {
            Traversal::Default
        } else {
            Traversal::Handled
        })
    }

    fn apply(
        &mut self,
        op: Operation,
        prepass: bool,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        if matches!(op, Operation::Build | Operation::Release) {
            return Ok(());
        }
        if prepass {
            enter_prop(core, op, DrawStyle::Surface, frame)
        } else {
            frame.prop = None;
            Ok(())
        }
    }
}

/// Volumes: a translucent box around the mapped geometry, in the volume pass.
#[derive(Debug, Default)]
pub struct VolumeNode;

pub fn volume_node(obj: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    if obj.as_prop().is_none() {
        return Err(VizError::validation(format!(
            "{} is not a prop",
            obj.class_name()
        )));
    }
    Ok(Box::new(VolumeNode))
}

impl ViewNodeImpl for VolumeNode {
    fn traverse(
        &mut self,
        op: Operation,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<Traversal> {
        let prop = prop_of(core)?;
        let visible = prop.visibility();
        let take_part = match op {
            Operation::Build | Operation::Release => true,
            Operation::Query => {
                if visible {
                    frame.counts.volumes += 1;
                }
                false
            }
            Operation::Volume => visible,
            Operation::Pick => visible && prop.pickable(),
            _ => false,
        };
        Ok(if take_part {
            Traversal::Default
        } else {
            Traversal::Handled
        })
    }

    fn apply(
        &mut self,
        op: Operation,
        prepass: bool,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        if matches!(op, Operation::Build | Operation::Release) {
            return Ok(());
        }
        if prepass {
            enter_prop(core, op, DrawStyle::Bounds, frame)
        } else {
            frame.prop = None;
            Ok(())
        }
    }
}

/// Screen-space rectangles in the overlay pass.
pub struct OverlayNode {
    actor: Rc<Actor2D>,
}

pub fn overlay_node(obj: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(OverlayNode {
        actor: downcast_or_err::<Actor2D>(obj, "2D actor")?,
    }))
}

impl ViewNodeImpl for OverlayNode {
    fn traverse(
        &mut self,
        op: Operation,
        _core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<Traversal> {
        let visible = self.actor.visibility();
        match op {
            Operation::Query if visible => frame.counts.overlays += 1,
            Operation::Overlay if visible => self.draw(frame)?,
            _ => {}
        }
        Ok(Traversal::Handled)
    }
}

impl OverlayNode {
    fn draw(&self, frame: &mut FrameContext<'_>) -> VizResult<()> {
        let Some(vp) = frame.renderer.as_ref().map(|r| r.viewport_px) else {
            return Ok(());
        };
        let r = self.actor.rect();
        // Normalized within the viewport, origin bottom-left.
        let px = Rect::new(
            vp.x0 + r.x0 * vp.width(),
            vp.y1 - r.y1 * vp.height(),
            vp.x0 + r.x1 * vp.width(),
            vp.y1 - r.y0 * vp.height(),
        );
        let property = self.actor.property();
        let rgba = property.color().to_rgba8(property.opacity());
        let mut scratch = frame.scratch()?;
        let drawn = match frame.target_mut() {
            Some(target) => raster::fill_rect(target, &mut scratch, px, rgba, vp),
            None => Err(VizError::resource("no frame target")),
        };
        frame.recycle(scratch);
        drawn?;
        frame.stats.draws += 1;
        Ok(())
    }
}

/// Draw-ready copy of a mapper's output, shared by every view node drawing that mapper.
#[derive(Debug)]
pub struct GeometryBuffer {
    pub triangles: Vec<[Vec3; 3]>,
    /// Per-triangle base color from mapped scalars.
    pub colors: Option<Vec<Rgb>>,
    pub bounds: Bounds,
}

impl GeometryBuffer {
    pub const SLOT: &'static str = "geometry";

    pub fn from_geometry(g: &MappedGeometry) -> VizResult<Self> {
        let n = g.positions.len();
        let mut triangles = Vec::with_capacity(g.triangles.len());
        for t in &g.triangles {
            if t.iter().any(|&i| i >= n) {
                return Err(VizError::resource(format!(
                    "triangle {t:?} indexes past {n} positions"
                )));
            }
            triangles.push([g.positions[t[0]], g.positions[t[1]], g.positions[t[2]]]);
        }
        let colors = match &g.colors {
            Some(c) if c.len() == n => Some(
                g.triangles
                    .iter()
                    .map(|t| {
                        let (a, b, cc) = (c[t[0]], c[t[1]], c[t[2]]);
                        Rgb::new(
                            (a.r + b.r + cc.r) / 3.0,
                            (a.g + b.g + cc.g) / 3.0,
                            (a.b + b.b + cc.b) / 3.0,
                        )
                    })
                    .collect(),
            ),
            Some(c) => {
                return Err(VizError::resource(format!(
                    "{} colors for {n} positions",
                    c.len()
                )));
            }
            None => None,
        };
        Ok(Self {
            triangles,
            colors,
            bounds: g.bounds(),
        })
    }

    pub fn byte_size(&self) -> usize {
        self.triangles.len() * std::mem::size_of::<[Vec3; 3]>()
            + self
                .colors
                .as_ref()
                .map_or(0, |c| c.len() * std::mem::size_of::<Rgb>())
    }
}

const BOX_FACES: [[usize; 4]; 6] = [
    [0, 1, 3, 2],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 2, 6, 4],
    [1, 3, 7, 5],
];

/// Draws whatever mapper output its prop asked for.
pub struct MapperNode {
    mapper: Rc<Mapper>,
    resource: Option<ResourceKey>,
}

pub fn mapper_node(obj: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(MapperNode {
        mapper: downcast_or_err::<Mapper>(obj, "mapper")?,
        resource: None,
    }))
}

impl MapperNode {
    /// The shared buffer for the mapper's current output, rebuilt only when the output changed.
    fn buffer(
        &mut self,
        core: &NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<Option<Rc<GeometryBuffer>>> {
        let Some((geometry, stamp)) = self.mapper.cached_geometry() else {
            return Ok(None);
        };
        let key = ResourceKey::new(self.mapper.object_id(), GeometryBuffer::SLOT);
        self.resource = Some(key);
        if frame.resources.hash(key) == Some(stamp.0) {
            frame.resources.register_user(key, core.id());
            return Ok(frame.resources.get::<GeometryBuffer>(key));
        }
        let buffer = Rc::new(GeometryBuffer::from_geometry(&geometry)?);
        let bytes = buffer.byte_size();
        frame
            .resources
            .set_resource_for_user(key, core.id(), Rc::clone(&buffer), stamp.0, bytes);
        tracing::debug!(mapper = %self.mapper.object_id(), bytes, "geometry buffer uploaded");
        Ok(Some(buffer))
    }

    fn draw(
        &mut self,
        op: Operation,
        core: &NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        let (Some(prop), Some(ren)) = (frame.prop, frame.renderer.clone()) else {
            return Ok(());
        };
        let Some(buffer) = self.buffer(core, frame)? else {
            return Ok(());
        };
        let camera = ren.renderer.camera();
        let mut tris = match prop.style {
            DrawStyle::Surface => surface_triangles(&buffer, &camera, &ren, &prop),
            DrawStyle::Bounds => bounds_triangles(buffer.bounds, &camera, &ren, &prop),
        };
        raster::sort_far_to_near(&mut tris);

        let mut scratch = frame.scratch()?;
        let drawn = if op == Operation::Pick {
            match frame.pick.as_mut() {
                Some(pick) => {
                    raster::stamp_ids(pick, &mut scratch, &tris, ren.viewport_px, prop.pick_id);
                    Ok(())
                }
                None => Ok(()),
            }
        } else {
            match frame.target_mut() {
                Some(target) => {
                    raster::fill_triangles(target, &mut scratch, &tris, ren.viewport_px)
                }
                None => Err(VizError::resource("no frame target")),
            }
        };
        frame.recycle(scratch);
        drawn?;
        frame.stats.draws += 1;
        frame.stats.triangles += tris.len() as u64;
        Ok(())
    }
}

impl ViewNodeImpl for MapperNode {
    fn apply(
        &mut self,
        op: Operation,
        prepass: bool,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        let draws = matches!(
            op,
            Operation::Opaque | Operation::Translucent | Operation::Volume | Operation::Pick
        );
        if !prepass || !draws {
            return Ok(());
        }
        match self.draw(op, core, frame) {
            Err(err) if !err.is_fatal() => {
                tracing::error!(mapper = %self.mapper.object_id(), op = op.name(), %err, "draw skipped");
                frame.stats.skipped_draws += 1;
                Ok(())
            }
            other => other,
        }
    }

    fn release(&mut self, core: &NodeCore, frame: &mut FrameContext<'_>) {
        if let Some(key) = self.resource.take() {
            frame.resources.unregister_user(key, core.id());
        }
    }
}

/// Flat shading: a little ambient plus how squarely the face meets the view direction.
fn shade(tri: &[Vec3; 3], dir: Vec3) -> f64 {
    let n = normalize3(cross3(sub3(tri[1], tri[0]), sub3(tri[2], tri[0])));
    n.map_or(0.3, |n| 0.3 + 0.7 * dot3(n, dir).abs())
}

fn project_triangle(
    tri: &[Vec3; 3],
    camera: &Camera,
    viewport: Rect,
    rgba: [u8; 4],
) -> ScreenTriangle {
    let [a, b, c] = [
        camera.project(tri[0], viewport),
        camera.project(tri[1], viewport),
        camera.project(tri[2], viewport),
    ];
    ScreenTriangle {
        points: [a.point, b.point, c.point],
        depth: (a.depth + b.depth + c.depth) / 3.0,
        rgba,
    }
}

fn surface_triangles(
    buffer: &GeometryBuffer,
    camera: &Camera,
    ren: &RendererState,
    prop: &PropState,
) -> Vec<ScreenTriangle> {
    let dir = camera.direction();
    buffer
        .triangles
        .iter()
        .enumerate()
        .map(|(i, tri)| {
            let base = buffer
                .colors
                .as_ref()
                .and_then(|c| c.get(i).copied())
                .unwrap_or(prop.color);
            let k = shade(tri, dir);
            let lit = Rgb::new(base.r * k, base.g * k, base.b * k);
            project_triangle(tri, camera, ren.viewport_px, lit.to_rgba8(prop.opacity))
        })
        .collect()
}

fn bounds_triangles(
    bounds: Bounds,
    camera: &Camera,
    ren: &RendererState,
    prop: &PropState,
) -> Vec<ScreenTriangle> {
    if !bounds.is_valid() {
        return Vec::new();
    }
    let c = bounds.corners();
    let rgba = prop.color.to_rgba8(prop.opacity);
    BOX_FACES
        .iter()
        .flat_map(|f| [[c[f[0]], c[f[1]], c[f[2]]], [c[f[0]], c[f[2]], c[f[3]]]])
        .map(|tri| project_triangle(&tri, camera, ren.viewport_px, rgba))
        .collect()
}
