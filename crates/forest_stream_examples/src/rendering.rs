use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use forest_stream::prelude::*;
use glam::Vec2;
use image::{Rgb, RgbImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forest_stream=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Dot drawn for one placement; the radius is multiplied by the placement scale.
#[derive(Clone, Copy, Debug)]
pub struct MarkerStyle {
    pub color: [u8; 3],
    pub radius: f32,
}

/// Top-down view of a world-space rectangle.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub world_min: Vec2,
    pub world_max: Vec2,
    pub background: [u8; 3],
    /// Chunk edge length and line colour for the chunk grid overlay.
    pub chunk_grid: Option<(f32, [u8; 3])>,
    pub exclusion_zone: Option<(ExclusionZone, [u8; 3])>,
    pub camera: Option<Vec2>,
    styles: BTreeMap<(Tier, InstanceKind), MarkerStyle>,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32), world_min: Vec2, world_max: Vec2) -> Self {
        Self {
            image_size,
            world_min,
            world_max,
            background: [226, 232, 214],
            chunk_grid: None,
            exclusion_zone: None,
            camera: None,
            styles: BTreeMap::new(),
        }
    }

    /// Square view of `half_extent` world units around `center`.
    pub fn centered(image_size: (u32, u32), center: Vec2, half_extent: f32) -> Self {
        Self::new(
            image_size,
            center - Vec2::splat(half_extent),
            center + Vec2::splat(half_extent),
        )
    }

    pub fn with_background(mut self, color: [u8; 3]) -> Self {
        self.background = color;
        self
    }

    pub fn with_chunk_grid(mut self, chunk_size: f32, color: [u8; 3]) -> Self {
        self.chunk_grid = Some((chunk_size, color));
        self
    }

    pub fn with_exclusion_zone(mut self, zone: ExclusionZone, color: [u8; 3]) -> Self {
        self.exclusion_zone = Some((zone, color));
        self
    }

    pub fn with_camera(mut self, camera: Vec2) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn set_style(&mut self, tier: Tier, kind: InstanceKind, style: MarkerStyle) {
        self.styles.insert((tier, kind), style);
    }

    pub fn style(&self, tier: Tier, kind: InstanceKind) -> MarkerStyle {
        if let Some(style) = self.styles.get(&(tier, kind)) {
            return *style;
        }
        let fade = match tier {
            Tier::Near => 0,
            Tier::Mid => 50,
            _ => 95,
        };
        match kind {
            InstanceKind::Tree => MarkerStyle {
                color: [34 + fade, 110 + fade / 2, 48 + fade],
                radius: 0.3,
            },
            InstanceKind::Rock { variant } => {
                let shade = 100u8
                    .saturating_add((variant as u8).saturating_mul(25))
                    .saturating_add(fade / 2);
                MarkerStyle {
                    color: [shade, shade, shade.saturating_add(10)],
                    radius: 0.25,
                }
            }
        }
    }

    fn pixels_per_unit(&self) -> Vec2 {
        let extent = (self.world_max - self.world_min).max(Vec2::splat(f32::EPSILON));
        Vec2::new(
            self.image_size.0 as f32 / extent.x,
            self.image_size.1 as f32 / extent.y,
        )
    }

    fn to_pixel(&self, x: f32, z: f32) -> Vec2 {
        (Vec2::new(x, z) - self.world_min) * self.pixels_per_unit()
    }
}

/// Renderer sink that keeps the last upload of every buffer and can write it to a PNG.
#[derive(Default)]
pub struct PngSink {
    buffers: BTreeMap<(Tier, InstanceKind), Vec<Placement>>,
}

impl PngSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self) -> usize {
        self.buffers.values().map(Vec::len).sum()
    }

    pub fn render(&self, rc: &RenderConfig) -> RgbImage {
        let (w, h) = rc.image_size;
        let mut img = RgbImage::from_pixel(w, h, Rgb(rc.background));

        if let Some((zone, color)) = rc.exclusion_zone {
            let a = rc.to_pixel(zone.center_x - zone.width * 0.5, zone.center_z - zone.depth * 0.5);
            let b = rc.to_pixel(zone.center_x + zone.width * 0.5, zone.center_z + zone.depth * 0.5);
            fill_rect(&mut img, a, b, color);
        }

        if let Some((chunk_size, color)) = rc.chunk_grid {
            draw_grid(&mut img, rc, chunk_size, color);
        }

        // Far first so near instances end up on top.
        for ((tier, kind), placements) in self.buffers.iter().rev() {
            let style = rc.style(*tier, *kind);
            let ppu = rc.pixels_per_unit().x;
            for p in placements {
                let center = rc.to_pixel(p.position.x, p.position.z);
                let radius = (style.radius * p.scale * ppu).max(1.0);
                fill_circle(&mut img, center, radius, style.color);
            }
        }

        if let Some(camera) = rc.camera {
            let c = rc.to_pixel(camera.x, camera.y);
            fill_circle(&mut img, c, 5.0, [200, 30, 30]);
        }

        img
    }

    pub fn write_png(&self, rc: &RenderConfig, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.render(rc)
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {} ({} instances)", path.display(), self.instance_count());
        Ok(())
    }
}

impl RendererSink for PngSink {
    fn upload(&mut self, tier: Tier, kind: InstanceKind, placements: &[Placement]) {
        let buffer = self.buffers.entry((tier, kind)).or_default();
        buffer.clear();
        buffer.extend_from_slice(placements);
    }
}

fn fill_circle(img: &mut RgbImage, center: Vec2, radius: f32, color: [u8; 3]) {
    let (w, h) = img.dimensions();
    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(w);
    let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(h);
    let r2 = radius * radius;
    for y in y0..y1 {
        for x in x0..x1 {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
            if d.length_squared() <= r2 {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}

fn fill_rect(img: &mut RgbImage, a: Vec2, b: Vec2, color: [u8; 3]) {
    let (w, h) = img.dimensions();
    let min = a.min(b).max(Vec2::ZERO);
    let max = a.max(b);
    let x1 = (max.x.ceil().max(0.0) as u32).min(w);
    let y1 = (max.y.ceil().max(0.0) as u32).min(h);
    for y in (min.y as u32)..y1 {
        for x in (min.x as u32)..x1 {
            img.put_pixel(x, y, Rgb(color));
        }
    }
}

fn draw_grid(img: &mut RgbImage, rc: &RenderConfig, chunk_size: f32, color: [u8; 3]) {
    if chunk_size <= 0.0 {
        return;
    }
    let (w, h) = img.dimensions();
    let first = (rc.world_min / chunk_size).floor();
    let last = (rc.world_max / chunk_size).ceil();

    for i in (first.x as i32)..=(last.x as i32) {
        let px = rc.to_pixel(i as f32 * chunk_size, 0.0).x.round();
        if px >= 0.0 && (px as u32) < w {
            for y in 0..h {
                img.put_pixel(px as u32, y, Rgb(color));
            }
        }
    }
    for j in (first.y as i32)..=(last.y as i32) {
        let py = rc.to_pixel(0.0, j as f32 * chunk_size).y.round();
        if py >= 0.0 && (py as u32) < h {
            for x in 0..w {
                img.put_pixel(x, py as u32, Rgb(color));
            }
        }
    }
}
