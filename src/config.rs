//! Render settings, loadable from TOML.
//!
//! Every table and field is optional and falls back to its default:
//!
//! ```toml
//! [trace]
//! max_depth = 8
//!
//! [kdtree]
//! leaf_size = 2
//!
//! [camera]
//! fov = 60.0
//!
//! [output]
//! width = 320
//! height = 240
//! path = "out.png"
//! ```

use crate::{
    error::{RenderError, Result},
    geometry::EPS,
};
use glam::DVec3;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub trace: TraceConfig,
    pub kdtree: KdTreeConfig,
    pub camera: CameraConfig,
    pub output: OutputConfig,
}

impl RenderConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.output.width == 0 || config.output.height == 0 {
            return Err(RenderError::OutputSize {
                width: config.output.width,
                height: config.output.height,
            });
        }
        config.camera.validate()?;
        Ok(config)
    }
}

/// Parameters of the recursive integrator
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    /// Rays deeper than this return black
    pub max_depth: u32,
    /// Scale from the summed light power to the ambient color
    pub ambient_factor: f64,
    /// Weight of reflected light and of the ambient light reaching shadowed surfaces
    pub refl_decay: f64,
    /// Beer-Lambert absorption coefficient of air, per unit distance
    pub air_beer_density: f64,
    /// Applied to the whole color of surfaces that transmit a ray
    pub transm_blend_factor: f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            ambient_factor: 0.1,
            refl_decay: 0.3,
            air_beer_density: 0.01,
            transm_blend_factor: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KdTreeConfig {
    /// Nodes with at most this many primitives become leaves
    pub leaf_size: usize,
    pub max_depth: usize,
    /// Scenes with fewer bounded primitives are scanned linearly, 0 never builds a tree
    pub min_objects: usize,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            leaf_size: 4,
            max_depth: 24,
            min_objects: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub eye: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    /// Vertical field of view in degrees
    pub fov: f64,
}

impl CameraConfig {
    /// Rejects cameras that cannot span an image plane
    pub fn validate(&self) -> Result<()> {
        let view = self.eye - self.target;
        if !view.is_finite() || view.length() < EPS {
            return Err(RenderError::Camera("eye and target coincide"));
        }
        if self.up.cross(view.normalize()).length() < EPS {
            return Err(RenderError::Camera("up is zero or parallel to the view direction"));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(RenderError::Camera("fov must lie strictly between 0 and 180 degrees"));
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: DVec3::new(0.0, -9.0, 3.0),
            target: DVec3::new(0.0, 0.0, 1.0),
            up: DVec3::Z,
            fov: 45.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            path: PathBuf::from("output.png"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(RenderConfig::from_toml_str("").unwrap(), RenderConfig::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = RenderConfig::from_toml_str(
            r#"
            [trace]
            max_depth = 8

            [camera]
            eye = [1.0, 2.0, 3.0]

            [output]
            path = "frame.png"
            "#,
        )
        .unwrap();

        assert_eq!(config.trace.max_depth, 8);
        assert_eq!(config.trace.refl_decay, TraceConfig::default().refl_decay);
        assert_eq!(config.camera.eye, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.camera.up, DVec3::Z);
        assert_eq!(config.output.path, PathBuf::from("frame.png"));
        assert_eq!(config.kdtree, KdTreeConfig::default());
    }

    #[test]
    fn rejects_unknown_fields_and_empty_images() {
        assert!(matches!(
            RenderConfig::from_toml_str("[trace]\nmax_dpth = 3"),
            Err(RenderError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("[output]\nwidth = 0"),
            Err(RenderError::OutputSize { width: 0, .. })
        ));
    }

    #[test]
    fn rejects_degenerate_cameras() {
        for camera in [
            "[camera]\neye = [0.0, 0.0, 10.0]\ntarget = [0.0, 0.0, 10.0]",
            // Looking straight down with the default up
            "[camera]\neye = [0.0, 0.0, 10.0]\ntarget = [0.0, 0.0, 0.0]",
            "[camera]\nup = [0.0, 0.0, 0.0]",
            "[camera]\nfov = 0.0",
            "[camera]\nfov = 180.0",
        ] {
            assert!(
                matches!(RenderConfig::from_toml_str(camera), Err(RenderError::Camera(_))),
                "accepted {}",
                camera
            );
        }

        let down = RenderConfig::from_toml_str("[camera]\neye = [0.0, 0.0, 10.0]\ntarget = [0.0, 0.0, 0.0]\nup = [0.0, 1.0, 0.0]")
            .unwrap();
        let ray = crate::camera::Camera::from_config(&down.camera, 1.0).ray(0.5, 0.5);
        assert!(ray.is_unit());
        assert!((ray.dir + DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            RenderConfig::load("/nonexistent/render.toml"),
            Err(RenderError::Io { .. })
        ));
    }
}
