//! Haar cascade model: parsing and window evaluation.
//!
//! Reads the XML format written by OpenCV's `opencv_traincascade`
//! (`type_id="opencv-cascade-classifier"`) with `BOOST` stages and upright
//! `HAAR` features. Weak classifiers may be stumps or deeper trees.

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use roxmltree::{Document, Node};

use super::integral::IntegralImage;

/// A rectangle inside the detection window with its feature weight.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WeightedRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    weight: f32,
}

/// A Haar-like feature: a weighted sum of rectangle sums.
#[derive(Debug, Clone, PartialEq)]
struct HaarFeature {
    rects: Vec<WeightedRect>,
}

/// Internal node of a weak classifier tree.
///
/// Child indices greater than zero point to another node; zero or negative
/// values `-k` select leaf `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TreeNode {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct WeakTree {
    nodes: Vec<TreeNode>,
    leaves: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
struct Stage {
    threshold: f32,
    trees: Vec<WeakTree>,
}

/// Outcome of running the cascade on one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowResult {
    /// All stages passed.
    Accepted,
    /// Rejected by the first stage.
    RejectedFirstStage,
    /// Rejected by a later stage, or the window had too little contrast.
    Rejected,
}

/// Minimum standard deviation (in gray levels) of a window interior for the
/// cascade to be evaluated at all.
const MIN_WINDOW_STDDEV: f64 = 10.0;

/// A boosted Haar cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Cascade {
    width: u32,
    height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl Cascade {
    /// Loads a cascade from an XML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a supported
    /// cascade.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cascade file: {}", path.display()))?;
        Self::from_xml(&xml).with_context(|| format!("Invalid cascade file: {}", path.display()))
    }

    /// Parses a cascade from XML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed, uses an unsupported stage or
    /// feature type, or references features or leaves that do not exist.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml).context("Malformed cascade XML")?;
        let cascade = doc
            .descendants()
            .find(|n| n.has_tag_name("cascade"))
            .context("No <cascade> element (old-style haar cascades are not supported)")?;

        let stage_type = child_text(cascade, "stageType")?;
        ensure!(stage_type == "BOOST", "unsupported stage type '{stage_type}'");
        let feature_type = child_text(cascade, "featureType")?;
        ensure!(feature_type == "HAAR", "unsupported feature type '{feature_type}'");

        let width: u32 = parse_child(cascade, "width")?;
        let height: u32 = parse_child(cascade, "height")?;
        ensure!(width > 2 && height > 2, "window {width}x{height} is too small");

        let features = items(child(cascade, "features")?)
            .enumerate()
            .map(|(i, n)| parse_feature(n, width, height).with_context(|| format!("feature {i}")))
            .collect::<Result<Vec<_>>>()?;

        let stages = items(child(cascade, "stages")?)
            .enumerate()
            .map(|(i, n)| parse_stage(n, features.len()).with_context(|| format!("stage {i}")))
            .collect::<Result<Vec<_>>>()?;
        ensure!(!stages.is_empty(), "cascade has no stages");

        Ok(Self {
            width,
            height,
            stages,
            features,
        })
    }

    /// Detection window size `(width, height)` the cascade was trained on.
    #[must_use]
    pub const fn window_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of boosting stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs the cascade on the window whose top-left corner is `(x, y)`.
    ///
    /// The caller must keep the window inside the image.
    #[must_use]
    pub fn evaluate(&self, integral: &IntegralImage, x: u32, y: u32) -> WindowResult {
        // Variance normalization over the window interior, 1px border excluded.
        let (nx, ny, nw, nh) = (x + 1, y + 1, self.width - 2, self.height - 2);
        let area = f64::from(nw * nh);
        let sum = integral.sum(nx, ny, nw, nh);
        let sq_sum = integral.squared_sum(nx, ny, nw, nh);
        let nf = area.mul_add(sq_sum, -(sum * sum));
        if nf <= 0.0 {
            return WindowResult::Rejected;
        }
        let nf = nf.sqrt();
        // nf == area * stddev
        if nf <= MIN_WINDOW_STDDEV * area {
            return WindowResult::Rejected;
        }
        let inv_norm = 1.0 / nf;

        for (index, stage) in self.stages.iter().enumerate() {
            let score: f64 = stage
                .trees
                .iter()
                .map(|tree| f64::from(self.eval_tree(tree, integral, x, y, inv_norm)))
                .sum();
            if score < f64::from(stage.threshold) {
                return if index == 0 {
                    WindowResult::RejectedFirstStage
                } else {
                    WindowResult::Rejected
                };
            }
        }
        WindowResult::Accepted
    }

    fn eval_tree(
        &self,
        tree: &WeakTree,
        integral: &IntegralImage,
        x: u32,
        y: u32,
        inv_norm: f64,
    ) -> f32 {
        let mut idx: i32 = 0;
        loop {
            #[allow(clippy::cast_sign_loss)]
            let node = &tree.nodes[idx as usize];
            let value = self.eval_feature(node.feature, integral, x, y) * inv_norm;
            idx = if value < f64::from(node.threshold) {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                #[allow(clippy::cast_sign_loss)]
                return tree.leaves[(-idx) as usize];
            }
        }
    }

    fn eval_feature(&self, feature: usize, integral: &IntegralImage, x: u32, y: u32) -> f64 {
        self.features[feature]
            .rects
            .iter()
            .map(|r| f64::from(r.weight) * integral.sum(x + r.x, y + r.y, r.width, r.height))
            .sum()
    }
}

/// Iterates the `<_>` list items of an OpenCV storage sequence.
fn items<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.has_tag_name("_"))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .with_context(|| format!("missing <{name}>"))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    Ok(child(node, name)?.text().unwrap_or_default().trim())
}

fn parse_child<T>(node: Node<'_, '_>, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text = child_text(node, name)?;
    text.parse()
        .with_context(|| format!("<{name}> has invalid value '{text}'"))
}

/// Parses whitespace-separated numbers.
fn numbers(node: Node<'_, '_>) -> Result<Vec<f64>> {
    node.text()
        .unwrap_or_default()
        .split_whitespace()
        .map(|t| t.parse::<f64>().with_context(|| format!("invalid number '{t}'")))
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn parse_stage(node: Node<'_, '_>, feature_count: usize) -> Result<Stage> {
    let threshold = parse_child::<f64>(node, "stageThreshold")? as f32;

    let trees = items(child(node, "weakClassifiers")?)
        .map(|n| parse_tree(n, feature_count))
        .collect::<Result<Vec<_>>>()?;
    ensure!(!trees.is_empty(), "stage has no weak classifiers");

    Ok(Stage { threshold, trees })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_tree(node: Node<'_, '_>, feature_count: usize) -> Result<WeakTree> {
    let raw = numbers(child(node, "internalNodes")?)?;
    let leaves: Vec<f32> = numbers(child(node, "leafValues")?)?
        .into_iter()
        .map(|v| v as f32)
        .collect();

    ensure!(
        !raw.is_empty() && raw.len() % 4 == 0,
        "internalNodes must hold groups of 4 values (categorical features are not supported)"
    );

    let nodes: Vec<TreeNode> = raw
        .chunks_exact(4)
        .map(|c| TreeNode {
            left: c[0] as i32,
            right: c[1] as i32,
            feature: c[2] as usize,
            threshold: c[3] as f32,
        })
        .collect();

    ensure!(
        leaves.len() == nodes.len() + 1,
        "expected {} leaves, found {}",
        nodes.len() + 1,
        leaves.len()
    );

    let node_count = i32::try_from(nodes.len()).context("tree too large")?;
    let leaf_count = i32::try_from(leaves.len()).context("tree too large")?;
    for (i, n) in (0_i32..).zip(&nodes) {
        ensure!(n.feature < feature_count, "feature index {} out of range", n.feature);
        for c in [n.left, n.right] {
            ensure!(
                c < node_count && -c < leaf_count,
                "child index {c} out of range"
            );
            // Children must point forward or the walk may never terminate.
            ensure!(c <= 0 || c > i, "node {i} has backward child {c}");
        }
    }

    Ok(WeakTree { nodes, leaves })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_feature(node: Node<'_, '_>, width: u32, height: u32) -> Result<HaarFeature> {
    if let Some(tilted) = node.children().find(|n| n.has_tag_name("tilted")) {
        if tilted.text().unwrap_or_default().trim() != "0" {
            bail!("tilted features are not supported");
        }
    }

    let rects = items(child(node, "rects")?)
        .map(|r| {
            let v = numbers(r)?;
            ensure!(v.len() == 5, "rect must have 5 values, found {}", v.len());
            ensure!(
                v[..4].iter().all(|&c| c >= 0.0),
                "rect has negative coordinates"
            );
            let rect = WeightedRect {
                x: v[0] as u32,
                y: v[1] as u32,
                width: v[2] as u32,
                height: v[3] as u32,
                weight: v[4] as f32,
            };
            ensure!(
                rect.x + rect.width <= width && rect.y + rect.height <= height,
                "rect exceeds the {width}x{height} window"
            );
            Ok(rect)
        })
        .collect::<Result<Vec<_>>>()?;
    ensure!(!rects.is_empty(), "feature has no rectangles");

    Ok(HaarFeature { rects })
}
