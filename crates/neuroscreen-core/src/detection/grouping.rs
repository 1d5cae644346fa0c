//! Clustering of raw detection windows.
//!
//! Follows OpenCV's `groupRectangles`: windows are partitioned into
//! equivalence classes of "similar" rectangles, each class is averaged, weak
//! classes are dropped and classes nested inside a stronger one are removed.

/// Integer rectangle used while grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Relative tolerance for two windows to count as the same detection.
pub const GROUP_EPS: f64 = 0.2;

fn similar(a: &Rect, b: &Rect, eps: f64) -> bool {
    let delta = eps * f64::from(a.width.min(b.width) + a.height.min(b.height)) * 0.5;
    let close = |p: i32, q: i32| f64::from((p - q).abs()) <= delta;
    close(a.x, b.x)
        && close(a.y, b.y)
        && close(a.x + a.width, b.x + b.width)
        && close(a.y + a.height, b.y + b.height)
}

/// Assigns a class label to each rectangle.
///
/// Labels are numbered in order of first appearance.
fn partition(rects: &[Rect], eps: f64) -> (Vec<usize>, usize) {
    let mut parent: Vec<usize> = (0..rects.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut class_of_root = vec![usize::MAX; rects.len()];
    let mut classes = 0;
    let labels = (0..rects.len())
        .map(|i| {
            let root = find(&mut parent, i);
            if class_of_root[root] == usize::MAX {
                class_of_root[root] = classes;
                classes += 1;
            }
            class_of_root[root]
        })
        .collect();
    (labels, classes)
}

#[allow(clippy::cast_possible_truncation)]
fn round_i32(v: f64) -> i32 {
    v.round() as i32
}

/// Groups raw detections.
///
/// With `min_neighbors == 0` the input is returned unchanged. Otherwise only
/// clusters with more than `min_neighbors` members survive.
#[must_use]
pub fn group_rectangles(rects: &[Rect], min_neighbors: u32, eps: f64) -> Vec<Rect> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let (labels, classes) = partition(rects, eps);

    let mut sums = vec![(0_i64, 0_i64, 0_i64, 0_i64); classes];
    let mut counts = vec![0_u32; classes];
    for (r, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s.0 += i64::from(r.x);
        s.1 += i64::from(r.y);
        s.2 += i64::from(r.width);
        s.3 += i64::from(r.height);
        counts[label] += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let averaged: Vec<Rect> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &n)| {
            let inv = 1.0 / f64::from(n);
            Rect::new(
                round_i32(s.0 as f64 * inv),
                round_i32(s.1 as f64 * inv),
                round_i32(s.2 as f64 * inv),
                round_i32(s.3 as f64 * inv),
            )
        })
        .collect();

    (0..classes)
        .filter(|&i| counts[i] > min_neighbors)
        .filter(|&i| {
            let (r1, n1) = (averaged[i], counts[i]);
            !(0..classes).any(|j| {
                let (r2, n2) = (averaged[j], counts[j]);
                if j == i || n2 <= min_neighbors {
                    return false;
                }
                let dx = round_i32(f64::from(r2.width) * eps);
                let dy = round_i32(f64::from(r2.height) * eps);
                r1.x >= r2.x - dx
                    && r1.y >= r2.y - dy
                    && r1.x + r1.width <= r2.x + r2.width + dx
                    && r1.y + r1.height <= r2.y + r2.height + dy
                    && (n2 > n1.max(3) || n1 < 3)
            })
        })
        .map(|i| averaged[i])
        .collect()
}
