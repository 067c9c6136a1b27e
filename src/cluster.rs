//! Groups components into frame candidates.

use std::collections::VecDeque;

use tracing::debug;

use crate::metrics::AlphaMetrics;
use crate::segmentation::Component;
use crate::sheet::Rect;

/// A frame candidate: a group of components and their joint bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCluster {
    pub bounds: Rect,
    /// Indices into the component list. Empty for clusters produced by the
    /// binary split fallback.
    pub members: Vec<usize>,
}

impl FrameCluster {
    /// Total component area in the cluster.
    pub fn area(&self, components: &[Component]) -> u64 {
        self.members.iter().map(|&i| components[i].area as u64).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterResult {
    pub clusters: Vec<FrameCluster>,
    /// Set when clustering collapsed and the clusters are split halves.
    pub fallback: bool,
}

impl ClusterResult {
    /// Number of clusters backed by real components.
    pub fn natural_count(&self) -> usize {
        if self.fallback {
            self.clusters.iter().filter(|c| !c.members.is_empty()).count()
        } else {
            self.clusters.len()
        }
    }
}

/// Density-based grouping over component centroids.
#[derive(Debug, Clone, Copy)]
pub struct ClusterFrameDetector {
    pub eps: f32,
    pub min_samples: usize,
}

impl ClusterFrameDetector {
    pub fn new(eps: f32, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    pub fn detect(&self, metrics: &AlphaMetrics, components: &[Component]) -> ClusterResult {
        let mut clusters = self.group(components);

        if clusters.len() <= 1
            && let Some(split) = metrics.find_best_binary_split()
        {
            debug!(
                natural = clusters.len(),
                axis = ?split.axis,
                index = split.index,
                depth = split.depth,
                "clustering collapsed, using binary split"
            );
            return ClusterResult {
                clusters: vec![
                    FrameCluster {
                        bounds: split.first,
                        members: Vec::new(),
                    },
                    FrameCluster {
                        bounds: split.second,
                        members: Vec::new(),
                    },
                ],
                fallback: true,
            };
        }

        clusters.sort_by_key(|c| (c.bounds.y, c.bounds.x));
        debug!(count = clusters.len(), "clustered components");
        ClusterResult {
            clusters,
            fallback: false,
        }
    }

    fn neighbours(&self, components: &[Component], i: usize) -> Vec<usize> {
        let eps2 = self.eps * self.eps;
        let (cx, cy) = components[i].centroid;
        components
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let dx = c.centroid.0 - cx;
                let dy = c.centroid.1 - cy;
                dx * dx + dy * dy <= eps2
            })
            .map(|(j, _)| j)
            .collect()
    }

    /// DBSCAN expansion; unabsorbed points stay as singleton clusters.
    fn group(&self, components: &[Component]) -> Vec<FrameCluster> {
        let mut visited = vec![false; components.len()];
        let mut clusters = Vec::new();

        for start in 0..components.len() {
            if visited[start] {
                continue;
            }
            let seeds = self.neighbours(components, start);
            if seeds.len() < self.min_samples {
                // A later core point may still absorb it.
                continue;
            }
            visited[start] = true;
            let mut members = vec![start];

            let mut frontier: VecDeque<usize> = seeds.into_iter().collect();
            while let Some(j) = frontier.pop_front() {
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                members.push(j);
                let reach = self.neighbours(components, j);
                if reach.len() >= self.min_samples {
                    frontier.extend(reach.into_iter().filter(|&k| !visited[k]));
                }
            }
            clusters.push(cluster_of(components, members));
        }

        for (i, seen) in visited.iter().enumerate() {
            if !seen {
                clusters.push(cluster_of(components, vec![i]));
            }
        }

        clusters
    }
}

fn cluster_of(components: &[Component], mut members: Vec<usize>) -> FrameCluster {
    members.sort_unstable();
    let bounds = members
        .iter()
        .fold(Rect::default(), |acc, &m| acc.union(&components[m].bounds));
    FrameCluster { bounds, members }
}
