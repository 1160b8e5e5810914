//! Diagram export for external analysis and plotting.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use fortune_voronoi::{VertexKind, VoronoiDiagnostics, VoronoiOutput};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::util::Timed;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramExport {
    pub metadata: Metadata,
    pub sites: Vec<DVec2>,
    pub vertices: Vec<VertexExport>,
    pub cells: Vec<CellExport>,
    /// Each undirected edge once.
    pub segments: Vec<[DVec2; 2]>,
    pub diagnostics: DiagnosticsExport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub seed: Option<u64>,
    pub num_sites: usize,
    pub num_vertices: usize,
    pub num_edges: usize,
    pub bounds_min: DVec2,
    pub bounds_max: DVec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexExport {
    pub position: DVec2,
    /// "interior", "boundary" or "corner"
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sites: Option<[usize; 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellExport {
    pub site_index: usize,
    /// Vertex ids counter-clockwise.
    pub vertices: Vec<usize>,
    pub neighbors: Vec<usize>,
    pub area: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coincident_with: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsExport {
    pub stale_events: usize,
    pub degenerate_triples: usize,
    pub merged_sites: usize,
    pub insufficient_sites: bool,
    pub vertices_outside_bounds: usize,
    pub merged_vertices: usize,
    pub empty_cells: usize,
    #[serde(default)]
    pub clipped_edges: usize,
}

impl From<&VoronoiDiagnostics> for DiagnosticsExport {
    fn from(d: &VoronoiDiagnostics) -> Self {
        Self {
            stale_events: d.stale_events,
            degenerate_triples: d.degenerate_triples,
            merged_sites: d.merged_sites,
            insufficient_sites: d.insufficient_sites,
            vertices_outside_bounds: d.vertices_outside_bounds,
            merged_vertices: d.merged_vertices,
            empty_cells: d.empty_cells,
            clipped_edges: d.clipped_edges,
        }
    }
}

impl DiagramExport {
    pub fn from_output(output: &VoronoiOutput, seed: Option<u64>) -> Self {
        let diagram = &output.diagram;

        let vertices = diagram
            .vertices
            .iter()
            .map(|v| {
                let (kind, sites) = match v.kind {
                    VertexKind::Interior { sites } => ("interior", Some(sites)),
                    VertexKind::Boundary => ("boundary", None),
                    VertexKind::Corner => ("corner", None),
                };
                VertexExport {
                    position: v.position,
                    kind: kind.to_string(),
                    sites,
                }
            })
            .collect();

        let cells = diagram
            .iter_cells()
            .map(|cell| CellExport {
                site_index: cell.site_index(),
                vertices: cell.vertex_ids().collect(),
                neighbors: cell.neighbors().collect(),
                area: diagram.cell_area(cell.site_index()),
                coincident_with: cell.coincident_with(),
            })
            .collect();

        let segments: Vec<[DVec2; 2]> = diagram.segments().into_iter().map(|(a, b)| [a, b]).collect();

        Self {
            metadata: Metadata {
                seed,
                num_sites: diagram.num_cells(),
                num_vertices: diagram.num_vertices(),
                num_edges: segments.len(),
                bounds_min: diagram.bounds.min,
                bounds_max: diagram.bounds.max,
            },
            sites: diagram.sites.clone(),
            vertices,
            cells,
            segments,
            diagnostics: DiagnosticsExport::from(&output.diagnostics),
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}

/// Write a diagram as JSON, gzipped when the path ends in `.gz`.
pub fn export_diagram(output: &VoronoiOutput, seed: Option<u64>, path: &Path) -> io::Result<()> {
    let _t = Timed::info("Export");
    log::info!("Exporting to {}", path.display());

    let data = DiagramExport::from_output(output, seed);
    let file = File::create(path)?;

    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, &data)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &data)?;
        writer.flush()?;
    }
    Ok(())
}

/// Read back a file written by [`export_diagram`].
pub fn load_export(path: &Path) -> io::Result<DiagramExport> {
    let file = BufReader::new(File::open(path)?);
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortune_voronoi::compute;

    #[test]
    fn test_export_from_square() {
        let output = compute(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
        let data = DiagramExport::from_output(&output, Some(3));

        assert_eq!(data.metadata.num_sites, 4);
        assert_eq!(data.cells.len(), 4);
        assert_eq!(data.segments.len(), output.diagram.num_edges());
        let corners = data.vertices.iter().filter(|v| v.kind == "corner").count();
        assert_eq!(corners, 4);
        for cell in &data.cells {
            assert_eq!(cell.neighbors.len(), 2);
            assert!((cell.area - 2.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_vertex_sites_skipped_when_absent() {
        let output = compute(&[[0.0, 0.0], [4.0, 0.0]]).unwrap();
        let data = DiagramExport::from_output(&output, None);
        let json = serde_json::to_string(&data.vertices).unwrap();
        assert!(!json.contains("sites"));
        assert!(json.contains("\"boundary\""));
    }
}
